use crate::body::Body;
use crate::origin::delay::DelaySource;
use futures::future::BoxFuture;
use http::request::Parts;
use hyper::header::{HeaderValue, HOST, SERVER, SET_COOKIE};
use hyper::Response;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::sleep;

pub const SERVER_NAME: &str = "BadOrigin";

pub trait Handler: Send + Sync {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>>;
}

pub type BoxHandler = Box<dyn Handler>;

pub trait Middleware {
    fn wrap(self: Box<Self>, next: BoxHandler) -> BoxHandler;
}

// the first stage is the outermost one
pub fn build(stages: Vec<Box<dyn Middleware>>, terminal: BoxHandler) -> BoxHandler {
    stages
        .into_iter()
        .rev()
        .fold(terminal, |next, stage| stage.wrap(next))
}

pub struct Logging;

struct Logged {
    next: BoxHandler,
}

impl Middleware for Logging {
    fn wrap(self: Box<Self>, next: BoxHandler) -> BoxHandler {
        Box::new(Logged { next })
    }
}

impl Handler for Logged {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>> {
        Box::pin(async move {
            let start = Instant::now();
            let resp = self.next.call(req).await;
            let host = req
                .headers
                .get(HOST)
                .and_then(|h| h.to_str().ok())
                .or_else(|| req.uri.host())
                .unwrap_or_default();
            log::info!(
                "Returning {}{} took {}s ({})",
                host,
                req.uri.path(),
                start.elapsed().as_secs_f64(),
                resp.status()
            );
            resp
        })
    }
}

pub struct Chaos {
    delay: Arc<dyn DelaySource>,
}

impl Chaos {
    pub fn new(delay: Arc<dyn DelaySource>) -> Self {
        Self { delay }
    }
}

struct Delayed {
    delay: Arc<dyn DelaySource>,
    next: BoxHandler,
}

impl Middleware for Chaos {
    fn wrap(self: Box<Self>, next: BoxHandler) -> BoxHandler {
        Box::new(Delayed {
            delay: self.delay,
            next,
        })
    }
}

impl Handler for Delayed {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>> {
        Box::pin(async move {
            sleep(self.delay.sample()).await;
            self.next.call(req).await
        })
    }
}

pub struct Headers;

struct Stamped {
    next: BoxHandler,
}

impl Middleware for Headers {
    fn wrap(self: Box<Self>, next: BoxHandler) -> BoxHandler {
        Box::new(Stamped { next })
    }
}

impl Handler for Stamped {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>> {
        Box::pin(async move {
            let mut resp = self.next.call(req).await;
            resp.headers_mut()
                .insert(SERVER, HeaderValue::from_static(SERVER_NAME));
            resp
        })
    }
}

pub struct Cookies {
    cookies: Vec<HeaderValue>,
}

impl Cookies {
    pub fn new(cookies: Vec<HeaderValue>) -> Self {
        Self { cookies }
    }
}

struct Baked {
    cookies: Vec<HeaderValue>,
    next: BoxHandler,
}

impl Middleware for Cookies {
    fn wrap(self: Box<Self>, next: BoxHandler) -> BoxHandler {
        Box::new(Baked {
            cookies: self.cookies,
            next,
        })
    }
}

impl Handler for Baked {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>> {
        Box::pin(async move {
            let mut resp = self.next.call(req).await;
            for cookie in &self.cookies {
                resp.headers_mut().append(SET_COOKIE, cookie.clone());
            }
            resp
        })
    }
}
