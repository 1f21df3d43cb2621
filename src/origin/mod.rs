//! A deliberately unreliable origin server: static files that never list
//! directories, synthetic redirects and errors built from the request path,
//! and random latency in front of every response.

pub mod chain;
pub mod delay;
mod files;
pub mod opt;
mod path;
mod routes;
mod synthetic;

use crate::err::LaunchError;
use crate::opt::ListenAddr;
use chain::{BoxHandler, Chaos, Cookies, Handler, Headers, Logging, Middleware};
use delay::{DelaySource, RandomDelay, DEFAULT_MAX_DELAY};
use files::StaticFiles;
use hyper::header::HeaderValue;
use routes::Router;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use synthetic::CodePolicy;
use tokio::net::TcpListener;
use tokio::task::JoinSet;

pub async fn main(options: opt::Options) -> Result<(), crate::err::Error> {
    let opt::Options {
        listen,
        root,
        mount,
        debug,
        max_delay_ms,
        strict_codes,
        cookies,
    } = options;

    let mut config = ServerConfig::new(listen, root, debug);
    config.mount = mount.unwrap_or_default();
    config.max_delay = Duration::from_millis(max_delay_ms);
    config.cookies = cookies;
    if strict_codes {
        config.codes = CodePolicy::Strict;
    }

    ServerPool::new(config).launch().await?;

    Ok(())
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub listen: Vec<ListenAddr>,
    pub content_root: PathBuf,
    /// Prefix under which static files are exposed, e.g. `/sites/`. Empty for `/`.
    pub mount: String,
    pub debug: bool,
    pub max_delay: Duration,
    pub codes: CodePolicy,
    pub cookies: Vec<HeaderValue>,
}

impl ServerConfig {
    pub fn new(listen: Vec<ListenAddr>, content_root: impl Into<PathBuf>, debug: bool) -> Self {
        Self {
            listen,
            content_root: content_root.into(),
            mount: String::new(),
            debug,
            max_delay: DEFAULT_MAX_DELAY,
            codes: CodePolicy::Lenient,
            cookies: Vec::new(),
        }
    }
}

pub struct ServerPool {
    config: ServerConfig,
    delay: Arc<dyn DelaySource>,
}

impl ServerPool {
    pub fn new(config: ServerConfig) -> Self {
        let delay = RandomDelay::new(config.max_delay);
        log::info!("Injecting up to {:?} of latency", delay.bound());
        Self::with_delay(config, Arc::new(delay))
    }

    pub fn with_delay(config: ServerConfig, delay: Arc<dyn DelaySource>) -> Self {
        Self { config, delay }
    }

    fn chain(&self) -> BoxHandler {
        let mut stages: Vec<Box<dyn Middleware>> = Vec::new();
        if self.config.debug {
            stages.push(Box::new(Logging));
        }
        stages.push(Box::new(Chaos::new(Arc::clone(&self.delay))));
        stages.push(Box::new(Headers));
        if !self.config.cookies.is_empty() {
            stages.push(Box::new(Cookies::new(self.config.cookies.clone())));
        }

        let files = StaticFiles::new(&self.config.content_root, self.config.mount.clone());
        chain::build(stages, Box::new(Router::new(files, self.config.codes)))
    }

    pub async fn bind(self) -> Result<BoundPool, LaunchError> {
        let root = &self.config.content_root;
        match tokio::fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(LaunchError::NotADirectory { path: root.clone() }),
            Err(source) => {
                return Err(LaunchError::ContentRoot {
                    path: root.clone(),
                    source,
                })
            }
        }

        let mut listeners = Vec::with_capacity(self.config.listen.len());
        for addr in &self.config.listen {
            log::info!("Binding to: {}", addr);
            let bound = async {
                let listener = TcpListener::bind(&addr[..]).await?;
                let local = listener.local_addr()?;
                Ok::<_, io::Error>((local, listener))
            };
            listeners.push(bound.await.map_err(|source| LaunchError::Bind {
                addr: addr.to_string(),
                source,
            })?);
        }

        Ok(BoundPool {
            handler: Arc::from(self.chain()),
            listeners,
        })
    }

    /// Binds and serves until a listener fails. In practice, runs forever.
    pub async fn launch(self) -> Result<(), LaunchError> {
        let pool = self.bind().await?;
        log::info!("Serving on: {:?}", pool.local_addrs());
        pool.run().await
    }
}

pub struct BoundPool {
    handler: Arc<dyn Handler>,
    listeners: Vec<(SocketAddr, TcpListener)>,
}

impl BoundPool {
    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.listeners.iter().map(|(addr, _)| *addr).collect()
    }

    pub async fn run(self) -> Result<(), LaunchError> {
        let mut tasks = JoinSet::new();
        for (addr, listener) in self.listeners {
            let handler = Arc::clone(&self.handler);
            tasks.spawn(async move { (addr, crate::http::serve(listener, handler).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            if let (addr, Err(source)) = joined? {
                return Err(LaunchError::Listener { addr, source });
            }
        }

        Ok(())
    }
}
