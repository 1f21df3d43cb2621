use crate::body::{self, Body};
use hyper::header::{HeaderValue, CONTENT_TYPE, LOCATION, X_CONTENT_TYPE_OPTIONS};
use hyper::{Method, Response, StatusCode};

#[allow(clippy::declare_interior_mutable_const)]
const TEXT_PLAIN: HeaderValue = HeaderValue::from_static("text/plain; charset=utf-8");
#[allow(clippy::declare_interior_mutable_const)]
const TEXT_HTML: HeaderValue = HeaderValue::from_static("text/html; charset=utf-8");

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CodePolicy {
    // anything that isn't a number becomes 0, which no response can carry
    #[default]
    Lenient,
    Strict,
}

#[derive(Debug, PartialEq, Eq)]
enum Rejection {
    Invalid(String),
    BadRequest(String),
}

impl CodePolicy {
    fn status(self, raw: &str, redirect: bool) -> Result<StatusCode, Rejection> {
        let code = match (raw.parse::<u16>(), self) {
            (Ok(code), _) => code,
            (Err(_), CodePolicy::Lenient) => 0,
            (Err(_), CodePolicy::Strict) => {
                let msg = format!("status code {:?} is not a number", raw);
                return Err(Rejection::BadRequest(msg));
            }
        };
        let status = match StatusCode::from_u16(code) {
            Ok(s) if !s.is_informational() => s,
            _ => return Err(self.reject(format!("invalid status code {}", code))),
        };
        if redirect && self == CodePolicy::Strict && !status.is_redirection() {
            return Err(Rejection::BadRequest(format!("{} is not a redirect status", code)));
        }
        Ok(status)
    }

    fn reject(self, msg: String) -> Rejection {
        match self {
            CodePolicy::Lenient => Rejection::Invalid(msg),
            CodePolicy::Strict => Rejection::BadRequest(msg),
        }
    }
}

fn rejected(rejection: Rejection) -> Response<Body> {
    match rejection {
        Rejection::Invalid(msg) => plain_text(StatusCode::INTERNAL_SERVER_ERROR, msg),
        Rejection::BadRequest(msg) => plain_text(StatusCode::BAD_REQUEST, msg),
    }
}

pub fn plain_text(status: StatusCode, text: impl Into<String>) -> Response<Body> {
    let mut resp = Response::new(body::full(text.into()));
    *resp.status_mut() = status;
    resp.headers_mut().insert(CONTENT_TYPE, TEXT_PLAIN);
    resp.headers_mut()
        .insert(X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    resp
}

pub fn not_found() -> Response<Body> {
    plain_text(StatusCode::NOT_FOUND, "404 page not found")
}

pub fn internal_error() -> Response<Body> {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, "500 internal server error")
}

pub fn redirect(
    method: &Method,
    code: &str,
    location: &str,
    policy: CodePolicy,
) -> Response<Body> {
    let status = match policy.status(code, true) {
        Ok(s) => s,
        Err(e) => {
            log::debug!("redirect {}/{} -> [rejected] {:?}", code, location, e);
            return rejected(e);
        }
    };
    let target = format!("http://{}/", location);
    let Ok(target_header) = HeaderValue::from_str(&target) else {
        log::debug!("redirect {}/{} -> [unencodable location]", code, location);
        return rejected(policy.reject(format!("invalid location {:?}", location)));
    };

    let mut resp = if *method == Method::GET || *method == Method::HEAD {
        let reason = status.canonical_reason().unwrap_or("Redirect");
        let link = format!("<a href=\"{}\">{}</a>.\n", html_escape(&target), reason);
        let mut resp = Response::new(body::full(link));
        resp.headers_mut().insert(CONTENT_TYPE, TEXT_HTML);
        resp
    } else {
        Response::new(body::empty())
    };
    *resp.status_mut() = status;
    resp.headers_mut().insert(LOCATION, target_header);
    resp
}

fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

pub fn error(code: &str, message: &str, policy: CodePolicy) -> Response<Body> {
    let status = match policy.status(code, false) {
        Ok(s) => s,
        Err(e) => {
            log::debug!("error {}/{} -> [rejected] {:?}", code, message, e);
            return rejected(e);
        }
    };
    plain_text(status, message.replace('_', " "))
}
