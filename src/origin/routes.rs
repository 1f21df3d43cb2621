use crate::body::Body;
use crate::origin::chain::Handler;
use crate::origin::files::StaticFiles;
use crate::origin::path::decode_segment;
use crate::origin::synthetic::{self, CodePolicy};
use futures::future::BoxFuture;
use http::request::Parts;
use hyper::Response;
use std::borrow::Cow;

#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    Redirect { code: Cow<'a, str>, location: Cow<'a, str> },
    NotFound,
    Error { code: Cow<'a, str>, message: Cow<'a, str> },
    Static,
    /// A synthetic route whose parameters don't decode.
    Undecodable,
}

fn two_params(rest: &str) -> Option<(&str, &str)> {
    let mut segments = rest.split('/');
    let first = segments.next().filter(|s| !s.is_empty())?;
    let second = segments.next().filter(|s| !s.is_empty())?;
    Some((first, second))
}

fn decode_both<'a>(
    (a, b): (&'a str, &'a str),
    make: impl FnOnce(Cow<'a, str>, Cow<'a, str>) -> Route<'a>,
) -> Route<'a> {
    match (decode_segment(a), decode_segment(b)) {
        (Some(a), Some(b)) => make(a, b),
        _ => Route::Undecodable,
    }
}

/// Routes are checked in declaration order; the first match serves the request.
fn route(path: &str) -> Route<'_> {
    if let Some(params) = path.strip_prefix("/redirect/").and_then(two_params) {
        return decode_both(params, |code, location| Route::Redirect { code, location });
    }
    if path.starts_with("/notfound") {
        return Route::NotFound;
    }
    if let Some(params) = path.strip_prefix("/error/").and_then(two_params) {
        return decode_both(params, |code, message| Route::Error { code, message });
    }
    Route::Static
}

pub struct Router {
    files: StaticFiles,
    codes: CodePolicy,
}

impl Router {
    pub fn new(files: StaticFiles, codes: CodePolicy) -> Self {
        Self { files, codes }
    }

    pub async fn respond_to_request(&self, req: &Parts) -> Response<Body> {
        match route(req.uri.path()) {
            Route::Redirect { code, location } => {
                log::debug!("{} {} -> [redirect {} to {}]", req.method, req.uri, code, location);
                synthetic::redirect(&req.method, &code, &location, self.codes)
            }
            Route::NotFound => {
                log::debug!("{} {} -> [not found]", req.method, req.uri);
                synthetic::not_found()
            }
            Route::Error { code, message } => {
                log::debug!("{} {} -> [error {}: {}]", req.method, req.uri, code, message);
                synthetic::error(&code, &message, self.codes)
            }
            Route::Undecodable => {
                log::debug!("{} {} -> [undecodable parameters]", req.method, req.uri);
                synthetic::not_found()
            }
            Route::Static => self.files.serve(req).await,
        }
    }
}

impl Handler for Router {
    fn call<'a>(&'a self, req: &'a Parts) -> BoxFuture<'a, Response<Body>> {
        Box::pin(self.respond_to_request(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::LOCATION;
    use hyper::{Method, Request, StatusCode};

    fn get(path: &str) -> Parts {
        Request::get(path).body(()).unwrap().into_parts().0
    }

    async fn text(resp: Response<Body>) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn router(root: &std::path::Path, codes: CodePolicy) -> Router {
        Router::new(StaticFiles::new(root, ""), codes)
    }

    #[test]
    fn route_table() {
        assert_eq!(
            route("/redirect/301/example.com"),
            Route::Redirect { code: "301".into(), location: "example.com".into() }
        );
        assert_eq!(
            route("/redirect/302/example.com/ignored/tail"),
            Route::Redirect { code: "302".into(), location: "example.com".into() }
        );
        assert_eq!(
            route("/redirect/302/example.com%3A8080"),
            Route::Redirect { code: "302".into(), location: "example.com:8080".into() }
        );
        assert_eq!(
            route("/error/500/it_broke"),
            Route::Error { code: "500".into(), message: "it_broke".into() }
        );
        assert_eq!(
            route("/error/500/it%20broke"),
            Route::Error { code: "500".into(), message: "it broke".into() }
        );
        assert_eq!(route("/notfound"), Route::NotFound);
        assert_eq!(route("/notfound/deeper/still"), Route::NotFound);
        assert_eq!(route("/notfound.html"), Route::NotFound);
        assert_eq!(route("/redirect/301"), Route::Static);
        assert_eq!(route("/redirect//example.com"), Route::Static);
        assert_eq!(route("/error/500/"), Route::Static);
        assert_eq!(route("/error/500/%ff"), Route::Undecodable);
        assert_eq!(route("/index.html"), Route::Static);
    }

    #[tokio::test]
    async fn redirect_route() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        for (code, location) in [(301, "example.com"), (302, "a.b.c:81"), (307, "localhost"), (200, "x")] {
            let resp = router
                .respond_to_request(&get(&format!("/redirect/{}/{}", code, location)))
                .await;
            assert_eq!(resp.status().as_u16(), code);
            assert_eq!(resp.headers()[LOCATION], format!("http://{}/", location).as_str());
        }
    }

    #[tokio::test]
    async fn error_route() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        for (code, message) in [(500, "it_broke"), (503, "_leading_and_trailing_"), (404, "plain")] {
            let resp = router
                .respond_to_request(&get(&format!("/error/{}/{}", code, message)))
                .await;
            assert_eq!(resp.status().as_u16(), code);
            assert_eq!(text(resp).await, message.replace('_', " "));
        }
    }

    #[tokio::test]
    async fn notfound_route_ignores_query_and_tail() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("notfound")).unwrap();
        std::fs::write(dir.path().join("notfound/index.html"), "shadowed").unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        for path in ["/notfound", "/notfound/", "/notfound/a/b", "/notfound?x=1"] {
            let resp = router.respond_to_request(&get(path)).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{}", path);
        }
    }

    #[tokio::test]
    async fn everything_else_is_static() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("sites/a")).unwrap();
        std::fs::write(dir.path().join("sites/a/index.html"), "hello").unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        let resp = router.respond_to_request(&get("/sites/a/")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(text(resp).await, "hello");
    }

    #[tokio::test]
    async fn malformed_code_lenient_falls_back_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        let resp = router.respond_to_request(&get("/error/abc/oops")).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(text(resp).await, "invalid status code 0");
    }

    #[tokio::test]
    async fn malformed_code_strict_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path(), CodePolicy::Strict);
        let resp = router.respond_to_request(&get("/error/abc/oops")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = router.respond_to_request(&get("/redirect/abc/example.com")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn repeated_requests_are_identical() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "same").unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        for path in ["/error/502/bad_gateway", "/redirect/302/example.com", "/f.txt", "/nope"] {
            let first = router.respond_to_request(&get(path)).await;
            let first = (first.status(), text(first).await);
            for _ in 0..5 {
                let again = router.respond_to_request(&get(path)).await;
                assert_eq!((again.status(), text(again).await), first, "{}", path);
            }
        }
    }

    #[tokio::test]
    async fn any_method_reaches_synthetic_routes() {
        let dir = tempfile::tempdir().unwrap();
        let router = router(dir.path(), CodePolicy::Lenient);
        let parts = Request::builder()
            .method(Method::DELETE)
            .uri("/error/409/conflict")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        assert_eq!(router.respond_to_request(&parts).await.status(), StatusCode::CONFLICT);
    }
}
