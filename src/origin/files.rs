use crate::body::{self, Body};
use crate::origin::path::{resolve, strip_mount};
use crate::origin::synthetic;
use headers::{
    AcceptRanges, ContentLength, ContentRange, ContentType, HeaderMapExt, IfModifiedSince,
    LastModified,
};
use http::request::Parts;
use hyper::header::{HeaderValue, ALLOW, RANGE};
use hyper::{Method, Response, StatusCode};
use std::io::{self, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

const INDEX: &str = "index.html";

// a directory is only reachable through its index.html, never listed
pub struct StaticFiles {
    root: PathBuf,
    mount: String,
}

enum Lookup {
    Found { path: PathBuf, file: File, meta: std::fs::Metadata },
    NotFound,
    Failed(io::Error),
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>, mount: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            mount: mount.into(),
        }
    }

    pub async fn serve(&self, req: &Parts) -> Response<Body> {
        if req.method != Method::GET && req.method != Method::HEAD {
            log::debug!("{} {} -> [method not allowed]", req.method, req.uri);
            let mut resp =
                synthetic::plain_text(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed");
            resp.headers_mut()
                .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
            return resp;
        }

        let Some(path) =
            strip_mount(&self.mount, req.uri.path()).and_then(|p| resolve(&self.root, p))
        else {
            log::debug!("{} {} -> [outside mount]", req.method, req.uri);
            return synthetic::not_found();
        };

        match open(path).await {
            Lookup::Found { path, file, meta } => {
                log::debug!("{} {} -> {}", req.method, req.uri, path.display());
                match respond_with_file(req, &path, file, &meta).await {
                    Ok(resp) => resp,
                    Err(e) => {
                        log::warn!(
                            "{} {} -> [read error] {} : {}",
                            req.method,
                            req.uri,
                            path.display(),
                            e
                        );
                        synthetic::internal_error()
                    }
                }
            }
            Lookup::NotFound => {
                log::debug!("{} {} -> [not found]", req.method, req.uri);
                synthetic::not_found()
            }
            Lookup::Failed(e) => {
                log::warn!("{} {} -> [file error] {}", req.method, req.uri, e);
                synthetic::internal_error()
            }
        }
    }
}

fn classify(e: io::Error) -> Lookup {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory => Lookup::NotFound,
        _ => Lookup::Failed(e),
    }
}

async fn open_regular(path: PathBuf) -> Lookup {
    let file = match File::open(&path).await {
        Ok(f) => f,
        Err(e) => return classify(e),
    };
    match file.metadata().await {
        Ok(meta) if meta.is_file() => Lookup::Found { path, file, meta },
        Ok(_) => Lookup::NotFound,
        Err(e) => classify(e),
    }
}

async fn open(path: PathBuf) -> Lookup {
    let meta = match fs::metadata(&path).await {
        Ok(m) => m,
        Err(e) => return classify(e),
    };
    if meta.is_dir() {
        open_regular(path.join(INDEX)).await
    } else {
        open_regular(path).await
    }
}

async fn respond_with_file(
    req: &Parts,
    path: &Path,
    mut file: File,
    meta: &std::fs::Metadata,
) -> Result<Response<Body>, io::Error> {
    let len = meta.len();
    let modified = meta.modified().ok();

    let since = req.headers.typed_get::<IfModifiedSince>();
    if let (Some(since), Some(modified)) = (since, modified) {
        if !since.is_modified(modified) {
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::NOT_MODIFIED;
            resp.headers_mut().typed_insert(LastModified::from(modified));
            return Ok(resp);
        }
    }

    let (status, start, end) = match req.headers.get(RANGE).map(|h| byte_range(h, len)) {
        Some(ByteRange::Partial(start, end)) => (StatusCode::PARTIAL_CONTENT, start, end),
        Some(ByteRange::Unsatisfiable) => {
            let mut resp = Response::new(body::empty());
            *resp.status_mut() = StatusCode::RANGE_NOT_SATISFIABLE;
            resp.headers_mut()
                .typed_insert(ContentRange::unsatisfied_bytes(len));
            return Ok(resp);
        }
        Some(ByteRange::Ignored) | None => (StatusCode::OK, 0, len),
    };

    let body = if req.method == Method::HEAD {
        body::empty()
    } else {
        if start > 0 {
            file.seek(SeekFrom::Start(start)).await?;
        }
        body::from_reader(file.take(end - start))
    };

    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    let headers = resp.headers_mut();
    headers.typed_insert(ContentType::from(
        mime_guess::from_path(path).first_or_octet_stream(),
    ));
    headers.typed_insert(ContentLength(end - start));
    headers.typed_insert(AcceptRanges::bytes());
    if let Some(modified) = modified {
        headers.typed_insert(LastModified::from(modified));
    }
    if status == StatusCode::PARTIAL_CONTENT {
        if let Ok(content_range) = ContentRange::bytes(start..end, len) {
            headers.typed_insert(content_range);
        }
    }
    Ok(resp)
}

#[derive(Debug, PartialEq, Eq)]
enum ByteRange {
    // start..end, end exclusive
    Partial(u64, u64),
    Unsatisfiable,
    // malformed, or more than one range: serve the whole file
    Ignored,
}

fn byte_range(header: &HeaderValue, len: u64) -> ByteRange {
    let Some(specs) = header.to_str().ok().and_then(|h| h.strip_prefix("bytes=")) else {
        return ByteRange::Ignored;
    };
    let mut specs = specs.split(',').map(str::trim).filter(|s| !s.is_empty());
    let (Some(spec), None) = (specs.next(), specs.next()) else {
        return ByteRange::Ignored;
    };
    let Some((first, last)) = spec.split_once('-') else {
        return ByteRange::Ignored;
    };
    let parse = |s: &str| s.trim().parse::<u64>().ok();
    match (first.trim(), last.trim()) {
        ("", "") => ByteRange::Ignored,
        // suffix: the last n bytes, or the whole file if it is shorter
        ("", suffix) => match parse(suffix) {
            Some(0) => ByteRange::Unsatisfiable,
            Some(_) if len == 0 => ByteRange::Unsatisfiable,
            Some(n) => ByteRange::Partial(len.saturating_sub(n), len),
            None => ByteRange::Ignored,
        },
        (first, "") => match parse(first) {
            Some(start) if start < len => ByteRange::Partial(start, len),
            Some(_) => ByteRange::Unsatisfiable,
            None => ByteRange::Ignored,
        },
        (first, last) => match (parse(first), parse(last)) {
            (Some(start), Some(last)) if start <= last => {
                if start < len {
                    ByteRange::Partial(start, last.saturating_add(1).min(len))
                } else {
                    ByteRange::Unsatisfiable
                }
            }
            _ => ByteRange::Ignored,
        },
    }
}
