use crate::opt::ListenAddr;
use clap::Args;
use hyper::header::HeaderValue;
use std::path::PathBuf;

/// Serve files, synthetic redirects and errors, all with random latency
#[derive(Args, Debug)]
#[group(skip)]
pub struct Options {
    #[arg(
        required = true,
        help = "Addresses to listen on (--help for more)",
        long_help = r"Addresses to listen on:
    - one listener is started per address, all serving the same content
    - a bare :port listens on all interfaces
Examples:
    - :8000 :8001 :8002
    - 127.0.0.1:3000
    - [::1]:8080"
    )]
    pub listen: Vec<ListenAddr>,

    /// Directory to serve static files from
    #[arg(short, long, default_value = ".")]
    pub root: PathBuf,

    #[arg(
        short,
        long,
        help = "Path prefix to serve static files under (--help for more)",
        long_help = r"Path prefix to serve static files under:
    - the prefix is stripped before looking up the file
    - requests outside the prefix get a 404
    - defaults to serving from /
Examples:
    - /sites/
    - /static"
    )]
    pub mount: Option<String>,

    /// Log every request with its total time, including the injected delay
    #[arg(short, long)]
    pub debug: bool,

    /// Upper bound (exclusive) of the random delay added to each response, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub max_delay_ms: u64,

    /// Answer unparseable status codes with 400 instead of falling back to 0
    #[arg(long)]
    pub strict_codes: bool,

    /// Add `Set-Cookie: NAME=VALUE` to every response (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE", value_parser = cookie)]
    pub cookies: Vec<HeaderValue>,
}

fn cookie(arg: &str) -> Result<HeaderValue, String> {
    match arg.split_once('=') {
        Some((name, _)) if !name.is_empty() => {
            HeaderValue::from_str(arg).map_err(|e| e.to_string())
        }
        _ => Err(format!("expected NAME=VALUE, got {:?}", arg)),
    }
}
