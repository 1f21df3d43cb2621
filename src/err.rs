use std::fmt::{self, Debug, Display};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;

pub type Error = Box<dyn std::error::Error + Send + Sync + 'static>;

pub struct DisplayError(Error);

impl Debug for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl<T: Into<Error>> From<T> for DisplayError {
    fn from(display: T) -> Self {
        DisplayError(display.into())
    }
}

/// Conditions that take the whole pool down.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("content root {} is not usable: {source}", .path.display())]
    ContentRoot { path: PathBuf, source: io::Error },
    #[error("content root {} is not a directory", .path.display())]
    NotADirectory { path: PathBuf },
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, source: io::Error },
    #[error("listener on {addr} failed: {source}")]
    Listener { addr: SocketAddr, source: io::Error },
    #[error("listener task died: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub trait IoErrorExt {
    fn applies_to(&self) -> AppliesTo;
}

impl IoErrorExt for io::Error {
    fn applies_to(&self) -> AppliesTo {
        match self.kind() {
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset => AppliesTo::Connection,
            _ => AppliesTo::Listener,
        }
    }
}

pub enum AppliesTo {
    Connection,
    Listener,
}
