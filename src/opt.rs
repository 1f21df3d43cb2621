use clap::{ArgAction, Parser};
use std::fmt::{self, Display};
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::ops::Deref;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[clap(version, about)]
pub struct Options {
    /// Logging verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub origin: crate::origin::opt::Options,
}

/// A listen address as given on the command line, resolved up front.
#[derive(Clone, Debug)]
pub struct ListenAddr {
    arg: String,
    addrs: Vec<SocketAddr>,
}

impl Deref for ListenAddr {
    type Target = [SocketAddr];

    fn deref(&self) -> &Self::Target {
        &self.addrs
    }
}

impl Display for ListenAddr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.arg)
    }
}

impl FromStr for ListenAddr {
    type Err = io::Error;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        // `:8000` means every interface
        let addrs = match arg.strip_prefix(':') {
            Some(port) => ("0.0.0.0", port.parse::<u16>().map_err(invalid_port)?)
                .to_socket_addrs()?
                .collect::<Vec<_>>(),
            None => arg.to_socket_addrs()?.collect::<Vec<_>>(),
        };
        match addrs.len() {
            0 => Err(io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                "Resolved to zero addresses",
            )),
            _ => Ok(Self {
                arg: arg.to_string(),
                addrs,
            }),
        }
    }
}

fn invalid_port(e: std::num::ParseIntError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}
