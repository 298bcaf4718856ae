//! Client socket builder
//!
//! Connects to a server and wraps the connection in TLS, trusting the
//! certificates from a keystore. The client presents no certificate.
//!
//! ```no_run
//! use tls_keystore::client;
//! use tls_keystore::KeystoreSource;
//! use std::io::Write;
//!
//! let mut socket = client::connect(
//!     "localhost",
//!     8443,
//!     KeystoreSource::from_path("store.p12"),
//!     "changeit",
//! )
//! .unwrap();
//! socket.write_all(b"hello").unwrap();
//! ```

use crate::config::ClientOptions;
use crate::context;
use crate::error::{Error, Stage};
use crate::keystore::{Keystore, KeystoreSource};
use crate::material;
use crate::socket::TlsSocket;
use crate::Result;
use socket2::{Domain, Protocol, Socket, Type};
use std::fmt;
use std::io;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

/// Connection target: a name to resolve or a literal address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Host {
    Name(String),
    Addr(IpAddr),
}

impl Host {
    /// Resolve to a single address for `port`
    ///
    /// Names resolve to their first IPv4 address, or the first address of
    /// any family when there is none, matching the IPv4 wildcard a default
    /// server listens on.
    pub fn resolve(&self, port: u16) -> Result<SocketAddr> {
        match self {
            Host::Addr(ip) => Ok(SocketAddr::new(*ip, port)),
            Host::Name(name) => {
                if let Ok(ip) = name.parse::<IpAddr>() {
                    return Ok(SocketAddr::new(ip, port));
                }
                let addrs = (name.as_str(), port).to_socket_addrs().map_err(|source| {
                    Error::AddressResolution {
                        host: name.clone(),
                        source,
                    }
                })?;
                prefer_ipv4(addrs).ok_or_else(|| Error::NoAddress(name.clone()))
            }
        }
    }

    /// Name usable for SNI; literal addresses have none
    fn servername(&self) -> Option<&str> {
        match self {
            Host::Name(name) if name.parse::<IpAddr>().is_err() => Some(name.as_str()),
            _ => None,
        }
    }
}

fn prefer_ipv4(addrs: impl Iterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut first = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        first.get_or_insert(addr);
    }
    first
}

impl From<&str> for Host {
    fn from(s: &str) -> Self {
        Host::Name(s.to_string())
    }
}

impl From<String> for Host {
    fn from(s: String) -> Self {
        Host::Name(s)
    }
}

impl From<IpAddr> for Host {
    fn from(ip: IpAddr) -> Self {
        Host::Addr(ip)
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Host::Name(name) => f.write_str(name),
            Host::Addr(ip) => write!(f, "{}", ip),
        }
    }
}

/// Connect to `host:port` with the default options
pub fn connect(
    host: impl Into<Host>,
    port: u16,
    keystore: KeystoreSource<'_>,
    password: &str,
) -> Result<TlsSocket> {
    connect_with(host, port, keystore, password, &ClientOptions::default())
}

/// Connect to `host:port`, validating the server against `keystore`
///
/// Single attempt; the TCP connect is bounded by the configured timeout.
/// The returned socket is connected but has not completed the handshake.
pub fn connect_with(
    host: impl Into<Host>,
    port: u16,
    keystore: KeystoreSource<'_>,
    password: &str,
    opts: &ClientOptions,
) -> Result<TlsSocket> {
    let host = host.into();
    build(&host, port, keystore, password, opts).inspect_err(|e| {
        log::warn!(
            "client socket to {}:{} failed before {}: {}",
            host,
            port,
            e.stage(),
            e
        );
    })
}

fn build(
    host: &Host,
    port: u16,
    keystore: KeystoreSource<'_>,
    password: &str,
    opts: &ClientOptions,
) -> Result<TlsSocket> {
    let addr = host.resolve(port)?;
    log::debug!("{} resolved to {}", host, addr);

    let keystore = Keystore::load(keystore, password)?;
    log::debug!("{}: {:?}", Stage::KeystoreLoaded, keystore);

    let trust = material::extract_trust_manager(&keystore)?;
    log::debug!(
        "{}: {} trust anchor(s)",
        Stage::MaterialExtracted,
        trust.anchors().len()
    );

    let ctx = context::client_context(&trust, opts)?;
    log::debug!("{}", Stage::ContextBuilt);

    let tcp_stream = connect_timeout(addr, opts.connect_timeout)?;
    let servername = opts.servername.as_deref().or_else(|| host.servername());
    let socket = TlsSocket::client(&ctx, tcp_stream, servername, opts.verify_hostname)?;
    log::info!("{}: TLS client socket connected to {}", Stage::SocketReady, addr);

    Ok(socket)
}

fn connect_timeout(addr: SocketAddr, timeout: Duration) -> Result<std::net::TcpStream> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(|source| Error::Connect { addr, source })?;

    socket
        .connect_timeout(&addr.into(), timeout)
        .map_err(|source| match source.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                Error::ConnectTimeout { addr, timeout }
            }
            _ => Error::Connect { addr, source },
        })?;

    Ok(socket.into())
}
