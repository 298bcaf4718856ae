//! Server socket builder
//!
//! Binds a listening socket whose connections present the keystore's
//! private key entry. The same keystore supplies the trust material used
//! when client certificates are requested.
//!
//! ```no_run
//! use tls_keystore::server;
//! use tls_keystore::KeystoreSource;
//! use std::io::Read;
//!
//! let listener = server::bind(8443, KeystoreSource::from_path("store.p12"), "changeit").unwrap();
//! let (mut socket, _peer) = listener.accept().unwrap();
//! let mut buf = [0u8; 5];
//! socket.read_exact(&mut buf).unwrap();
//! ```

use crate::cert::CertInfo;
use crate::config::ServerOptions;
use crate::context;
use crate::error::{Error, Stage};
use crate::keystore::{Keystore, KeystoreSource};
use crate::material;
use crate::socket::TlsSocket;
use crate::Result;
use openssl::ssl::SslContext;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{SocketAddr, TcpListener};

/// A bound, listening socket that hands out server-side [`TlsSocket`]s
#[derive(Debug)]
pub struct TlsListener {
    listener: TcpListener,
    ctx: SslContext,
}

impl TlsListener {
    /// Accept one connection
    ///
    /// The handshake runs on first I/O or [`TlsSocket::handshake`].
    pub fn accept(&self) -> Result<(TlsSocket, SocketAddr)> {
        let (tcp_stream, peer) = self.listener.accept().map_err(Error::Accept)?;
        log::debug!("accepted connection from {}", peer);
        let socket = TlsSocket::server(&self.ctx, tcp_stream)?;
        Ok((socket, peer))
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Listen on `port` on all IPv4 interfaces with the default options
pub fn bind(port: u16, keystore: KeystoreSource<'_>, password: &str) -> Result<TlsListener> {
    bind_with(port, keystore, password, &ServerOptions::default())
}

/// Listen on `port`, presenting the keystore's certificate
///
/// `password` unlocks both the keystore and its private key.
pub fn bind_with(
    port: u16,
    keystore: KeystoreSource<'_>,
    password: &str,
    opts: &ServerOptions,
) -> Result<TlsListener> {
    build(port, keystore, password, opts).inspect_err(|e| {
        log::warn!(
            "server socket on port {} failed before {}: {}",
            port,
            e.stage(),
            e
        );
    })
}

fn build(
    port: u16,
    keystore: KeystoreSource<'_>,
    password: &str,
    opts: &ServerOptions,
) -> Result<TlsListener> {
    let keystore = Keystore::load(keystore, password)?;
    log::debug!("{}: {:?}", Stage::KeystoreLoaded, keystore);

    let trust = material::extract_trust_manager(&keystore)?;
    let key = material::extract_key_manager(&keystore, password)?;
    log::debug!(
        "{}: {} trust anchor(s), key for {}",
        Stage::MaterialExtracted,
        trust.anchors().len(),
        CertInfo::from_x509(key.certificate()).subject
    );

    let ctx = context::server_context(&key, &trust, opts)?;
    log::debug!("{}", Stage::ContextBuilt);

    let addr = SocketAddr::new(opts.bind_address, port);
    let listener = listen(addr, opts)?;
    log::info!(
        "{}: TLS server socket listening on {}",
        Stage::SocketReady,
        listener.local_addr().unwrap_or(addr)
    );

    Ok(TlsListener { listener, ctx })
}

fn listen(addr: SocketAddr, opts: &ServerOptions) -> Result<TcpListener> {
    let bind_err = |source| Error::Bind { addr, source };

    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
        .map_err(bind_err)?;
    if opts.reuse_address && cfg!(not(windows)) {
        socket.set_reuse_address(true).map_err(bind_err)?;
    }
    socket.bind(&addr.into()).map_err(bind_err)?;
    socket.listen(opts.backlog).map_err(bind_err)?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::net::{IpAddr, Ipv4Addr};

    #[test]
    fn test_listen_ephemeral_port() {
        let opts = ServerOptions::new().bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST));
        let listener = listen(SocketAddr::new(opts.bind_address, 0), &opts).unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[test]
    fn test_listen_port_in_use() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = taken.local_addr().unwrap();

        let err = listen(addr, &ServerOptions::new()).unwrap_err();
        assert!(matches!(err, Error::Bind { .. }));
        assert_eq!(err.kind(), ErrorKind::Network);
    }
}
