//! TLS sockets
//!
//! A [`TlsSocket`] is a connected TCP stream with an OpenSSL session in
//! connect (client) or accept (server) state. The handshake runs on the
//! first read or write, or when [`TlsSocket::handshake`] is called.

use crate::cert::{self, CertInfo};
use crate::error::Error;
use crate::Result;
use openssl::ssl::{self, ErrorCode, Ssl, SslContextRef, SslRef, SslStream};
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

/// A TLS-capable TCP socket
#[derive(Debug)]
pub struct TlsSocket {
    stream: SslStream<TcpStream>,
}

impl TlsSocket {
    pub(crate) fn client(
        ctx: &SslContextRef,
        tcp_stream: TcpStream,
        servername: Option<&str>,
        verify_hostname: bool,
    ) -> Result<Self> {
        let mut ssl = Ssl::new(ctx).map_err(Error::Context)?;

        if let Some(name) = servername {
            ssl.set_hostname(name).map_err(Error::Context)?;
            if verify_hostname {
                ssl.param_mut().set_host(name).map_err(Error::Context)?;
            }
        }

        ssl.set_connect_state();
        Self::wrap(ssl, tcp_stream)
    }

    pub(crate) fn server(ctx: &SslContextRef, tcp_stream: TcpStream) -> Result<Self> {
        let mut ssl = Ssl::new(ctx).map_err(Error::Context)?;
        ssl.set_accept_state();
        Self::wrap(ssl, tcp_stream)
    }

    fn wrap(ssl: Ssl, tcp_stream: TcpStream) -> Result<Self> {
        let stream = SslStream::new(ssl, tcp_stream).map_err(Error::Context)?;
        Ok(TlsSocket { stream })
    }

    /// Run the handshake now instead of on first I/O
    pub fn handshake(&mut self) -> Result<()> {
        self.stream.do_handshake().map_err(Error::Handshake)
    }

    /// Send close_notify, then shut the TCP connection down
    ///
    /// A peer that already closed its side is not an error; any other
    /// failure to send close_notify is returned as [`Error::Handshake`].
    pub fn shutdown(&mut self) -> Result<()> {
        match self.stream.shutdown() {
            Ok(_) => {}
            Err(e) if peer_gone(&e) => log::debug!("peer closed before close_notify: {}", e),
            Err(e) => return Err(Error::Handshake(e)),
        }
        match self.stream.get_mut().shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(Error::Io(e)),
            _ => Ok(()),
        }
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.stream.get_ref().peer_addr()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.stream.get_ref().local_addr()
    }

    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.get_ref().set_read_timeout(timeout)
    }

    pub fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        self.stream.get_ref().set_write_timeout(timeout)
    }

    /// Negotiated protocol version, e.g. "TLSv1.3"
    pub fn version(&self) -> &'static str {
        self.stream.ssl().version_str()
    }

    /// Negotiated cipher suite, if the handshake is done
    pub fn cipher(&self) -> Option<&'static str> {
        self.stream.ssl().current_cipher().map(|c| c.name())
    }

    /// Peer certificate chain, leaf first; empty before the handshake
    pub fn peer_certificates(&self) -> Vec<CertInfo> {
        cert::peer_chain(self.stream.ssl())
    }

    pub fn ssl(&self) -> &SslRef {
        self.stream.ssl()
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }
}

fn peer_gone(e: &ssl::Error) -> bool {
    if e.code() == ErrorCode::ZERO_RETURN {
        return true;
    }
    e.io_error().is_some_and(|io| {
        matches!(
            io.kind(),
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset
        )
    })
}

impl Read for TlsSocket {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TlsSocket {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
