//! Error types for keystore-backed socket construction
//!
//! Every failure of a builder call surfaces as one [`Error`] variant. Callers
//! that only care about the broad category (ask for another password, abort,
//! retry later) can branch on [`Error::kind`].

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Stages a builder call moves through
///
/// A call starts at `Uninitialized` and advances one stage at a time until
/// `SocketReady`. A failure ends the call; [`Error::stage`] names the stage
/// that was being entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Uninitialized,
    KeystoreLoaded,
    MaterialExtracted,
    ContextBuilt,
    SocketReady,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Uninitialized => "uninitialized",
            Stage::KeystoreLoaded => "keystore-loaded",
            Stage::MaterialExtracted => "material-extracted",
            Stage::ContextBuilt => "context-built",
            Stage::SocketReady => "socket-ready",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Broad failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad host, missing or unreadable keystore source
    InputValidation,
    /// Wrong password, corrupt or unsupported keystore data
    Credential,
    /// No certificate-based trust or key manager in the keystore
    MaterialSelection,
    /// The TLS context rejected the extracted material
    TlsSetup,
    /// Connect, bind, accept or handshake failure
    Network,
}

/// Keystore socket errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot resolve host {host}: {source}")]
    AddressResolution {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("Host {0} resolved to no address")]
    NoAddress(String),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Keystore file not found: {}", .0.display())]
    KeystoreNotFound(PathBuf),

    #[error("Cannot read keystore: {0}")]
    KeystoreUnreadable(#[source] io::Error),

    #[error("Malformed or unsupported keystore: {0}")]
    KeystoreFormat(#[source] openssl::error::ErrorStack),

    #[error("Keystore could not be unlocked (wrong password?): {0}")]
    KeystoreLocked(#[source] openssl::error::ErrorStack),

    #[error("Private key could not be recovered: {0}")]
    KeyRecovery(#[source] openssl::error::ErrorStack),

    #[error("No X.509 trust manager available from keystore")]
    NoTrustManager,

    #[error("No X.509 key manager available from keystore")]
    NoKeyManager,

    #[error("TLS context initialization failed: {0}")]
    Context(#[source] openssl::error::ErrorStack),

    #[error("Certificate and private key do not match: {0}")]
    KeyMismatch(#[source] openssl::error::ErrorStack),

    #[error("Connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Connection to {addr} timed out after {}ms", .timeout.as_millis())]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },

    #[error("Cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("Accept failed: {0}")]
    Accept(#[source] io::Error),

    #[error("Handshake failed: {0}")]
    Handshake(#[source] openssl::ssl::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Category this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::AddressResolution { .. }
            | Error::NoAddress(_)
            | Error::InvalidVersion(_)
            | Error::KeystoreNotFound(_)
            | Error::KeystoreUnreadable(_) => ErrorKind::InputValidation,
            Error::KeystoreFormat(_) | Error::KeystoreLocked(_) | Error::KeyRecovery(_) => {
                ErrorKind::Credential
            }
            Error::NoTrustManager | Error::NoKeyManager => ErrorKind::MaterialSelection,
            Error::Context(_) | Error::KeyMismatch(_) => ErrorKind::TlsSetup,
            Error::Connect { .. }
            | Error::ConnectTimeout { .. }
            | Error::Bind { .. }
            | Error::Accept(_)
            | Error::Handshake(_)
            | Error::Io(_) => ErrorKind::Network,
        }
    }

    /// Builder stage that could not be reached because of this error
    ///
    /// Errors raised after a socket exists (accept, handshake, plain I/O)
    /// report `SocketReady`.
    pub fn stage(&self) -> Stage {
        match self {
            Error::InvalidVersion(_) => Stage::Uninitialized,
            Error::AddressResolution { .. }
            | Error::NoAddress(_)
            | Error::KeystoreNotFound(_)
            | Error::KeystoreUnreadable(_)
            | Error::KeystoreFormat(_)
            | Error::KeystoreLocked(_) => Stage::KeystoreLoaded,
            Error::KeyRecovery(_) | Error::NoTrustManager | Error::NoKeyManager => {
                Stage::MaterialExtracted
            }
            Error::Context(_) | Error::KeyMismatch(_) => Stage::ContextBuilt,
            Error::Connect { .. }
            | Error::ConnectTimeout { .. }
            | Error::Bind { .. }
            | Error::Accept(_)
            | Error::Handshake(_)
            | Error::Io(_) => Stage::SocketReady,
        }
    }
}
