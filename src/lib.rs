//! tls-keystore - TLS sockets from password-protected keystores
//!
//! This crate opens a PKCS#12 keystore, picks the first certificate-based
//! trust manager (and, for servers, key manager) it provides, builds an
//! OpenSSL context from them and hands back a socket:
//!
//! - [`client::connect`] returns a TCP-connected [`TlsSocket`], bounded by a
//!   5000 ms connect timeout by default
//! - [`server::bind`] returns a listening [`TlsListener`]
//!
//! Certificate validation and the handshake itself are OpenSSL's job. Each
//! call loads its own keystore and builds its own context; nothing is cached
//! between calls, and nothing is retried.
//!
//! # Examples
//!
//! ```no_run
//! use tls_keystore::{client, ClientOptions, KeystoreSource};
//! use std::time::Duration;
//!
//! let opts = ClientOptions::new().connect_timeout(Duration::from_secs(2));
//! let result = client::connect_with(
//!     "localhost",
//!     8443,
//!     KeystoreSource::from_path("store.p12"),
//!     "changeit",
//!     &opts,
//! );
//!
//! match result {
//!     Ok(mut socket) => socket.handshake().unwrap(),
//!     Err(e) => eprintln!("{} ({:?})", e, e.kind()),
//! }
//! ```

pub mod cert;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod keystore;
pub mod material;
pub mod server;
pub mod socket;

#[cfg(test)]
mod test_util;

pub use cert::CertInfo;
pub use client::Host;
pub use config::{ClientOptions, ClientVerify, ServerOptions, TlsVersion};
pub use error::{Error, ErrorKind, Stage};
pub use keystore::{Keystore, KeystoreSource};
pub use material::{
    KeyManager, KeyManagerFactory, TrustManager, TrustManagerFactory, X509KeyManager,
    X509TrustManager,
};
pub use server::TlsListener;
pub use socket::TlsSocket;

/// Result type for keystore socket operations
pub type Result<T> = std::result::Result<T, Error>;
