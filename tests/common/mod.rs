//! Shared fixtures: keystores generated with OpenSSL at test time

#![allow(dead_code)]

use openssl::x509::X509;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use tempfile::TempDir;
use tls_keystore::ServerOptions;

#[path = "../../src/test_util.rs"]
mod fixtures;

pub use fixtures::{self_signed, PASSWORD};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Keystore files living as long as the returned directory
pub struct Stores {
    pub dir: TempDir,
}

impl Stores {
    pub fn new() -> Self {
        Stores {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.path().join(file)
    }

    /// Keystore with a private key entry for `cn`
    pub fn identity(&self, file: &str, cn: &str, password: &str) -> PathBuf {
        self.identity_with_cert(file, cn, password).0
    }

    /// Same as `identity`, also returning the entry's certificate
    pub fn identity_with_cert(&self, file: &str, cn: &str, password: &str) -> (PathBuf, X509) {
        let (cert, key) = self_signed(cn);
        let der = fixtures::identity_der_for(cn, &cert, &key, password);
        (self.write(file, &der), cert)
    }

    /// Keystore with trusted certificates only
    pub fn trust_only(&self, file: &str, certs: &[X509], password: &str) -> PathBuf {
        self.write(file, &fixtures::trust_only_der_for(certs, password))
    }

    pub fn write(&self, file: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path(file);
        std::fs::write(&path, bytes).unwrap();
        path
    }
}

pub fn loopback() -> ServerOptions {
    ServerOptions::new().bind_address(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
