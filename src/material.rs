//! Trust and key material extraction
//!
//! A factory turns an unlocked [`Keystore`] into an ordered list of
//! managers. Builders take the first manager that works on X.509
//! certificates; an empty scan is an error, never an absent manager passed
//! on to the TLS context.

use crate::error::Error;
use crate::keystore::Keystore;
use crate::Result;
use openssl::pkey::{PKey, Private};
use openssl::x509::X509;

/// Validates peer certificate chains against keystore certificates
#[derive(Debug, Clone)]
pub struct X509TrustManager {
    anchors: Vec<X509>,
}

impl X509TrustManager {
    pub fn new(anchors: Vec<X509>) -> Self {
        X509TrustManager { anchors }
    }

    /// Trusted certificates, in keystore order
    pub fn anchors(&self) -> &[X509] {
        &self.anchors
    }
}

/// Presents this endpoint's certificate and proves ownership of its key
#[derive(Clone)]
pub struct X509KeyManager {
    certificate: X509,
    private_key: PKey<Private>,
    chain: Vec<X509>,
}

impl X509KeyManager {
    pub fn new(certificate: X509, private_key: PKey<Private>, chain: Vec<X509>) -> Self {
        X509KeyManager {
            certificate,
            private_key,
            chain,
        }
    }

    pub fn certificate(&self) -> &X509 {
        &self.certificate
    }

    pub fn private_key(&self) -> &PKey<Private> {
        &self.private_key
    }

    /// Intermediates sent after the certificate
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }
}

impl std::fmt::Debug for X509KeyManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("X509KeyManager")
            .field("certificate", &self.certificate)
            .field("chain", &self.chain.len())
            .finish_non_exhaustive()
    }
}

/// A trust strategy reported by a [`TrustManagerFactory`]
#[derive(Debug, Clone)]
pub enum TrustManager {
    X509(X509TrustManager),
    /// Not certificate based; skipped during selection
    Other(String),
}

/// A key strategy reported by a [`KeyManagerFactory`]
#[derive(Debug, Clone)]
pub enum KeyManager {
    X509(X509KeyManager),
    /// Not certificate based; skipped during selection
    Other(String),
}

pub trait TrustManagerFactory {
    /// Trust managers for `keystore`, in preference order
    fn trust_managers(&self, keystore: &Keystore) -> Result<Vec<TrustManager>>;
}

pub trait KeyManagerFactory {
    /// Key managers for `keystore`, in preference order
    ///
    /// `password` unlocks the private key, independently of the password
    /// that unlocked the keystore.
    fn key_managers(&self, keystore: &Keystore, password: &str) -> Result<Vec<KeyManager>>;
}

/// Trusts every certificate the keystore holds
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTrustManagerFactory;

impl TrustManagerFactory for DefaultTrustManagerFactory {
    fn trust_managers(&self, keystore: &Keystore) -> Result<Vec<TrustManager>> {
        let anchors: Vec<X509> = keystore.certificates().cloned().collect();
        if anchors.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![TrustManager::X509(X509TrustManager::new(anchors))])
    }
}

/// Serves the keystore's private key entry
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultKeyManagerFactory;

impl KeyManagerFactory for DefaultKeyManagerFactory {
    fn key_managers(&self, keystore: &Keystore, password: &str) -> Result<Vec<KeyManager>> {
        let parsed = keystore.reopen(password).map_err(Error::KeyRecovery)?;

        match (parsed.cert, parsed.pkey) {
            (Some(cert), Some(key)) => {
                let chain = keystore.chain().to_vec();
                Ok(vec![KeyManager::X509(X509KeyManager::new(cert, key, chain))])
            }
            _ => Ok(Vec::new()),
        }
    }
}

/// First X.509 trust manager from the default factory
pub fn extract_trust_manager(keystore: &Keystore) -> Result<X509TrustManager> {
    extract_trust_manager_with(&DefaultTrustManagerFactory, keystore)
}

pub fn extract_trust_manager_with<F>(factory: &F, keystore: &Keystore) -> Result<X509TrustManager>
where
    F: TrustManagerFactory + ?Sized,
{
    factory
        .trust_managers(keystore)?
        .into_iter()
        .find_map(|manager| match manager {
            TrustManager::X509(tm) => Some(tm),
            TrustManager::Other(_) => None,
        })
        .ok_or(Error::NoTrustManager)
}

/// First X.509 key manager from the default factory
pub fn extract_key_manager(keystore: &Keystore, password: &str) -> Result<X509KeyManager> {
    extract_key_manager_with(&DefaultKeyManagerFactory, keystore, password)
}

pub fn extract_key_manager_with<F>(
    factory: &F,
    keystore: &Keystore,
    password: &str,
) -> Result<X509KeyManager>
where
    F: KeyManagerFactory + ?Sized,
{
    factory
        .key_managers(keystore, password)?
        .into_iter()
        .find_map(|manager| match manager {
            KeyManager::X509(km) => Some(km),
            KeyManager::Other(_) => None,
        })
        .ok_or(Error::NoKeyManager)
}
