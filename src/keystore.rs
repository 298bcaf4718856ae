//! Keystore loading
//!
//! A keystore is a password-protected PKCS#12 container, the format written
//! by `openssl pkcs12 -export` and `keytool -storetype PKCS12`. It holds at
//! most one private key entry (certificate plus key) and any number of
//! additional certificates.
//!
//! Keystores are loaded per call and never cached.

use crate::cert::CertInfo;
use crate::error::Error;
use crate::Result;
use openssl::error::ErrorStack;
use openssl::pkcs12::{ParsedPkcs12_2, Pkcs12};
use openssl::x509::X509;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Where keystore bytes come from
pub enum KeystoreSource<'a> {
    /// A file, checked for existence before it is opened
    Path(PathBuf),
    /// An already-open stream, read to its end
    Reader(Box<dyn Read + 'a>),
}

impl<'a> KeystoreSource<'a> {
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        KeystoreSource::Path(path.as_ref().to_path_buf())
    }

    /// Pass `&mut reader` to keep ownership of the stream.
    pub fn from_reader<R: Read + 'a>(reader: R) -> Self {
        KeystoreSource::Reader(Box::new(reader))
    }

    fn read_all(self) -> Result<Vec<u8>> {
        let mut der = Vec::new();
        match self {
            KeystoreSource::Path(path) => {
                if !path.exists() {
                    return Err(Error::KeystoreNotFound(path));
                }
                let mut file = File::open(&path).map_err(Error::KeystoreUnreadable)?;
                file.read_to_end(&mut der)
                    .map_err(Error::KeystoreUnreadable)?;
            }
            KeystoreSource::Reader(mut reader) => {
                reader
                    .read_to_end(&mut der)
                    .map_err(Error::KeystoreUnreadable)?;
            }
        }
        Ok(der)
    }
}

impl From<PathBuf> for KeystoreSource<'_> {
    fn from(path: PathBuf) -> Self {
        KeystoreSource::Path(path)
    }
}

impl From<&Path> for KeystoreSource<'_> {
    fn from(path: &Path) -> Self {
        KeystoreSource::from_path(path)
    }
}

impl fmt::Debug for KeystoreSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeystoreSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            KeystoreSource::Reader(_) => f.write_str("Reader(..)"),
        }
    }
}

/// An unlocked keystore
pub struct Keystore {
    container: Pkcs12,
    certificate: Option<X509>,
    chain: Vec<X509>,
    has_private_key: bool,
}

impl Keystore {
    /// Read `source` and unlock it with `password`
    ///
    /// The source is consumed; a file opened here is closed before
    /// returning, on success and on failure alike.
    pub fn load(source: KeystoreSource<'_>, password: &str) -> Result<Self> {
        let der = source.read_all()?;
        Self::from_der(&der, password)
    }

    /// Unlock a keystore already held in memory
    pub fn from_der(der: &[u8], password: &str) -> Result<Self> {
        let container = Pkcs12::from_der(der).map_err(Error::KeystoreFormat)?;
        let ParsedPkcs12_2 { pkey, cert, ca } =
            container.parse2(password).map_err(Error::KeystoreLocked)?;

        Ok(Keystore {
            container,
            certificate: cert,
            chain: ca.map(|stack| stack.into_iter().collect()).unwrap_or_default(),
            has_private_key: pkey.is_some(),
        })
    }

    /// Certificate of the private key entry
    pub fn certificate(&self) -> Option<&X509> {
        self.certificate.as_ref()
    }

    /// Additional certificates, in stored order
    pub fn chain(&self) -> &[X509] {
        &self.chain
    }

    pub fn has_private_key(&self) -> bool {
        self.has_private_key
    }

    /// Every certificate in the keystore, entry certificate first
    pub fn certificates(&self) -> impl Iterator<Item = &X509> {
        self.certificate.iter().chain(self.chain.iter())
    }

    pub fn certificate_info(&self) -> Vec<CertInfo> {
        self.certificates().map(|c| CertInfo::from_x509(c)).collect()
    }

    /// Re-open the container with a (possibly different) key password
    pub(crate) fn reopen(
        &self,
        password: &str,
    ) -> std::result::Result<ParsedPkcs12_2, ErrorStack> {
        self.container.parse2(password)
    }
}

impl fmt::Debug for Keystore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keystore")
            .field("certificates", &self.certificate_info())
            .field("has_private_key", &self.has_private_key)
            .finish()
    }
}
