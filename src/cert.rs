//! Certificate summaries
//!
//! Human-readable view of the X.509 certificates held by a keystore or
//! presented by a peer. Parsing itself is left to OpenSSL.

use openssl::nid::Nid;
use openssl::ssl::SslRef;
use openssl::x509::{X509NameRef, X509Ref};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: String,
    /// Certificate issuer (Common Name)
    pub issuer: String,
    /// Subject Alternative Names, as `DNS:<name>` or `IP:<addr>`
    pub subject_alt_names: Vec<String>,
}

impl CertInfo {
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: common_name(cert.subject_name()),
            issuer: common_name(cert.issuer_name()),
            subject_alt_names: subject_alt_names(cert),
        }
    }

    /// Whether subject and issuer match
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

fn common_name(name: &X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().to_string().ok())
        .unwrap_or_else(|| "<undef>".to_string())
}

fn subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let Some(sans) = cert.subject_alt_names() else {
        return Vec::new();
    };

    sans.iter()
        .filter_map(|name| {
            if let Some(dns) = name.dnsname() {
                return Some(format!("DNS:{}", dns));
            }
            let ip = match name.ipaddress()? {
                [a, b, c, d] => IpAddr::V4(Ipv4Addr::new(*a, *b, *c, *d)),
                bytes => {
                    let octets: [u8; 16] = bytes.try_into().ok()?;
                    IpAddr::V6(Ipv6Addr::from(octets))
                }
            };
            Some(format!("IP:{}", ip))
        })
        .collect()
}

/// Summaries of the certificates the peer presented, leaf first
///
/// Empty until the handshake has completed.
pub fn peer_chain(ssl: &SslRef) -> Vec<CertInfo> {
    let mut chain = Vec::new();

    if let Some(peer_cert) = ssl.peer_certificate() {
        chain.push(CertInfo::from_x509(&peer_cert));
    }

    // On the client side the stack repeats the leaf
    if let Some(stack) = ssl.peer_cert_chain() {
        for cert in stack.iter().skip(usize::from(!chain.is_empty() && !ssl.is_server())) {
            chain.push(CertInfo::from_x509(cert));
        }
    }

    chain
}
