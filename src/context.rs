//! TLS context construction
//!
//! Turns extracted material plus builder options into an OpenSSL
//! `SslContext`. Clients get trust material only and present no
//! certificate; servers get both.

use crate::config::{ClientOptions, ClientVerify, ServerOptions, TlsVersion};
use crate::error::Error;
use crate::material::{X509KeyManager, X509TrustManager};
use crate::Result;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode};

fn apply_versions(
    builder: &mut SslContextBuilder,
    min: Option<TlsVersion>,
    max: Option<TlsVersion>,
) -> Result<()> {
    builder
        .set_min_proto_version(min.map(|v| v.to_openssl_version()))
        .map_err(Error::Context)?;
    builder
        .set_max_proto_version(max.map(|v| v.to_openssl_version()))
        .map_err(Error::Context)?;
    Ok(())
}

fn install_trust(builder: &mut SslContextBuilder, trust: &X509TrustManager) -> Result<()> {
    let store = builder.cert_store_mut();
    for anchor in trust.anchors() {
        store.add_cert(anchor.clone()).map_err(Error::Context)?;
    }
    Ok(())
}

/// Client context validating peers against `trust`
pub fn client_context(trust: &X509TrustManager, opts: &ClientOptions) -> Result<SslContext> {
    let mut builder = SslContextBuilder::new(SslMethod::tls_client()).map_err(Error::Context)?;

    apply_versions(&mut builder, opts.min_version, opts.max_version)?;
    if let Some(ref ciphers) = opts.cipher_list {
        builder.set_cipher_list(ciphers).map_err(Error::Context)?;
    }

    install_trust(&mut builder, trust)?;
    builder.set_verify(SslVerifyMode::PEER);

    Ok(builder.build())
}

/// Server context presenting `key` and validating client certificates,
/// when requested, against `trust`
pub fn server_context(
    key: &X509KeyManager,
    trust: &X509TrustManager,
    opts: &ServerOptions,
) -> Result<SslContext> {
    let mut builder = SslContextBuilder::new(SslMethod::tls_server()).map_err(Error::Context)?;

    apply_versions(&mut builder, opts.min_version, opts.max_version)?;
    if let Some(ref ciphers) = opts.cipher_list {
        builder.set_cipher_list(ciphers).map_err(Error::Context)?;
    }

    builder
        .set_certificate(key.certificate())
        .map_err(Error::Context)?;
    for cert in key.chain() {
        builder
            .add_extra_chain_cert(cert.clone())
            .map_err(Error::Context)?;
    }
    // Newer OpenSSL already refuses a mismatched key here
    builder
        .set_private_key(key.private_key())
        .map_err(Error::KeyMismatch)?;
    builder.check_private_key().map_err(Error::KeyMismatch)?;

    install_trust(&mut builder, trust)?;

    let verify_mode = match opts.client_verify {
        ClientVerify::None => SslVerifyMode::NONE,
        ClientVerify::Optional => SslVerifyMode::PEER,
        ClientVerify::Required => SslVerifyMode::PEER | SslVerifyMode::FAIL_IF_NO_PEER_CERT,
    };
    if opts.client_verify != ClientVerify::None {
        for anchor in trust.anchors() {
            builder.add_client_ca(anchor).map_err(Error::Context)?;
        }
    }
    builder.set_verify(verify_mode);

    Ok(builder.build())
}
