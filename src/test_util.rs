//! Keystore fixtures generated at test time
//!
//! Shared by the unit tests, the integration tests and the benches.

use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::ec::{EcGroup, EcKey};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkcs12::Pkcs12;
use openssl::pkey::{PKey, Private};
use openssl::stack::Stack;
use openssl::x509::extension::{BasicConstraints, SubjectAlternativeName};
use openssl::x509::{X509Name, X509};

pub const PASSWORD: &str = "changeit";

fn build_cert(cn: &str, with_sans: bool) -> (X509, PKey<Private>) {
    let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1).unwrap();
    let key = PKey::from_ec_key(EcKey::generate(&group).unwrap()).unwrap();

    let mut name = X509Name::builder().unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, cn).unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(1).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&key).unwrap();
    builder
        .set_not_before(&Asn1Time::days_from_now(0).unwrap())
        .unwrap();
    builder
        .set_not_after(&Asn1Time::days_from_now(365).unwrap())
        .unwrap();
    builder
        .append_extension(BasicConstraints::new().critical().ca().build().unwrap())
        .unwrap();
    if with_sans {
        let san = SubjectAlternativeName::new()
            .dns(cn)
            .ip("127.0.0.1")
            .build(&builder.x509v3_context(None, None))
            .unwrap();
        builder.append_extension(san).unwrap();
    }
    builder.sign(&key, MessageDigest::sha256()).unwrap();

    (builder.build(), key)
}

pub fn self_signed(cn: &str) -> (X509, PKey<Private>) {
    build_cert(cn, true)
}

pub fn self_signed_without_sans(cn: &str) -> (X509, PKey<Private>) {
    build_cert(cn, false)
}

/// PKCS#12 holding a private key entry for `cert`
pub fn identity_der_for(name: &str, cert: &X509, key: &PKey<Private>, password: &str) -> Vec<u8> {
    Pkcs12::builder()
        .name(name)
        .pkey(key)
        .cert(cert)
        .build2(password)
        .unwrap()
        .to_der()
        .unwrap()
}

/// PKCS#12 holding a private key entry for `cn`
pub fn identity_der(cn: &str, password: &str) -> Vec<u8> {
    let (cert, key) = self_signed(cn);
    identity_der_for(cn, &cert, &key, password)
}

/// PKCS#12 holding only the given trusted certificates, no private key
pub fn trust_only_der_for(certs: &[X509], password: &str) -> Vec<u8> {
    let mut ca = Stack::new().unwrap();
    for cert in certs {
        ca.push(cert.clone()).unwrap();
    }
    Pkcs12::builder().ca(ca).build2(password).unwrap().to_der().unwrap()
}

/// PKCS#12 trusting a fresh self-signed certificate for `cn`
pub fn trust_only_der(cn: &str, password: &str) -> Vec<u8> {
    let (cert, _key) = self_signed(cn);
    trust_only_der_for(&[cert], password)
}
