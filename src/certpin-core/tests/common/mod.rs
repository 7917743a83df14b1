//! Shared helpers for the integration and property suites: minimal DER
//! SubjectPublicKeyInfo builders with seed-controlled key material, plus
//! configuration and chain builders.

#![allow(dead_code)]

use std::collections::BTreeMap;

use certpin_core::{CertificateChain, ChainCertificate, DomainConfig, PinningConfig, SpkiHash};

/// prime256v1 (1.2.840.10045.3.1.7).
pub const CURVE_P256: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
/// secp384r1 (1.3.132.0.34).
pub const CURVE_P384: &[u8] = &[0x2b, 0x81, 0x04, 0x00, 0x22];

const OID_RSA: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];
const OID_EC: &[u8] = &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01];

fn der_tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    let len = content.len();
    if len < 128 {
        out.push(len as u8);
    } else if len < 256 {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push((len & 0xff) as u8);
    }
    out.extend_from_slice(content);
    out
}

fn der_seq(parts: &[Vec<u8>]) -> Vec<u8> {
    der_tlv(0x30, &parts.concat())
}

fn der_oid(body: &[u8]) -> Vec<u8> {
    der_tlv(0x06, body)
}

fn der_uint(bytes: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    if bytes.first().map_or(true, |b| b & 0x80 != 0) {
        content.push(0);
    }
    content.extend_from_slice(bytes);
    der_tlv(0x02, &content)
}

fn der_bit_string(bytes: &[u8]) -> Vec<u8> {
    let mut content = vec![0u8];
    content.extend_from_slice(bytes);
    der_tlv(0x03, &content)
}

/// SPKI for an RSA key of `bits` with a `seed`-patterned modulus.
pub fn rsa_spki(bits: usize, seed: u8) -> Vec<u8> {
    let mut modulus = vec![seed; bits / 8];
    modulus[0] = 0xc1 ^ seed;
    let rsa_key = der_seq(&[der_uint(&modulus), der_uint(&[0x01, 0x00, 0x01])]);
    der_seq(&[
        der_seq(&[der_oid(OID_RSA), vec![0x05, 0x00]]),
        der_bit_string(&rsa_key),
    ])
}

/// SPKI for an EC key on `curve` with a point derived from `seed`.
pub fn ec_spki(curve: &[u8], seed: u16) -> Vec<u8> {
    let mut point = vec![0x04];
    point.extend((0..64).map(|i| (seed.wrapping_mul(31).wrapping_add(i) & 0xff) as u8));
    der_seq(&[
        der_seq(&[der_oid(OID_EC), der_oid(curve)]),
        der_bit_string(&point),
    ])
}

/// The canonical base64 pin for an SPKI.
pub fn pin_of(spki: &[u8]) -> String {
    SpkiHash::digest(spki).to_base64()
}

/// A leaf-first chain whose certificate bytes are derived from the SPKIs.
pub fn chain_of(spkis: &[Vec<u8>]) -> CertificateChain {
    spkis
        .iter()
        .map(|spki| {
            let mut der = b"cert:".to_vec();
            der.extend_from_slice(spki);
            ChainCertificate::new(der, spki.clone())
        })
        .collect()
}

/// Configuration with a single pinned domain.
pub fn config_with(hostname: &str, domain: DomainConfig) -> PinningConfig {
    let mut domains = BTreeMap::new();
    domains.insert(hostname.to_string(), domain);
    PinningConfig::new(domains)
}

/// Domain settings pinning the given SPKIs (a backup filler pin keeps the
/// two-pin floor satisfied when only one real key is pinned).
pub fn domain_pinning(spkis: &[&[u8]]) -> DomainConfig {
    let mut hashes: Vec<String> = spkis.iter().map(|spki| pin_of(spki)).collect();
    hashes.push(SpkiHash::digest(b"integration backup pin").to_base64());
    DomainConfig {
        public_key_hashes: hashes,
        ..DomainConfig::default()
    }
}
