//! Certificate chain input types.
//!
//! The host TLS layer hands the engine the chain exactly as served by the
//! peer, leaf first, with the SubjectPublicKeyInfo already extracted per
//! certificate. The engine never parses full certificates, builds chains,
//! or re-orders them.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// One certificate from a served TLS chain.
#[derive(Debug, Clone)]
pub struct ChainCertificate {
    der: Vec<u8>,
    spki_der: Vec<u8>,
}

impl ChainCertificate {
    /// `der` is the full certificate as served; `spki_der` is its
    /// DER-encoded SubjectPublicKeyInfo, extracted by the host TLS layer.
    #[must_use]
    pub fn new(der: Vec<u8>, spki_der: Vec<u8>) -> Self {
        Self { der, spki_der }
    }

    /// The certificate bytes as served.
    #[must_use]
    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// The certificate's DER SubjectPublicKeyInfo.
    #[must_use]
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }
}

/// An ordered certificate chain, leaf (server) first, root last.
#[derive(Debug, Clone, Default)]
pub struct CertificateChain {
    certificates: Vec<ChainCertificate>,
}

impl CertificateChain {
    /// Wrap an already-ordered, leaf-first chain.
    #[must_use]
    pub fn new(certificates: Vec<ChainCertificate>) -> Self {
        Self { certificates }
    }

    /// Whether the chain holds no certificates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    /// Number of certificates in the chain.
    #[must_use]
    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    /// Iterate leaf to root.
    pub fn iter(&self) -> impl Iterator<Item = &ChainCertificate> {
        self.certificates.iter()
    }

    /// Base64 DER of each certificate, for failure reports.
    #[must_use]
    pub fn to_base64_der(&self) -> Vec<String> {
        self.certificates
            .iter()
            .map(|cert| BASE64.encode(&cert.der))
            .collect()
    }

    /// SHA-256 of each served certificate, identifying the chain for
    /// report de-duplication.
    #[must_use]
    pub fn fingerprints(&self) -> Vec<String> {
        self.certificates
            .iter()
            .map(|cert| {
                let mut hasher = Sha256::new();
                hasher.update(&cert.der);
                BASE64.encode(hasher.finalize())
            })
            .collect()
    }
}

impl FromIterator<ChainCertificate> for CertificateChain {
    fn from_iter<I: IntoIterator<Item = ChainCertificate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
