//! SPKI pin digests and their canonical base64 encoding.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::error::SpkiError;

/// Length in bytes of a pin digest (SHA-256).
pub const PIN_DIGEST_LEN: usize = 32;

/// The SHA-256 digest of a DER-encoded SubjectPublicKeyInfo.
///
/// This is the unit of comparison for pinning: a certificate matches a
/// policy when the digest of its SubjectPublicKeyInfo equals one of the
/// policy's configured hashes. The canonical text form is standard base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpkiHash([u8; PIN_DIGEST_LEN]);

impl SpkiHash {
    /// Digest a DER-encoded SubjectPublicKeyInfo.
    #[must_use]
    pub fn digest(spki_der: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(spki_der);
        Self(hasher.finalize().into())
    }

    /// Decode a pin from its canonical base64 representation.
    ///
    /// # Errors
    ///
    /// Returns [`SpkiError::InvalidPin`] when the string is not base64 or
    /// does not decode to exactly 32 bytes.
    pub fn from_base64(encoded: &str) -> Result<Self, SpkiError> {
        let bytes = BASE64
            .decode(encoded.trim())
            .map_err(|e| SpkiError::InvalidPin {
                message: format!("{encoded:?}: {e}"),
            })?;
        let digest: [u8; PIN_DIGEST_LEN] =
            bytes.try_into().map_err(|bytes: Vec<u8>| SpkiError::InvalidPin {
                message: format!(
                    "{encoded:?}: decoded to {} bytes, expected {PIN_DIGEST_LEN}",
                    bytes.len()
                ),
            })?;
        Ok(Self(digest))
    }

    /// Canonical base64 rendering.
    #[must_use]
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// Raw digest bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; PIN_DIGEST_LEN] {
        &self.0
    }
}

impl fmt::Display for SpkiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl fmt::Debug for SpkiHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpkiHash({})", self.to_base64())
    }
}

impl FromStr for SpkiHash {
    type Err = SpkiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base64(s)
    }
}
