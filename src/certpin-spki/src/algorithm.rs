//! Public key algorithm classification for pinnable keys.
//!
//! Pin comparison only makes sense for key types the validator knows how to
//! digest consistently; everything else is rejected at classification time
//! so the caller can skip the certificate instead of mis-pinning it.

use std::fmt;

use serde::{Deserialize, Serialize};
use x509_parser::oid_registry::{
    OID_EC_P256, OID_KEY_TYPE_EC_PUBLIC_KEY, OID_NIST_EC_P384, OID_PKCS1_RSAENCRYPTION,
};
use x509_parser::prelude::FromDer;
use x509_parser::public_key::PublicKey;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::error::SpkiError;

/// A public key type and size eligible for pinning.
///
/// The serde names are the spellings used in host configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PublicKeyAlgorithm {
    /// 2048-bit RSA.
    #[serde(rename = "RSA-2048")]
    Rsa2048,
    /// 4096-bit RSA.
    #[serde(rename = "RSA-4096")]
    Rsa4096,
    /// ECDSA over NIST P-256 (secp256r1).
    #[serde(rename = "ECDSA-P256")]
    EcdsaP256,
    /// ECDSA over NIST P-384 (secp384r1).
    #[serde(rename = "ECDSA-P384")]
    EcdsaP384,
}

impl PublicKeyAlgorithm {
    /// Every supported algorithm, the default allow-list for policies that
    /// do not restrict key types.
    pub const ALL: [PublicKeyAlgorithm; 4] = [
        PublicKeyAlgorithm::Rsa2048,
        PublicKeyAlgorithm::Rsa4096,
        PublicKeyAlgorithm::EcdsaP256,
        PublicKeyAlgorithm::EcdsaP384,
    ];

    /// Canonical configuration spelling.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            PublicKeyAlgorithm::Rsa2048 => "RSA-2048",
            PublicKeyAlgorithm::Rsa4096 => "RSA-4096",
            PublicKeyAlgorithm::EcdsaP256 => "ECDSA-P256",
            PublicKeyAlgorithm::EcdsaP384 => "ECDSA-P384",
        }
    }
}

impl fmt::Display for PublicKeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify the algorithm of a DER-encoded SubjectPublicKeyInfo.
///
/// RSA keys are classified by modulus size; EC keys by named curve. The key
/// material itself is not validated beyond what classification requires.
///
/// # Errors
///
/// Returns [`SpkiError::Malformed`] for undecodable input,
/// [`SpkiError::UnsupportedAlgorithm`] for key types outside the pinnable
/// set, and [`SpkiError::UnsupportedKeySize`] for RSA moduli that are
/// neither 2048 nor 4096 bits.
pub fn classify_spki(spki_der: &[u8]) -> Result<PublicKeyAlgorithm, SpkiError> {
    let (rest, spki) =
        SubjectPublicKeyInfo::from_der(spki_der).map_err(|e| SpkiError::Malformed {
            message: e.to_string(),
        })?;
    if !rest.is_empty() {
        return Err(SpkiError::Malformed {
            message: format!("{} trailing bytes after SubjectPublicKeyInfo", rest.len()),
        });
    }

    let oid = &spki.algorithm.algorithm;
    if *oid == OID_PKCS1_RSAENCRYPTION {
        classify_rsa(&spki)
    } else if *oid == OID_KEY_TYPE_EC_PUBLIC_KEY {
        classify_ec(&spki)
    } else {
        Err(SpkiError::UnsupportedAlgorithm {
            oid: oid.to_string(),
        })
    }
}

fn classify_rsa(spki: &SubjectPublicKeyInfo<'_>) -> Result<PublicKeyAlgorithm, SpkiError> {
    let rsa = match spki.parsed() {
        Ok(PublicKey::RSA(rsa)) => rsa,
        _ => {
            return Err(SpkiError::Malformed {
                message: "RSA OID with undecodable RSAPublicKey".into(),
            })
        }
    };
    let bits = modulus_bits(rsa.modulus);
    match bits {
        2048 => Ok(PublicKeyAlgorithm::Rsa2048),
        4096 => Ok(PublicKeyAlgorithm::Rsa4096),
        _ => Err(SpkiError::UnsupportedKeySize {
            algorithm: "RSA".into(),
            bits,
        }),
    }
}

fn classify_ec(spki: &SubjectPublicKeyInfo<'_>) -> Result<PublicKeyAlgorithm, SpkiError> {
    let curve = spki
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.as_oid().ok())
        .ok_or_else(|| SpkiError::Malformed {
            message: "EC key without a named curve parameter".into(),
        })?;
    if curve == OID_EC_P256 {
        Ok(PublicKeyAlgorithm::EcdsaP256)
    } else if curve == OID_NIST_EC_P384 {
        Ok(PublicKeyAlgorithm::EcdsaP384)
    } else {
        Err(SpkiError::UnsupportedAlgorithm {
            oid: curve.to_string(),
        })
    }
}

/// Bit size of a DER INTEGER modulus, ignoring sign-padding zero bytes.
fn modulus_bits(modulus: &[u8]) -> usize {
    let significant = modulus.iter().skip_while(|&&b| b == 0).count();
    significant * 8
}
