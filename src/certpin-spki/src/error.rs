//! Error types for SPKI classification and pin handling.

use thiserror::Error;

/// Errors produced while parsing, classifying, or decoding pin material.
#[derive(Debug, Error)]
pub enum SpkiError {
    /// The bytes are not a well-formed DER SubjectPublicKeyInfo.
    #[error("Malformed SubjectPublicKeyInfo: {message}")]
    Malformed {
        /// Parser diagnostic.
        message: String,
    },

    /// The key algorithm is not one of the pinnable algorithms.
    #[error("Unsupported public key algorithm: OID {oid}")]
    UnsupportedAlgorithm {
        /// The offending algorithm or named-curve OID.
        oid: String,
    },

    /// The key type is supported but the key size is not pinnable.
    #[error("Unsupported {algorithm} key size: {bits} bits")]
    UnsupportedKeySize {
        /// Key family ("RSA").
        algorithm: String,
        /// Observed modulus size in bits.
        bits: usize,
    },

    /// A configured pin was not valid base64, or not a SHA-256-sized digest.
    #[error("Invalid pin encoding: {message}")]
    InvalidPin {
        /// What was wrong with the pin string.
        message: String,
    },
}
