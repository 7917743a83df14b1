//! # certpin-spki
//!
//! Public key classification and pin digests for the certpin pinning engine.
//!
//! A *pin* is the SHA-256 digest of a certificate's DER-encoded
//! SubjectPublicKeyInfo, rendered as standard base64. This crate owns the two
//! primitives the pinning validator is built on:
//!
//! - [`classify_spki`] — identify which pinnable algorithm (RSA-2048/4096,
//!   ECDSA P-256/P-384) a SubjectPublicKeyInfo carries, from its OIDs.
//! - [`SpkiHash`] — compute and encode the pin digest itself.
//!
//! Both are pure functions over byte slices: no state, no I/O, safe to call
//! concurrently from any thread. Full X.509 certificate parsing deliberately
//! lives elsewhere; callers hand this crate the already-extracted
//! SubjectPublicKeyInfo bytes.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod algorithm;
mod digest;
mod error;

pub use algorithm::{classify_spki, PublicKeyAlgorithm};
pub use digest::{SpkiHash, PIN_DIGEST_LEN};
pub use error::SpkiError;

/// Classify and digest a DER-encoded SubjectPublicKeyInfo in one pass.
///
/// # Errors
///
/// Returns an error if the SPKI cannot be parsed or carries a key type that
/// cannot be pinned.
pub fn pin_for_spki(spki_der: &[u8]) -> Result<(PublicKeyAlgorithm, SpkiHash), SpkiError> {
    let algorithm = classify_spki(spki_der)?;
    Ok((algorithm, SpkiHash::digest(spki_der)))
}
