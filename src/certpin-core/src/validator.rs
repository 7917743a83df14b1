//! Certificate chain evaluation against a pinning policy.
//!
//! Evaluation is pure and synchronous: in-memory digesting and set lookups
//! only, so it is safe to run directly on whatever thread the host's TLS
//! layer delivers challenges on. The chain is walked leaf to root; backup
//! pins are frequently held by intermediates, so a leaf-first walk finds a
//! match as early as possible.

use chrono::{DateTime, Utc};
use tracing::{debug, trace};

use certpin_spki::{classify_spki, SpkiHash};

use crate::chain::CertificateChain;
use crate::policy::PinningPolicy;

/// Why a chain failed pin validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinFailure {
    /// No certificate in the chain digests to a configured pin.
    NoMatchingPin,
    /// The policy's expiration date has passed; pinning no longer applies.
    PolicyExpired,
    /// The served chain was empty.
    EmptyChain,
    /// No certificate in the chain carries a key type the policy permits.
    AlgorithmNotPermitted,
}

/// Outcome of evaluating a chain against one policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinValidation {
    /// At least one certificate matched a configured pin.
    Success,
    /// No pin matched; the reason says why.
    Failure(PinFailure),
}

impl PinValidation {
    /// Whether the chain satisfied the policy.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, PinValidation::Success)
    }

    /// Whether an enforcing policy blocks the connection on this outcome.
    ///
    /// Pure function of the enforcement flag and the outcome; report-only
    /// policies (`enforce_pinning == false`) never block.
    #[must_use]
    pub fn would_block(&self, enforce_pinning: bool) -> bool {
        enforce_pinning && !self.is_success()
    }

    /// Numeric code used in the report wire format.
    #[must_use]
    pub fn wire_code(&self) -> u8 {
        match self {
            PinValidation::Success => 0,
            PinValidation::Failure(PinFailure::NoMatchingPin) => 1,
            PinValidation::Failure(PinFailure::EmptyChain) => 2,
            PinValidation::Failure(PinFailure::AlgorithmNotPermitted) => 3,
            PinValidation::Failure(PinFailure::PolicyExpired) => 4,
        }
    }
}

/// Evaluate a served chain (leaf first) against `policy` at time `now`.
///
/// An expired policy short-circuits to [`PinFailure::PolicyExpired`] before
/// any pin comparison; callers treat that as "no policy", not as a pin
/// violation. Certificates whose key cannot be classified or whose
/// algorithm the policy does not permit are skipped, never fatal.
pub fn evaluate_chain(
    policy: &PinningPolicy,
    chain: &CertificateChain,
    now: DateTime<Utc>,
) -> PinValidation {
    if policy.is_expired_at(now) {
        debug!(
            noted_hostname = %policy.hostname(),
            expiration = ?policy.expiration_date(),
            "pinning policy has expired"
        );
        return PinValidation::Failure(PinFailure::PolicyExpired);
    }
    if chain.is_empty() {
        return PinValidation::Failure(PinFailure::EmptyChain);
    }

    let mut saw_permitted_key = false;
    for (index, certificate) in chain.iter().enumerate() {
        let algorithm = match classify_spki(certificate.spki_der()) {
            Ok(algorithm) => algorithm,
            Err(e) => {
                trace!(index, error = %e, "skipping certificate with unclassifiable key");
                continue;
            }
        };
        if !policy.allows_algorithm(algorithm) {
            trace!(index, %algorithm, "skipping certificate, algorithm not permitted");
            continue;
        }
        saw_permitted_key = true;

        let hash = SpkiHash::digest(certificate.spki_der());
        if policy.matches_pin(&hash) {
            trace!(index, %algorithm, pin = %hash, "pin matched");
            return PinValidation::Success;
        }
    }

    PinValidation::Failure(if saw_permitted_key {
        PinFailure::NoMatchingPin
    } else {
        PinFailure::AlgorithmNotPermitted
    })
}
