//! # certpin-core
//!
//! TLS public key pinning for applications: a policy engine that validates
//! server identity against app-supplied SubjectPublicKeyInfo hashes,
//! independently of (and in addition to) certificate-authority trust, and
//! reports violations to configured collectors.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        PinningEngine                         │
//! │                                                              │
//! │  ┌──────────────┐  ┌───────────────┐  ┌──────────────────┐  │
//! │  │ PolicyStore  │  │   validator   │  │ ReportDispatcher │  │
//! │  │ (immutable,  │  │ (leaf-first   │  │ (bounded queue,  │  │
//! │  │  suffix walk)│  │  pin match)   │  │  dedup, reqwest) │  │
//! │  └──────────────┘  └───────────────┘  └──────────────────┘  │
//! │          ▲                 ▲                    ▲            │
//! │          └────────┬────────┘                    │            │
//! │                   │          on violation       │            │
//! │        evaluate_trust(hostname, chain) ─────────┘            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host's TLS layer hands every authentication challenge to
//! [`PinningEngine::evaluate_trust`] and receives a [`TrustDecision`]:
//! proceed, block, or fall back to default platform trust. Policy lookup
//! and pin matching are synchronous, lock-free, in-memory operations;
//! violation reporting happens on a dedicated background worker and never
//! delays the connection.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let config: PinningConfig = serde_json::from_str(config_json)?;
//! let engine = PinningEngine::new(config)?;
//!
//! // In the TLS authentication callback:
//! match engine.evaluate_trust(hostname, &chain) {
//!     TrustDecision::Allow => proceed(),
//!     TrustDecision::Block => abort(),
//!     TrustDecision::NotPinned => default_trust_evaluation(),
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod chain;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod policy;
pub mod report;
pub mod reporter;
pub mod validator;

#[cfg(test)]
pub(crate) mod testutil;

pub use chain::{CertificateChain, ChainCertificate};
pub use config::{DomainConfig, PinningConfig};
pub use engine::{init_shared_engine, shared_engine, PinningEngine, TrustDecision};
pub use error::PinningError;
pub use logger::LoggerCallback;
pub use policy::{normalize_hostname, PinningPolicy, PolicyStore, MIN_PINS_PER_DOMAIN};
pub use report::{PinFailureReport, ViolationReport};
pub use reporter::ReportDispatcher;
pub use validator::{evaluate_chain, PinFailure, PinValidation};

pub use certpin_spki::{classify_spki, pin_for_spki, PublicKeyAlgorithm, SpkiError, SpkiHash};
