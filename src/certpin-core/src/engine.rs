//! The pinning engine: the public entry point for TLS challenges.
//!
//! One challenge flows `resolve → evaluate → decide`, synchronously on the
//! caller's thread:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       PinningEngine                        │
//! │                                                            │
//! │  evaluate_trust(hostname, chain)                           │
//! │        │                                                   │
//! │        ▼                                                   │
//! │  ┌─────────────┐   ┌────────────────┐   ┌──────────────┐  │
//! │  │ PolicyStore │──▶│ evaluate_chain │──▶│ TrustDecision│  │
//! │  │  (resolve)  │   │  (pin match)   │   │              │  │
//! │  └─────────────┘   └───────┬────────┘   └──────────────┘  │
//! │                            │ on violation                  │
//! │                            ▼                               │
//! │                   ┌──────────────────┐                     │
//! │                   │ ReportDispatcher │ (fire-and-forget)   │
//! │                   └──────────────────┘                     │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A violation queues a report and the disposition is returned without
//! waiting on delivery. `NotPinned` instructs the caller to run default
//! certificate-authority trust evaluation; skipping that fallback would
//! disable certificate validation entirely.

use std::sync::OnceLock;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use crate::chain::CertificateChain;
use crate::config::PinningConfig;
use crate::error::PinningError;
use crate::logger::{self, LoggerCallback};
use crate::policy::PolicyStore;
use crate::report::ViolationReport;
use crate::reporter::ReportDispatcher;
use crate::validator::{evaluate_chain, PinFailure, PinValidation};

/// Disposition returned to the TLS layer for one authentication challenge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustDecision {
    /// The connection may proceed. This does not necessarily mean pin
    /// validation succeeded: a report-only policy allows failing
    /// connections through (after queueing a report).
    Allow,
    /// An enforcing policy was violated; abort the connection.
    Block,
    /// No pinning policy applies to this hostname. The caller MUST fall
    /// back to default certificate-authority trust evaluation.
    NotPinned,
}

/// The pinning policy engine and validator.
///
/// Explicitly constructed and injectable; tests build isolated instances.
/// Hosts that want a process-wide instance use [`init_shared_engine`].
pub struct PinningEngine {
    store: PolicyStore,
    dispatcher: ReportDispatcher,
    auto_intercept_connections: bool,
    logger: Option<LoggerCallback>,
}

impl PinningEngine {
    /// Build an engine from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PinningError::ConfigError`] when any domain entry is
    /// malformed; nothing is partially applied.
    pub fn new(config: PinningConfig) -> Result<Self, PinningError> {
        Self::build(config, None)
    }

    /// Like [`PinningEngine::new`], with a host diagnostic logger invoked
    /// with one line per noteworthy pinning event.
    pub fn with_logger(
        config: PinningConfig,
        logger: LoggerCallback,
    ) -> Result<Self, PinningError> {
        Self::build(config, Some(logger))
    }

    fn build(config: PinningConfig, logger: Option<LoggerCallback>) -> Result<Self, PinningError> {
        let store = PolicyStore::from_domains(&config.pinned_domains)?;
        let cache_window = config.report_cache_window_secs.map(Duration::from_secs);
        let dispatcher = ReportDispatcher::new(cache_window);
        info!(
            domains = store.len(),
            auto_intercept = config.auto_intercept_connections,
            report_cache_window = ?cache_window,
            "pinning engine initialized"
        );
        Ok(Self {
            store,
            dispatcher,
            auto_intercept_connections: config.auto_intercept_connections,
            logger,
        })
    }

    /// Evaluate a server's identity for a TLS challenge, port unknown.
    pub fn evaluate_trust(&self, hostname: &str, chain: &CertificateChain) -> TrustDecision {
        self.evaluate_trust_with_port(hostname, 0, chain)
    }

    /// Evaluate a server's identity for a TLS challenge.
    ///
    /// Synchronous and non-blocking: in-memory lookups and digesting only.
    /// Violation reports are queued for background delivery and never delay
    /// the returned disposition.
    #[instrument(skip(self, chain), fields(chain_len = chain.len()))]
    pub fn evaluate_trust_with_port(
        &self,
        hostname: &str,
        port: u16,
        chain: &CertificateChain,
    ) -> TrustDecision {
        let Some(policy) = self.store.resolve(hostname) else {
            debug!("no pinning policy for hostname");
            return TrustDecision::NotPinned;
        };

        let validation = evaluate_chain(&policy, chain, Utc::now());
        match validation {
            PinValidation::Success => {
                self.log(&format!(
                    "{hostname}: pin validation succeeded (policy {})",
                    policy.hostname()
                ));
                TrustDecision::Allow
            }
            PinValidation::Failure(PinFailure::PolicyExpired) => {
                // Inert policy: behave exactly as if none was registered.
                self.log(&format!(
                    "{hostname}: pinning policy for {} has expired, falling back to default trust",
                    policy.hostname()
                ));
                TrustDecision::NotPinned
            }
            PinValidation::Failure(reason) => {
                warn!(
                    ?reason,
                    noted_hostname = %policy.hostname(),
                    enforce = policy.enforce_pinning(),
                    "pin validation failed"
                );
                if !policy.report_uris().is_empty() {
                    let report = ViolationReport::build(
                        hostname,
                        port,
                        &policy,
                        chain,
                        validation,
                        Utc::now(),
                    );
                    self.dispatcher.dispatch(report);
                }
                if validation.would_block(policy.enforce_pinning()) {
                    self.log(&format!(
                        "{hostname}: blocking connection, pin validation failed ({reason:?})"
                    ));
                    TrustDecision::Block
                } else {
                    self.log(&format!(
                        "{hostname}: pin validation failed ({reason:?}) but policy is \
                         report-only, allowing connection"
                    ));
                    TrustDecision::Allow
                }
            }
        }
    }

    /// The engine's policy store.
    #[must_use]
    pub fn policy_store(&self) -> &PolicyStore {
        &self.store
    }

    /// Whether the host asked for automatic connection interception.
    /// The engine only records the flag; acting on it is the host's job.
    #[must_use]
    pub fn auto_intercept_connections(&self) -> bool {
        self.auto_intercept_connections
    }

    /// Reports accepted into the delivery queue since startup.
    #[must_use]
    pub fn queued_report_count(&self) -> u64 {
        self.dispatcher.queued_report_count()
    }

    fn log(&self, message: &str) {
        logger::emit(self.logger.as_ref(), message);
    }
}

static SHARED_ENGINE: OnceLock<PinningEngine> = OnceLock::new();

/// Initialize the process-wide shared engine.
///
/// Callable once per process: a second call is rejected with
/// [`PinningError::AlreadyInitialized`] rather than silently replacing the
/// active pin set. Hosts that need several configurations construct their
/// own [`PinningEngine`] instances instead.
///
/// # Errors
///
/// Returns [`PinningError::ConfigError`] for malformed configuration and
/// [`PinningError::AlreadyInitialized`] on repeated initialization.
pub fn init_shared_engine(config: PinningConfig) -> Result<&'static PinningEngine, PinningError> {
    let engine = PinningEngine::new(config)?;
    let mut installed = false;
    let shared = SHARED_ENGINE.get_or_init(|| {
        installed = true;
        engine
    });
    if installed {
        Ok(shared)
    } else {
        Err(PinningError::AlreadyInitialized)
    }
}

/// The shared engine, when [`init_shared_engine`] has run.
#[must_use]
pub fn shared_engine() -> Option<&'static PinningEngine> {
    SHARED_ENGINE.get()
}
