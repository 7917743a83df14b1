//! Strongly-typed pinning configuration.
//!
//! Hosts register every pinned domain once at startup; the configuration is
//! validated eagerly and atomically when the engine is built, so a malformed
//! entry is rejected before any policy becomes active rather than on the
//! first matching connection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use certpin_spki::PublicKeyAlgorithm;

/// Top-level configuration for the pinning engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PinningConfig {
    /// Hostname → pinning settings for that domain.
    #[serde(default)]
    pub pinned_domains: BTreeMap<String, DomainConfig>,

    /// Ask the host integration to intercept the application's network
    /// stack and route TLS challenges here automatically. The engine only
    /// records and exposes this flag; interception itself is the host's job.
    #[serde(default)]
    pub auto_intercept_connections: bool,

    /// Rolling de-duplication window for violation reports, in seconds.
    /// `None` de-duplicates for the lifetime of the process.
    #[serde(default)]
    pub report_cache_window_secs: Option<u64>,
}

impl PinningConfig {
    /// Configuration pinning the given domains, with default global flags.
    #[must_use]
    pub fn new(pinned_domains: BTreeMap<String, DomainConfig>) -> Self {
        Self {
            pinned_domains,
            ..Self::default()
        }
    }

    /// Merge `other` into `self`, returning the combined configuration.
    ///
    /// Domains present in `other` win over domains in `self`; global flags
    /// are taken from `other`. This is the explicit *merge* operation for
    /// hosts that assemble their pin set from several sources; *replacing*
    /// a configuration means building a fresh engine from the new one.
    #[must_use]
    pub fn merged_with(mut self, other: PinningConfig) -> PinningConfig {
        self.pinned_domains.extend(other.pinned_domains);
        PinningConfig {
            pinned_domains: self.pinned_domains,
            auto_intercept_connections: other.auto_intercept_connections,
            report_cache_window_secs: other.report_cache_window_secs,
        }
    }
}

fn default_enforce() -> bool {
    true
}

/// Per-domain pinning settings, as registered at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Base64-encoded SHA-256 digests of the domain's pinned
    /// SubjectPublicKeyInfo structures. At least two distinct entries are
    /// required (a primary and a backup), so a key rotation cannot strand
    /// clients with no matching pin.
    #[serde(default)]
    pub public_key_hashes: Vec<String>,

    /// Block connections on validation failure. `false` keeps the policy in
    /// report-only mode: failures are reported but connections proceed.
    #[serde(default = "default_enforce")]
    pub enforce_pinning: bool,

    /// Apply this policy to strict subdomains as well.
    #[serde(default)]
    pub include_subdomains: bool,

    /// Opt this hostname out of a parent policy that includes subdomains.
    /// An exclusion entry must carry no other settings.
    #[serde(default)]
    pub exclude_subdomain_from_parent_policy: bool,

    /// Key algorithms eligible for pin comparison. Empty = all supported.
    #[serde(default)]
    pub public_key_algorithms: Vec<PublicKeyAlgorithm>,

    /// Endpoints that receive pin validation failure reports.
    #[serde(default)]
    pub report_uris: Vec<String>,

    /// Date (`yyyy-mm-dd`) after which the policy becomes inert and
    /// connections fall back to default trust evaluation. `None` = never.
    #[serde(default)]
    pub expiration_date: Option<String>,
}

impl Default for DomainConfig {
    fn default() -> Self {
        Self {
            public_key_hashes: Vec::new(),
            enforce_pinning: true,
            include_subdomains: false,
            exclude_subdomain_from_parent_policy: false,
            public_key_algorithms: Vec::new(),
            report_uris: Vec::new(),
            expiration_date: None,
        }
    }
}

impl DomainConfig {
    /// True when the entry is a pure parent-policy exclusion: the flag is
    /// set and every other field is still at its default.
    #[must_use]
    pub fn is_exclusion_only(&self) -> bool {
        self.exclude_subdomain_from_parent_policy
            && *self
                == DomainConfig {
                    exclude_subdomain_from_parent_policy: true,
                    ..DomainConfig::default()
                }
    }
}
