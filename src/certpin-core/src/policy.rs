//! Pinning policies and the process-wide policy store.
//!
//! The store is built exactly once from validated configuration and never
//! mutated afterwards, which is what makes lock-free concurrent lookups on
//! the TLS challenge path safe. Resolution walks the hostname's label
//! hierarchy: exact entry first, then the most specific registered ancestor,
//! which only matches when it opted into covering subdomains.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use reqwest::Url;

use certpin_spki::{PublicKeyAlgorithm, SpkiHash};

use crate::config::DomainConfig;
use crate::error::PinningError;

/// Minimum number of distinct pins a domain must configure (primary plus
/// backup, so a key rotation cannot lock clients out).
pub const MIN_PINS_PER_DOMAIN: usize = 2;

/// Longest hostname accepted at registration (RFC 1035 limit).
const MAX_HOSTNAME_LEN: usize = 253;

/// A validated pinning policy for one registered hostname.
#[derive(Debug, Clone)]
pub struct PinningPolicy {
    hostname: String,
    include_subdomains: bool,
    enforce_pinning: bool,
    allowed_algorithms: Vec<PublicKeyAlgorithm>,
    pins: HashSet<SpkiHash>,
    report_uris: Vec<Url>,
    expiration_date: Option<NaiveDate>,
}

impl PinningPolicy {
    fn from_config(hostname: &str, config: &DomainConfig) -> Result<Self, PinningError> {
        let mut pins = HashSet::new();
        for encoded in &config.public_key_hashes {
            let pin = SpkiHash::from_base64(encoded)
                .map_err(|e| PinningError::config_for(hostname, e.to_string()))?;
            pins.insert(pin);
        }
        if pins.len() < MIN_PINS_PER_DOMAIN {
            return Err(PinningError::config_for(
                hostname,
                format!(
                    "{} distinct pin(s) configured, need at least {} (primary + backup)",
                    pins.len(),
                    MIN_PINS_PER_DOMAIN
                ),
            ));
        }

        let mut report_uris = Vec::with_capacity(config.report_uris.len());
        for uri in &config.report_uris {
            let parsed = Url::parse(uri)
                .map_err(|e| PinningError::config_for(hostname, format!("report URI {uri:?}: {e}")))?;
            if parsed.scheme() != "https" && parsed.scheme() != "http" {
                return Err(PinningError::config_for(
                    hostname,
                    format!("report URI {uri:?}: unsupported scheme {:?}", parsed.scheme()),
                ));
            }
            report_uris.push(parsed);
        }

        let expiration_date = config
            .expiration_date
            .as_deref()
            .map(|date| {
                NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                    PinningError::config_for(hostname, format!("expiration date {date:?}: {e}"))
                })
            })
            .transpose()?;

        let allowed_algorithms = if config.public_key_algorithms.is_empty() {
            PublicKeyAlgorithm::ALL.to_vec()
        } else {
            config.public_key_algorithms.clone()
        };

        Ok(Self {
            hostname: hostname.to_string(),
            include_subdomains: config.include_subdomains,
            enforce_pinning: config.enforce_pinning,
            allowed_algorithms,
            pins,
            report_uris,
            expiration_date,
        })
    }

    /// The normalized hostname this policy was registered under.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Whether the policy also covers strict subdomains.
    #[must_use]
    pub fn include_subdomains(&self) -> bool {
        self.include_subdomains
    }

    /// Whether a failed validation blocks the connection.
    #[must_use]
    pub fn enforce_pinning(&self) -> bool {
        self.enforce_pinning
    }

    /// Key algorithms eligible for pin comparison.
    #[must_use]
    pub fn allowed_algorithms(&self) -> &[PublicKeyAlgorithm] {
        &self.allowed_algorithms
    }

    /// Whether `algorithm` participates in pin comparison for this policy.
    #[must_use]
    pub fn allows_algorithm(&self, algorithm: PublicKeyAlgorithm) -> bool {
        self.allowed_algorithms.contains(&algorithm)
    }

    /// The configured pin set.
    #[must_use]
    pub fn pins(&self) -> &HashSet<SpkiHash> {
        &self.pins
    }

    /// Whether `hash` is one of the configured pins.
    #[must_use]
    pub fn matches_pin(&self, hash: &SpkiHash) -> bool {
        self.pins.contains(hash)
    }

    /// Endpoints that receive violation reports. Empty = no reporting.
    #[must_use]
    pub fn report_uris(&self) -> &[Url] {
        &self.report_uris
    }

    /// The date the policy becomes inert, if one was configured.
    #[must_use]
    pub fn expiration_date(&self) -> Option<NaiveDate> {
        self.expiration_date
    }

    /// A policy is inert from 00:00:00 UTC of its expiration date onward.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiration_date {
            Some(date) => now >= date.and_time(NaiveTime::MIN).and_utc(),
            None => false,
        }
    }
}

/// Immutable-after-construction registry of pinning policies.
#[derive(Debug, Default)]
pub struct PolicyStore {
    policies: HashMap<String, Arc<PinningPolicy>>,
    excluded: HashSet<String>,
}

impl PolicyStore {
    /// Build and validate a store from per-domain configuration.
    ///
    /// All-or-nothing: the first invalid entry fails the whole registration
    /// and no policy is applied.
    ///
    /// # Errors
    ///
    /// Returns [`PinningError::ConfigError`] for a malformed hostname, a pin
    /// set smaller than [`MIN_PINS_PER_DOMAIN`], an undecodable pin, an
    /// unparseable report URI or expiration date, an exclusion entry that
    /// carries other settings, or two entries normalizing to one hostname.
    pub fn from_domains(domains: &BTreeMap<String, DomainConfig>) -> Result<Self, PinningError> {
        let mut policies = HashMap::new();
        let mut excluded = HashSet::new();

        for (hostname, config) in domains {
            let host = normalize_hostname(hostname);
            validate_hostname(&host)
                .map_err(|reason| PinningError::config_for(hostname, reason))?;

            if config.exclude_subdomain_from_parent_policy {
                if !config.is_exclusion_only() {
                    return Err(PinningError::config_for(
                        hostname,
                        "an exclusion entry must not carry any other pinning settings",
                    ));
                }
                if !excluded.insert(host.clone()) || policies.contains_key(&host) {
                    return Err(PinningError::config_for(hostname, "duplicate entry"));
                }
                continue;
            }

            let policy = Arc::new(PinningPolicy::from_config(&host, config)?);
            if policies.insert(host.clone(), policy).is_some() || excluded.contains(&host) {
                return Err(PinningError::config_for(hostname, "duplicate entry"));
            }
        }

        Ok(Self { policies, excluded })
    }

    /// Exact-match lookup for a (normalized) hostname.
    #[must_use]
    pub fn lookup(&self, hostname: &str) -> Option<Arc<PinningPolicy>> {
        self.policies
            .get(&normalize_hostname(hostname))
            .map(Arc::clone)
    }

    /// Resolve the policy governing `hostname`, if any.
    ///
    /// Exact match wins. Otherwise the leftmost label is stripped repeatedly
    /// and the most specific registered ancestor decides: it matches when it
    /// includes subdomains, and ends resolution with no match when it does
    /// not. Single-label ancestors are never considered, so a bare TLD can
    /// never govern a hostname. `None` tells the caller to fall back to
    /// default platform trust evaluation.
    #[must_use]
    pub fn resolve(&self, hostname: &str) -> Option<Arc<PinningPolicy>> {
        let host = normalize_hostname(hostname);
        if host.is_empty() || self.excluded.contains(&host) {
            return None;
        }
        if let Some(policy) = self.policies.get(&host) {
            return Some(Arc::clone(policy));
        }

        let mut ancestor = host.as_str();
        while let Some(dot) = ancestor.find('.') {
            ancestor = &ancestor[dot + 1..];
            if !ancestor.contains('.') {
                break;
            }
            if let Some(policy) = self.policies.get(ancestor) {
                return policy.include_subdomains.then(|| Arc::clone(policy));
            }
        }
        None
    }

    /// Number of registered policies (exclusion entries not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.policies.len()
    }

    /// Whether the store holds no policies at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

/// Normalize a hostname for registration and lookups: ASCII-lowercase and
/// strip any trailing dot.
#[must_use]
pub fn normalize_hostname(hostname: &str) -> String {
    hostname.trim_end_matches('.').to_ascii_lowercase()
}

fn validate_hostname(host: &str) -> Result<(), &'static str> {
    if host.is_empty() {
        return Err("empty hostname");
    }
    if host.len() > MAX_HOSTNAME_LEN {
        return Err("hostname longer than 253 characters");
    }
    let mut labels = 0;
    for label in host.split('.') {
        if label.is_empty() {
            return Err("hostname contains an empty label");
        }
        if label.starts_with('-') || label.ends_with('-') {
            return Err("hostname label starts or ends with a hyphen");
        }
        if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            return Err("hostname contains characters outside [a-z0-9-]");
        }
        labels += 1;
    }
    if labels < 2 {
        return Err("single-label hostnames (TLDs) cannot be pinned");
    }
    Ok(())
}
