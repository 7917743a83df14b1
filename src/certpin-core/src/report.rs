//! Pin validation failure reports and their wire format.
//!
//! The JSON body follows the RFC 7469 violation-report conventions
//! (kebab-case member names, `pin-sha256="<base64>"` known-pin entries),
//! extended with the library version and the numeric validation result.

use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Url;
use serde::Serialize;

use crate::chain::CertificateChain;
use crate::policy::PinningPolicy;
use crate::validator::PinValidation;

/// JSON body POSTed to each configured report URI.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PinFailureReport {
    /// Version of this library.
    pub library_version: String,
    /// When the failure was observed, RFC 3339.
    pub date_time: String,
    /// Hostname the connection was made to.
    pub hostname: String,
    /// Server port; 0 when unknown.
    pub port: u16,
    /// The registered hostname whose policy matched.
    pub noted_hostname: String,
    /// Whether the matched policy covers subdomains.
    pub include_subdomains: bool,
    /// Whether the matched policy blocks failing connections.
    pub enforce_pinning: bool,
    /// The policy's expiration date (`yyyy-mm-dd`), when configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_expiration_date: Option<String>,
    /// The chain exactly as served, base64 DER, leaf first.
    pub served_certificate_chain: Vec<String>,
    /// Only present when the host distinguishes the chain it validated
    /// from the chain that was served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validated_certificate_chain: Option<Vec<String>>,
    /// The configured pins, as `pin-sha256="<base64>"` entries, sorted.
    pub known_pins: Vec<String>,
    /// Numeric validation result (see `PinValidation::wire_code`).
    pub validation_result: u8,
}

/// A failure report bundled with its delivery targets, queued for the
/// background dispatcher.
#[derive(Debug, Clone)]
pub struct ViolationReport {
    /// The report body.
    pub report: PinFailureReport,
    /// Where to POST it, in configuration order.
    pub report_uris: Vec<Url>,
    /// SHA-256 fingerprints of the served chain, for de-duplication.
    pub(crate) chain_fingerprints: Vec<String>,
}

impl ViolationReport {
    /// Build a report for one failed validation, snapshotting the policy.
    #[must_use]
    pub fn build(
        hostname: &str,
        port: u16,
        policy: &PinningPolicy,
        chain: &CertificateChain,
        validation: PinValidation,
        now: DateTime<Utc>,
    ) -> Self {
        let mut known_pins: Vec<String> = policy
            .pins()
            .iter()
            .map(|pin| format!("pin-sha256=\"{}\"", pin.to_base64()))
            .collect();
        known_pins.sort();

        let report = PinFailureReport {
            library_version: env!("CARGO_PKG_VERSION").to_string(),
            date_time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            hostname: hostname.to_string(),
            port,
            noted_hostname: policy.hostname().to_string(),
            include_subdomains: policy.include_subdomains(),
            enforce_pinning: policy.enforce_pinning(),
            effective_expiration_date: policy
                .expiration_date()
                .map(|date| date.format("%Y-%m-%d").to_string()),
            served_certificate_chain: chain.to_base64_der(),
            validated_certificate_chain: None,
            known_pins,
            validation_result: validation.wire_code(),
        };

        Self {
            report,
            report_uris: policy.report_uris().to_vec(),
            chain_fingerprints: chain.fingerprints(),
        }
    }

    /// Identity of this report for de-duplication purposes.
    pub(crate) fn cache_key(&self) -> ReportCacheKey {
        ReportCacheKey {
            hostname: self.report.hostname.clone(),
            noted_hostname: self.report.noted_hostname.clone(),
            known_pins: self.report.known_pins.clone(),
            chain_fingerprints: self.chain_fingerprints.clone(),
            validation_result: self.report.validation_result,
        }
    }
}

/// Identity of a report: identical keys within the de-duplication window
/// are transmitted once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ReportCacheKey {
    hostname: String,
    noted_hostname: String,
    known_pins: Vec<String>,
    chain_fingerprints: Vec<String>,
    validation_result: u8,
}
