//! End-to-end challenge handling: registration through trust decision.

use certpin_core::{
    CertificateChain, DomainConfig, PinningConfig, PinningEngine, TrustDecision,
};

use crate::common::{
    chain_of, config_with, domain_pinning, ec_spki, pin_of, rsa_spki, CURVE_P256, CURVE_P384,
};

#[test]
fn pinned_leaf_allows_connection() {
    let leaf = ec_spki(CURVE_P256, 1);
    let root = rsa_spki(2048, 2);
    let engine =
        PinningEngine::new(config_with("example.com", domain_pinning(&[&leaf]))).unwrap();

    let decision = engine.evaluate_trust("example.com", &chain_of(&[leaf, root]));
    assert_eq!(decision, TrustDecision::Allow);
}

#[test]
fn backup_pin_on_intermediate_allows_connection() {
    let leaf = ec_spki(CURVE_P256, 3);
    let intermediate = ec_spki(CURVE_P384, 4);
    let engine = PinningEngine::new(config_with(
        "example.com",
        domain_pinning(&[&intermediate]),
    ))
    .unwrap();

    let decision = engine.evaluate_trust("example.com", &chain_of(&[leaf, intermediate]));
    assert_eq!(decision, TrustDecision::Allow);
}

#[test]
fn unpinned_chain_blocks_when_enforcing() {
    let pinned = ec_spki(CURVE_P256, 5);
    let served = ec_spki(CURVE_P256, 6);
    let engine =
        PinningEngine::new(config_with("example.com", domain_pinning(&[&pinned]))).unwrap();

    let decision = engine.evaluate_trust("example.com", &chain_of(&[served]));
    assert_eq!(decision, TrustDecision::Block);
}

#[test]
fn unpinned_chain_proceeds_in_report_only_mode() {
    let pinned = ec_spki(CURVE_P256, 7);
    let served = ec_spki(CURVE_P256, 8);
    let mut domain = domain_pinning(&[&pinned]);
    domain.enforce_pinning = false;
    let engine = PinningEngine::new(config_with("example.com", domain)).unwrap();

    let decision = engine.evaluate_trust("example.com", &chain_of(&[served]));
    assert_eq!(decision, TrustDecision::Allow);
}

#[test]
fn unregistered_hostname_is_not_handled() {
    let leaf = ec_spki(CURVE_P256, 9);
    let engine =
        PinningEngine::new(config_with("example.com", domain_pinning(&[&leaf]))).unwrap();

    let decision = engine.evaluate_trust("unrelated.org", &chain_of(&[leaf]));
    assert_eq!(decision, TrustDecision::NotPinned);
}

#[test]
fn subdomains_inherit_the_parent_policy_when_included() {
    let leaf = ec_spki(CURVE_P256, 10);
    let mut domain = domain_pinning(&[&leaf]);
    domain.include_subdomains = true;
    let engine = PinningEngine::new(config_with("example.com", domain)).unwrap();

    assert_eq!(
        engine.evaluate_trust("deep.api.example.com", &chain_of(&[leaf.clone()])),
        TrustDecision::Allow
    );
    let served = ec_spki(CURVE_P256, 11);
    assert_eq!(
        engine.evaluate_trust("deep.api.example.com", &chain_of(&[served])),
        TrustDecision::Block
    );
}

#[test]
fn subdomains_do_not_inherit_without_the_flag() {
    let leaf = ec_spki(CURVE_P256, 12);
    let engine =
        PinningEngine::new(config_with("example.com", domain_pinning(&[&leaf]))).unwrap();

    assert_eq!(
        engine.evaluate_trust("api.example.com", &chain_of(&[leaf])),
        TrustDecision::NotPinned
    );
}

#[test]
fn most_specific_ancestor_decides() {
    let parent_key = ec_spki(CURVE_P256, 13);
    let child_key = ec_spki(CURVE_P256, 14);

    let mut parent = domain_pinning(&[&parent_key]);
    parent.include_subdomains = true;
    let child = domain_pinning(&[&child_key]);

    let config = config_with("example.com", parent)
        .merged_with(config_with("api.example.com", child));
    let engine = PinningEngine::new(config).unwrap();

    // The exact entry wins over the wildcard parent.
    assert_eq!(
        engine.evaluate_trust("api.example.com", &chain_of(&[child_key.clone()])),
        TrustDecision::Allow
    );
    assert_eq!(
        engine.evaluate_trust("api.example.com", &chain_of(&[parent_key.clone()])),
        TrustDecision::Block
    );
    // api.example.com does not include subdomains, so its children are not
    // governed at all, not even by the grandparent wildcard.
    assert_eq!(
        engine.evaluate_trust("foo.api.example.com", &chain_of(&[parent_key])),
        TrustDecision::NotPinned
    );
}

#[test]
fn exclusion_entry_opts_out_of_parent_policy() {
    let parent_key = ec_spki(CURVE_P256, 15);
    let mut parent = domain_pinning(&[&parent_key]);
    parent.include_subdomains = true;

    let exclusion = DomainConfig {
        exclude_subdomain_from_parent_policy: true,
        ..DomainConfig::default()
    };

    let config = config_with("example.com", parent)
        .merged_with(config_with("legacy.example.com", exclusion));
    let engine = PinningEngine::new(config).unwrap();

    let served = ec_spki(CURVE_P256, 16);
    assert_eq!(
        engine.evaluate_trust("legacy.example.com", &chain_of(&[served.clone()])),
        TrustDecision::NotPinned
    );
    assert_eq!(
        engine.evaluate_trust("modern.example.com", &chain_of(&[served])),
        TrustDecision::Block
    );
}

#[test]
fn empty_chain_is_treated_as_a_violation() {
    let pinned = ec_spki(CURVE_P256, 17);
    let engine =
        PinningEngine::new(config_with("example.com", domain_pinning(&[&pinned]))).unwrap();

    assert_eq!(
        engine.evaluate_trust("example.com", &CertificateChain::default()),
        TrustDecision::Block
    );
}

#[test]
fn expired_policy_falls_back_to_default_trust() {
    let pinned = ec_spki(CURVE_P256, 18);
    let mut domain = domain_pinning(&[&pinned]);
    domain.expiration_date = Some("2021-01-01".into());
    let engine = PinningEngine::new(config_with("example.com", domain)).unwrap();

    // Even a chain that would have matched: the policy is simply inert.
    assert_eq!(
        engine.evaluate_trust("example.com", &chain_of(&[pinned])),
        TrustDecision::NotPinned
    );
    assert_eq!(engine.queued_report_count(), 0);
}

#[test]
fn registration_with_one_pin_is_rejected() {
    let domain = DomainConfig {
        public_key_hashes: vec![pin_of(&ec_spki(CURVE_P256, 19))],
        ..DomainConfig::default()
    };
    assert!(PinningEngine::new(config_with("example.com", domain)).is_err());
}

#[test]
fn hostnames_are_matched_case_insensitively() {
    let leaf = ec_spki(CURVE_P256, 20);
    let engine =
        PinningEngine::new(config_with("Example.COM", domain_pinning(&[&leaf]))).unwrap();

    assert_eq!(
        engine.evaluate_trust("EXAMPLE.com.", &chain_of(&[leaf])),
        TrustDecision::Allow
    );
}

#[test]
fn json_configuration_end_to_end() {
    let leaf = ec_spki(CURVE_P256, 21);
    let json = format!(
        r#"{{
            "pinned_domains": {{
                "example.com": {{
                    "public_key_hashes": ["{}", "{}"],
                    "include_subdomains": true,
                    "public_key_algorithms": ["ECDSA-P256"]
                }}
            }}
        }}"#,
        pin_of(&leaf),
        pin_of(b"backup pin material")
    );
    let config: PinningConfig = serde_json::from_str(&json).unwrap();
    let engine = PinningEngine::new(config).unwrap();

    assert_eq!(
        engine.evaluate_trust("www.example.com", &chain_of(&[leaf])),
        TrustDecision::Allow
    );
}
