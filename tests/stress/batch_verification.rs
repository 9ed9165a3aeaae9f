//! Stress test: batch verification over large, mixed trust mark lists.
//!
//! Invalid entries must be excluded without failing the batch, and the
//! sequential and concurrent batch paths must agree on the result.

use std::sync::Arc;

use oidfed_trustmark::jose::Ed25519Signer;
use oidfed_trustmark::{
    EntityStatement, FederationEntity, Signer, StaticResolver, TrustMarkInfo, TrustMarkInfos,
    TrustMarkIssuer, TrustMarkSpec,
};

struct Setup {
    anchor: EntityStatement,
    resolver: StaticResolver,
    allowed: TrustMarkIssuer,
    banned: TrustMarkIssuer,
}

fn setup() -> Setup {
    let mut ta = FederationEntity::new("https://ta", Arc::new(Ed25519Signer::generate()));
    ta.trust_mark_issuers
        .insert("badge-A".into(), vec!["https://allowed".into()]);
    let anchor = EntityStatement::parse(&ta.entity_configuration_jwt().unwrap()).unwrap();

    let mut resolver = StaticResolver::new();
    let mut issuer = |id: &str| {
        let signer = Arc::new(Ed25519Signer::generate());
        resolver
            .add_raw_entity_configuration(
                &FederationEntity::new(id, signer.clone())
                    .entity_configuration_jwt()
                    .unwrap(),
            )
            .unwrap();
        TrustMarkIssuer::new(id, signer, vec![TrustMarkSpec::new("badge-A", 3600)])
    };
    let allowed = issuer("https://allowed");
    let banned = issuer("https://banned");

    Setup {
        anchor,
        resolver,
        allowed,
        banned,
    }
}

/// 1000 entries; every third is from a banned issuer and every seventh is
/// unparseable.
fn mixed_batch(setup: &Setup) -> (TrustMarkInfos, Vec<String>) {
    let mut infos = Vec::new();
    let mut expected = Vec::new();
    for i in 0..1_000 {
        let subject = format!("https://sub{i}.example");
        if i % 7 == 0 {
            infos.push(TrustMarkInfo::new("badge-A", format!("garbage-{i}")));
        } else if i % 3 == 0 {
            infos.push(setup.banned.issue_trust_mark("badge-A", &subject, None).unwrap());
        } else {
            infos.push(setup.allowed.issue_trust_mark("badge-A", &subject, None).unwrap());
            expected.push(subject);
        }
    }
    (TrustMarkInfos::from(infos), expected)
}

fn subjects(infos: &TrustMarkInfos) -> Vec<String> {
    infos
        .iter()
        .map(|info| info.trust_mark().unwrap().subject.clone())
        .collect()
}

#[test]
fn stress_batch_excludes_invalid_and_keeps_order() {
    let setup = setup();
    let (batch, expected) = mixed_batch(&setup);
    let verified = batch.verified_federation(&setup.anchor, &setup.resolver);
    assert_eq!(verified.len(), expected.len());
    assert_eq!(subjects(&verified), expected);
}

#[test]
fn stress_concurrent_batch_matches_sequential() {
    let setup = setup();
    let (batch, expected) = mixed_batch(&setup);

    for max_parallel in [1, 4, 16, 64] {
        let verified =
            batch.verified_federation_concurrent(&setup.anchor, &setup.resolver, max_parallel);
        assert_eq!(
            subjects(&verified),
            expected,
            "max_parallel={max_parallel} should preserve order and membership"
        );
    }

    // Zero is treated as one.
    let verified = batch.verified_federation_concurrent(&setup.anchor, &setup.resolver, 0);
    assert_eq!(verified.len(), expected.len());
}

#[test]
fn stress_external_batch_with_unrelated_keys() {
    let setup = setup();
    let (batch, _) = mixed_batch(&setup);
    let verified = batch.verified_external(&Ed25519Signer::generate().key_set(), None);
    assert!(verified.is_empty());

    let verified = batch.verified_external(&setup.allowed.jwks(), None);
    // The external path has no allow-list, so only signatures decide.
    assert_eq!(
        verified.len(),
        batch
            .iter()
            .filter(|info| info.trust_mark().map(|m| m.issuer == "https://allowed").unwrap_or(false))
            .count()
    );
}
