//! Concurrency test: parallel trust mark issuance, verification, and lazy parsing.
//!
//! Validates that shared trust mark infos, issuers, and resolvers are
//! thread-safe and produce consistent results.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use oidfed_trustmark::jose::Ed25519Signer;
use oidfed_trustmark::{
    EntityStatement, FederationEntity, OwnedTrustMark, Signer, StaticResolver, TrustMarkInfo,
    TrustMarkIssuer, TrustMarkOwner, TrustMarkSpec,
};

#[test]
fn stress_100_threads_share_one_lazy_parse() {
    let signer = Arc::new(Ed25519Signer::generate());
    let issuer = TrustMarkIssuer::new(
        "https://issuer1",
        signer.clone(),
        vec![TrustMarkSpec::new("badge-A", 3600)],
    );
    let info = Arc::new(
        issuer
            .issue_trust_mark("badge-A", "https://sub.example", None)
            .expect("issuance should succeed"),
    );
    let keys = Arc::new(signer.key_set());

    let mut handles = Vec::new();
    for _ in 0..100 {
        let info = Arc::clone(&info);
        let keys = Arc::clone(&keys);
        handles.push(thread::spawn(move || {
            for _ in 0..20 {
                info.verify_external(&keys, None)
                    .expect("verification should succeed");
            }
            info.trust_mark().expect("parse should succeed")
        }));
    }

    let marks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(info.parse_count(), 1, "the token must be parsed exactly once");
    assert!(marks.iter().all(|m| Arc::ptr_eq(m, &marks[0])));
}

#[test]
fn stress_50_concurrent_issuers() {
    let issuer = Arc::new(TrustMarkIssuer::new(
        "https://issuer1",
        Arc::new(Ed25519Signer::generate()),
        vec![TrustMarkSpec::new("badge-A", 3600)],
    ));
    let issued = Arc::new(Mutex::new(Vec::new()));

    let mut handles = Vec::new();
    for thread_id in 0..50 {
        let issuer = Arc::clone(&issuer);
        let issued = Arc::clone(&issued);
        handles.push(thread::spawn(move || {
            for i in 0..20 {
                let info = issuer
                    .issue_trust_mark("badge-A", &format!("https://sub{thread_id}-{i}.example"), None)
                    .expect("issuance should succeed");
                issued.lock().unwrap().push(info);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let issued = issued.lock().unwrap();
    assert_eq!(issued.len(), 1_000);
    let keys = issuer.jwks();
    assert!(issued.iter().all(|info| info.verify_external(&keys, None).is_ok()));
}

#[test]
fn stress_concurrent_federation_verification() {
    let owner = TrustMarkOwner::new(
        "https://owner",
        Arc::new(Ed25519Signer::generate()),
        vec![OwnedTrustMark::new("badge-A", 86_400)],
    );

    let mut ta = FederationEntity::new("https://ta", Arc::new(Ed25519Signer::generate()));
    ta.trust_mark_owners
        .insert("badge-A".into(), owner.owner_spec());
    let anchor = Arc::new(EntityStatement::parse(&ta.entity_configuration_jwt().unwrap()).unwrap());

    let issuer_signer = Arc::new(Ed25519Signer::generate());
    let mut spec = TrustMarkSpec::new("badge-A", 3600);
    spec.delegation_jwt = Some(
        owner
            .issue_delegation("badge-A", "https://issuer1", None)
            .unwrap(),
    );
    let issuer = TrustMarkIssuer::new("https://issuer1", issuer_signer.clone(), vec![spec]);

    let mut resolver = StaticResolver::new();
    resolver
        .add_raw_entity_configuration(
            &FederationEntity::new("https://issuer1", issuer_signer)
                .entity_configuration_jwt()
                .unwrap(),
        )
        .unwrap();
    let resolver = Arc::new(resolver);

    let infos: Arc<Vec<TrustMarkInfo>> = Arc::new(
        (0..10)
            .map(|i| {
                issuer
                    .issue_trust_mark("badge-A", &format!("https://sub{i}.example"), None)
                    .unwrap()
            })
            .collect(),
    );

    let valid = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for t in 0..40 {
        let infos = Arc::clone(&infos);
        let anchor = Arc::clone(&anchor);
        let resolver = Arc::clone(&resolver);
        let valid = Arc::clone(&valid);
        handles.push(thread::spawn(move || {
            let info = &infos[t % infos.len()];
            for _ in 0..10 {
                if info.verify_federation(&anchor, resolver.as_ref()).is_ok() {
                    valid.fetch_add(1, Ordering::Relaxed);
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(valid.load(Ordering::Relaxed), 400);
    assert_eq!(resolver.resolve_calls(), 400);
    assert!(infos.iter().all(|info| info.parse_count() == 1));
}
