//! Trust Mark Delegation: an owner delegates, an issuer issues, an anchor verifies.
//!
//! Run with:
//!   cargo run --example trust_mark_delegation -p oidfed-trustmark

use std::sync::Arc;

use oidfed_trustmark::jose::Ed25519Signer;
use oidfed_trustmark::{
    EntityStatement, FederationEntity, OwnedTrustMark, StaticResolver, TrustMarkIssuer,
    TrustMarkOwner, TrustMarkSpec,
};

fn main() {
    // ── Setup: owner, issuer, trust anchor ──────────────────────────────────
    let owner = TrustMarkOwner::new(
        "https://owner.example",
        Arc::new(Ed25519Signer::generate()),
        vec![OwnedTrustMark::new("https://marks.example/certified", 86_400)],
    );
    let issuer_signer = Arc::new(Ed25519Signer::generate());
    let issuer_entity = FederationEntity::new("https://issuer.example", issuer_signer.clone());

    let mut ta = FederationEntity::new("https://ta.example", Arc::new(Ed25519Signer::generate()));
    ta.trust_mark_issuers.insert(
        "https://marks.example/certified".into(),
        vec!["https://issuer.example".into()],
    );
    ta.trust_mark_owners.insert(
        "https://marks.example/certified".into(),
        owner.owner_spec(),
    );
    let anchor = EntityStatement::parse(
        &ta.entity_configuration_jwt()
            .expect("anchor configuration signing should succeed"),
    )
    .expect("anchor configuration should parse");

    println!("Entities:");
    println!("  Trust anchor: {}", anchor.subject);
    println!("  Owner:        {}", owner.entity_id);
    println!("  Issuer:       {}", issuer_entity.entity_id);
    println!();

    // ── 1. The owner delegates issuance ─────────────────────────────────────
    let delegation = owner
        .issue_delegation("https://marks.example/certified", "https://issuer.example", None)
        .expect("delegation signing should succeed");
    println!("Delegation: owner -> issuer");
    println!("  Token: {}...", &delegation[..48.min(delegation.len())]);
    println!();

    // ── 2. The issuer embeds it and issues a trust mark ─────────────────────
    let mut spec = TrustMarkSpec::new("https://marks.example/certified", 3600);
    spec.delegation_jwt = Some(delegation);
    let issuer = TrustMarkIssuer::new("https://issuer.example", issuer_signer, vec![spec]);
    let info = issuer
        .issue_trust_mark("https://marks.example/certified", "https://rp.example", None)
        .expect("trust mark issuance should succeed");
    let mark = info.trust_mark().expect("issued trust mark should parse");
    println!("Trust mark: {}", mark.trust_mark_type);
    println!("  Subject: {}", mark.subject);
    println!("  Expires: {:?}", mark.expires_at);
    println!();

    // ── 3. Verify under the trust anchor ────────────────────────────────────
    //
    // The resolver supplies the issuer's entity configuration, from which
    // the issuer's keys are taken.
    let mut resolver = StaticResolver::new();
    resolver
        .add_raw_entity_configuration(
            &issuer_entity
                .entity_configuration_jwt()
                .expect("issuer configuration signing should succeed"),
        )
        .expect("issuer configuration should parse");

    match info.verify_federation(&anchor, &resolver) {
        Ok(()) => println!("Federation verification: VALID"),
        Err(e) => println!("Federation verification: INVALID ({e})"),
    }

    // ── 4. A mark signed with an unknown key is rejected ────────────────────
    let rogue = TrustMarkIssuer::new(
        "https://issuer.example",
        Arc::new(Ed25519Signer::generate()),
        vec![TrustMarkSpec::new("https://marks.example/certified", 3600)],
    );
    let forged = rogue
        .issue_trust_mark("https://marks.example/certified", "https://rp.example", None)
        .expect("trust mark issuance should succeed");
    match forged.verify_federation(&anchor, &resolver) {
        Ok(()) => println!("Rogue mark:              VALID (unexpected)"),
        Err(e) => println!("Rogue mark:              INVALID ({e})"),
    }
}
