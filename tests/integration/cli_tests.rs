//! Integration tests for the CLI binary.
//!
//! Registered as a [[test]] in the oidfed-trustmark-cli crate so that
//! CARGO_BIN_EXE_tmark is available.

use std::path::Path;
use std::process::{Command, Output};

fn tmark_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_tmark"))
}

fn run(args: &[&str]) -> Output {
    tmark_binary()
        .args(args)
        .output()
        .expect("failed to execute tmark")
}

fn run_ok(args: &[&str]) -> String {
    let output = run(args);
    assert!(
        output.status.success(),
        "tmark {args:?} failed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths are utf-8")
}

#[test]
fn cli_responds_to_help() {
    let stdout = run_ok(&["--help"]);
    assert!(
        stdout.contains("tmark") || stdout.contains("Usage"),
        "tmark --help output should contain usage information, got: {stdout}"
    );
    assert!(stdout.contains("verify-federation"));
}

#[test]
fn cli_responds_to_version() {
    let stdout = run_ok(&["--version"]);
    assert!(
        stdout.contains("0.3") || stdout.contains("tmark"),
        "tmark --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = run(&["--nonexistent-flag"]);
    assert!(
        !output.status.success(),
        "tmark with unknown flag should exit with non-zero status"
    );
}

#[test]
fn cli_keygen_refuses_to_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("key.json");
    run_ok(&["keygen", "--out", path_str(&key)]);
    let output = run(&["keygen", "--out", path_str(&key)]);
    assert!(!output.status.success());
}

#[test]
fn cli_issue_and_verify_external() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("issuer-key.json");
    let config = dir.path().join("issuer.json");
    let jwks = dir.path().join("jwks.json");
    let mark = dir.path().join("mark.json");

    run_ok(&["keygen", "--out", path_str(&key)]);
    std::fs::write(
        &config,
        r#"{"entity_id": "https://issuer1", "trust_marks": [{"trust_mark_type": "badge-A", "lifetime": 3600}]}"#,
    )
    .unwrap();

    std::fs::write(&jwks, run_ok(&["jwks", "--key", path_str(&key)])).unwrap();
    let info = run_ok(&[
        "issue",
        "--key",
        path_str(&key),
        "--config",
        path_str(&config),
        "--type",
        "badge-A",
        "--subject",
        "https://sub.example",
    ]);
    let value: serde_json::Value = serde_json::from_str(&info).unwrap();
    assert_eq!(value["trust_mark_type"], "badge-A");
    std::fs::write(&mark, info).unwrap();

    let stdout = run_ok(&[
        "verify",
        "--trust-mark",
        path_str(&mark),
        "--issuer-jwks",
        path_str(&jwks),
    ]);
    assert!(stdout.contains("Result: VALID"), "got: {stdout}");

    let raw = value["trust_mark"].as_str().unwrap().to_string();
    let raw_path = dir.path().join("mark.jwt");
    std::fs::write(&raw_path, raw).unwrap();
    let stdout = run_ok(&["inspect", path_str(&raw_path)]);
    assert!(stdout.contains("trust-mark+jwt"));
    assert!(stdout.contains("https://sub.example"));
}

#[test]
fn cli_issue_rejects_oversized_lifetime() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("issuer-key.json");
    let config = dir.path().join("issuer.json");
    run_ok(&["keygen", "--out", path_str(&key)]);
    std::fs::write(
        &config,
        r#"{"entity_id": "https://issuer1", "trust_marks": [{"trust_mark_type": "badge-A", "lifetime": 3600}]}"#,
    )
    .unwrap();

    for lifetime in ["999999999999999999d", "9223372036854775807s"] {
        let output = run(&[
            "issue",
            "--key",
            path_str(&key),
            "--config",
            path_str(&config),
            "--type",
            "badge-A",
            "--subject",
            "https://sub.example",
            "--lifetime",
            lifetime,
        ]);
        assert!(!output.status.success(), "lifetime {lifetime} was accepted");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("error:"), "lifetime {lifetime}, stderr: {stderr}");
        assert!(!stderr.contains("panicked"), "lifetime {lifetime}, stderr: {stderr}");
    }
}

#[test]
fn cli_verify_rejects_wrong_keys() {
    let dir = tempfile::tempdir().unwrap();
    let key = dir.path().join("key.json");
    let other = dir.path().join("other.json");
    let config = dir.path().join("issuer.json");
    let jwks = dir.path().join("jwks.json");
    let mark = dir.path().join("mark.json");

    run_ok(&["keygen", "--out", path_str(&key)]);
    run_ok(&["keygen", "--out", path_str(&other)]);
    std::fs::write(
        &config,
        r#"{"entity_id": "https://issuer1", "trust_marks": [{"trust_mark_type": "badge-A"}]}"#,
    )
    .unwrap();
    std::fs::write(&jwks, run_ok(&["jwks", "--key", path_str(&other)])).unwrap();
    let info = run_ok(&[
        "issue",
        "--key",
        path_str(&key),
        "--config",
        path_str(&config),
        "--type",
        "badge-A",
        "--subject",
        "https://sub.example",
    ]);
    std::fs::write(&mark, info).unwrap();

    let output = run(&[
        "verify",
        "--trust-mark",
        path_str(&mark),
        "--issuer-jwks",
        path_str(&jwks),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("Result: INVALID"));
}

#[test]
fn cli_delegated_mark_verifies_under_anchor() {
    let dir = tempfile::tempdir().unwrap();
    let p = |name: &str| dir.path().join(name);

    for name in ["ta-key.json", "owner-key.json", "issuer-key.json"] {
        run_ok(&["keygen", "--out", path_str(&p(name))]);
    }

    std::fs::write(
        p("owner.json"),
        r#"{"entity_id": "https://owner", "owned_trust_marks": [{"trust_mark_type": "badge-A", "delegation_lifetime": 86400}]}"#,
    )
    .unwrap();
    let owner_spec: serde_json::Value = serde_json::from_str(&run_ok(&[
        "owner-spec",
        "--key",
        path_str(&p("owner-key.json")),
        "--config",
        path_str(&p("owner.json")),
    ]))
    .unwrap();
    let delegation = run_ok(&[
        "delegate",
        "--key",
        path_str(&p("owner-key.json")),
        "--config",
        path_str(&p("owner.json")),
        "--type",
        "badge-A",
        "--issuer",
        "https://issuer1",
    ]);

    let ta_config = serde_json::json!({
        "entity_id": "https://ta",
        "trust_mark_issuers": {"badge-A": ["https://issuer1"]},
        "trust_mark_owners": {"badge-A": owner_spec},
    });
    std::fs::write(p("ta.json"), ta_config.to_string()).unwrap();
    let anchor = run_ok(&[
        "entity-config",
        "--key",
        path_str(&p("ta-key.json")),
        "--config",
        path_str(&p("ta.json")),
    ]);
    std::fs::write(p("ta.jwt"), anchor).unwrap();

    std::fs::write(p("issuer-entity.json"), r#"{"entity_id": "https://issuer1"}"#).unwrap();
    let issuer_ec = run_ok(&[
        "entity-config",
        "--key",
        path_str(&p("issuer-key.json")),
        "--config",
        path_str(&p("issuer-entity.json")),
    ]);
    std::fs::write(p("issuer.jwt"), issuer_ec).unwrap();

    let issuer_config = serde_json::json!({
        "entity_id": "https://issuer1",
        "trust_marks": [{
            "trust_mark_type": "badge-A",
            "lifetime": 3600,
            "delegation_jwt": delegation.trim(),
        }],
    });
    std::fs::write(p("issuer.json"), issuer_config.to_string()).unwrap();
    let info = run_ok(&[
        "issue",
        "--key",
        path_str(&p("issuer-key.json")),
        "--config",
        path_str(&p("issuer.json")),
        "--type",
        "badge-A",
        "--subject",
        "https://sub.example",
    ]);
    std::fs::write(p("mark.json"), info).unwrap();

    let stdout = run_ok(&[
        "verify-federation",
        "--trust-mark",
        path_str(&p("mark.json")),
        "--anchor",
        path_str(&p("ta.jwt")),
        "--entity",
        path_str(&p("issuer.jwt")),
    ]);
    assert!(stdout.contains("Result: VALID"), "got: {stdout}");

    // Pinning the anchor's keys: its own keys pass, another key set does not.
    std::fs::write(p("ta-jwks.json"), run_ok(&["jwks", "--key", path_str(&p("ta-key.json"))]))
        .unwrap();
    std::fs::write(
        p("other-jwks.json"),
        run_ok(&["jwks", "--key", path_str(&p("owner-key.json"))]),
    )
    .unwrap();
    let stdout = run_ok(&[
        "verify-federation",
        "--trust-mark",
        path_str(&p("mark.json")),
        "--anchor",
        path_str(&p("ta.jwt")),
        "--anchor-jwks",
        path_str(&p("ta-jwks.json")),
        "--entity",
        path_str(&p("issuer.jwt")),
    ]);
    assert!(stdout.contains("Result: VALID"), "got: {stdout}");
    let output = run(&[
        "verify-federation",
        "--trust-mark",
        path_str(&p("mark.json")),
        "--anchor",
        path_str(&p("ta.jwt")),
        "--anchor-jwks",
        path_str(&p("other-jwks.json")),
        "--entity",
        path_str(&p("issuer.jwt")),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not accepted"));

    // Without the issuer's entity configuration its keys cannot be resolved.
    let output = run(&[
        "verify-federation",
        "--trust-mark",
        path_str(&p("mark.json")),
        "--anchor",
        path_str(&p("ta.jwt")),
    ]);
    assert!(!output.status.success());
}
