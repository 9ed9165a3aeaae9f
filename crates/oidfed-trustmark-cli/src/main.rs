//! oidfed-trustmark CLI: `tmark` command.
//!
//! Generates signing keys, publishes entity configurations, issues trust
//! marks and delegations, and verifies trust marks either against known keys
//! or under a trust anchor's policy.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};

use oidfed_trustmark::config::{self, EntityConfig, IssuerConfig, OwnerConfig};
use oidfed_trustmark::jose::{Ed25519KeyPair, Ed25519Signer, KeySet, SignedStatement};
use oidfed_trustmark::time::unix_to_rfc3339;
use oidfed_trustmark::{
    EntityStatement, StaticResolver, TrustAnchor, TrustAnchors, TrustMarkInfo, TrustMarkOwnerSpec,
};

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Parse a duration string like "24h", "7d", "1h30m", or plain seconds.
/// "0" means no expiry.
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    if let Ok(n) = s.parse::<u64>() {
        return Ok(Duration::from_secs(n));
    }

    let mut total_secs: u64 = 0;
    let mut current = String::new();

    for ch in s.chars() {
        if ch.is_ascii_digit() {
            current.push(ch);
        } else {
            let val: u64 = current
                .parse()
                .map_err(|_| anyhow!("invalid duration: {s}"))?;
            current.clear();
            let unit: u64 = match ch {
                'd' => 86_400,
                'h' => 3_600,
                'm' => 60,
                's' => 1,
                _ => bail!("unknown duration unit '{ch}' in '{s}'"),
            };
            total_secs = val
                .checked_mul(unit)
                .and_then(|secs| total_secs.checked_add(secs))
                .ok_or_else(|| anyhow!("duration '{s}' is too large"))?;
        }
    }

    if !current.is_empty() {
        bail!("duration '{s}' is missing a unit (d/h/m/s)");
    }

    Ok(Duration::from_secs(total_secs))
}

fn load_signer(path: &Path) -> Result<Arc<Ed25519Signer>> {
    let key_pair = config::load_key_file(path)
        .with_context(|| format!("failed to load key file {}", path.display()))?;
    Ok(Arc::new(Ed25519Signer::new(key_pair)))
}

fn read_trimmed(path: &Path) -> Result<String> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(text.trim().to_string())
}

/// Read a trust mark from a file holding either a trust mark info (JSON) or
/// a raw trust mark token.
fn read_trust_mark(path: &Path) -> Result<TrustMarkInfo> {
    let text = read_trimmed(path)?;
    if text.starts_with('{') {
        return serde_json::from_str(&text)
            .with_context(|| format!("{} is not a trust mark info", path.display()));
    }
    let mark = oidfed_trustmark::TrustMark::parse(&text)
        .with_context(|| format!("{} is not a trust mark", path.display()))?;
    Ok(TrustMarkInfo::new(mark.trust_mark_type.clone(), text))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ── CLI structure ─────────────────────────────────────────────────────────────

/// tmark: issue and verify federation trust marks.
#[derive(Parser, Debug)]
#[command(
    name = "tmark",
    about = "Federation trust mark CLI",
    version,
    long_about = "tmark: federation trust mark CLI\n\nGenerate keys, publish entity configurations, issue trust marks\nand delegations, and verify trust marks."
)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a signing key file
    Keygen {
        /// Where to write the key file
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the public JWK set of a key file
    Jwks {
        #[arg(long)]
        key: PathBuf,
    },

    /// Sign an entity configuration from an entity config file
    EntityConfig {
        #[arg(long)]
        key: PathBuf,
        /// Entity config (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// Issue a trust mark
    Issue {
        #[arg(long)]
        key: PathBuf,
        /// Issuer config (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Trust mark type
        #[arg(long = "type")]
        trust_mark_type: String,
        /// Subject entity id
        #[arg(long)]
        subject: String,
        /// Lifetime override, e.g. "1h", "30d", "0" for no expiry
        #[arg(long)]
        lifetime: Option<String>,
    },

    /// Issue a delegation for an owned trust mark type
    Delegate {
        #[arg(long)]
        key: PathBuf,
        /// Owner config (JSON)
        #[arg(long)]
        config: PathBuf,
        /// Trust mark type
        #[arg(long = "type")]
        trust_mark_type: String,
        /// Entity id of the delegated issuer
        #[arg(long)]
        issuer: String,
        /// Lifetime override, e.g. "1h", "30d", "0" for no expiry
        #[arg(long)]
        lifetime: Option<String>,
    },

    /// Print the owner descriptor a trust anchor publishes for this owner
    OwnerSpec {
        #[arg(long)]
        key: PathBuf,
        /// Owner config (JSON)
        #[arg(long)]
        config: PathBuf,
    },

    /// Decode a signed statement without verifying it
    Inspect {
        /// File holding the token
        token: PathBuf,
    },

    /// Verify a trust mark against known issuer keys
    Verify {
        /// Trust mark info (JSON) or raw trust mark
        #[arg(long)]
        trust_mark: PathBuf,
        /// Issuer JWK set (JSON)
        #[arg(long)]
        issuer_jwks: PathBuf,
        /// Owner descriptor (JSON), required for owned types
        #[arg(long)]
        owner: Option<PathBuf>,
    },

    /// Verify a trust mark under a trust anchor's policy
    VerifyFederation {
        /// Trust mark info (JSON) or raw trust mark
        #[arg(long)]
        trust_mark: PathBuf,
        /// The trust anchor's entity configuration (raw token)
        #[arg(long)]
        anchor: PathBuf,
        /// Pinned JWK set for the trust anchor; without it the anchor's
        /// configuration is checked against the keys it publishes
        #[arg(long)]
        anchor_jwks: Option<PathBuf>,
        /// Entity configurations available for issuer resolution
        #[arg(long = "entity")]
        entities: Vec<PathBuf>,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let result = match cli.command {
        Commands::Keygen { out } => cmd_keygen(&out, verbose),
        Commands::Jwks { key } => cmd_jwks(&key),
        Commands::EntityConfig { key, config } => cmd_entity_config(&key, &config),
        Commands::Issue {
            key,
            config,
            trust_mark_type,
            subject,
            lifetime,
        } => cmd_issue(&key, &config, &trust_mark_type, &subject, lifetime.as_deref()),
        Commands::Delegate {
            key,
            config,
            trust_mark_type,
            issuer,
            lifetime,
        } => cmd_delegate(&key, &config, &trust_mark_type, &issuer, lifetime.as_deref()),
        Commands::OwnerSpec { key, config } => cmd_owner_spec(&key, &config),
        Commands::Inspect { token } => cmd_inspect(&token),
        Commands::Verify {
            trust_mark,
            issuer_jwks,
            owner,
        } => cmd_verify(&trust_mark, &issuer_jwks, owner.as_deref(), verbose),
        Commands::VerifyFederation {
            trust_mark,
            anchor,
            anchor_jwks,
            entities,
        } => cmd_verify_federation(
            &trust_mark,
            &anchor,
            anchor_jwks.as_deref(),
            &entities,
            verbose,
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `tmark keygen --out FILE`
fn cmd_keygen(out: &Path, verbose: bool) -> Result<()> {
    if out.exists() {
        bail!("key file {} already exists", out.display());
    }
    let key_pair = Ed25519KeyPair::generate();
    config::save_key_file(&key_pair, out).context("failed to save key file")?;

    println!("Created key {}", key_pair.kid());
    println!("  File: {}", out.display());
    if verbose {
        println!("  JWK:  {}", serde_json::to_string(&key_pair.public_jwk())?);
    }
    Ok(())
}

/// `tmark jwks --key FILE`
fn cmd_jwks(key: &Path) -> Result<()> {
    let key_pair = config::load_key_file(key)
        .with_context(|| format!("failed to load key file {}", key.display()))?;
    print_json(&key_pair.key_set())
}

/// `tmark entity-config --key FILE --config FILE`
fn cmd_entity_config(key: &Path, config_path: &Path) -> Result<()> {
    let entity = EntityConfig::from_file(config_path)
        .context("failed to load entity config")?
        .into_entity(load_signer(key)?);
    println!("{}", entity.entity_configuration_jwt()?);
    Ok(())
}

/// `tmark issue --key FILE --config FILE --type TYPE --subject ID`
fn cmd_issue(
    key: &Path,
    config_path: &Path,
    trust_mark_type: &str,
    subject: &str,
    lifetime: Option<&str>,
) -> Result<()> {
    let issuer = IssuerConfig::from_file(config_path)
        .context("failed to load issuer config")?
        .into_issuer(load_signer(key)?);
    let lifetime = lifetime.map(parse_duration).transpose()?;

    let info = issuer
        .issue_trust_mark(trust_mark_type, subject, lifetime)
        .with_context(|| format!("failed to issue {trust_mark_type}"))?;
    print_json(&info)
}

/// `tmark delegate --key FILE --config FILE --type TYPE --issuer ID`
fn cmd_delegate(
    key: &Path,
    config_path: &Path,
    trust_mark_type: &str,
    issuer: &str,
    lifetime: Option<&str>,
) -> Result<()> {
    let owner = OwnerConfig::from_file(config_path)
        .context("failed to load owner config")?
        .into_owner(load_signer(key)?);
    let lifetime = lifetime.map(parse_duration).transpose()?;

    let delegation = owner
        .issue_delegation(trust_mark_type, issuer, lifetime)
        .with_context(|| format!("failed to delegate {trust_mark_type}"))?;
    println!("{delegation}");
    Ok(())
}

/// `tmark owner-spec --key FILE --config FILE`
fn cmd_owner_spec(key: &Path, config_path: &Path) -> Result<()> {
    let owner = OwnerConfig::from_file(config_path)
        .context("failed to load owner config")?
        .into_owner(load_signer(key)?);
    print_json(&owner.owner_spec())
}

/// `tmark inspect FILE`
fn cmd_inspect(token: &Path) -> Result<()> {
    let raw = read_trimmed(token)?;
    let statement = SignedStatement::parse(&raw).context("not a signed statement")?;
    let payload: serde_json::Value = statement.decode_payload()?;

    println!("Header:");
    println!("  alg: {}", statement.header().alg);
    println!("  typ: {}", statement.typ().unwrap_or("-"));
    println!("  kid: {}", statement.header().kid.as_deref().unwrap_or("-"));

    for (claim, label) in [("iat", "Issued"), ("exp", "Expires")] {
        if let Some(ts) = payload.get(claim).and_then(serde_json::Value::as_i64) {
            println!("{label}: {}", unix_to_rfc3339(ts));
        }
    }

    println!("Payload:");
    print_json(&payload)
}

/// `tmark verify --trust-mark FILE --issuer-jwks FILE [--owner FILE]`
fn cmd_verify(
    trust_mark: &Path,
    issuer_jwks: &Path,
    owner: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let info = read_trust_mark(trust_mark)?;
    let keys: KeySet = config::load_json(issuer_jwks).context("failed to load issuer JWK set")?;
    let owner: Option<TrustMarkOwnerSpec> = owner
        .map(|path| config::load_json(path).context("failed to load owner descriptor"))
        .transpose()?;

    let outcome = info.verify_external(&keys, owner.as_ref());
    report(&info, outcome, verbose)
}

/// `tmark verify-federation --trust-mark FILE --anchor FILE [--entity FILE...]`
fn cmd_verify_federation(
    trust_mark: &Path,
    anchor: &Path,
    anchor_jwks: Option<&Path>,
    entities: &[PathBuf],
    verbose: bool,
) -> Result<()> {
    let info = read_trust_mark(trust_mark)?;
    let anchor = EntityStatement::parse(&read_trimmed(anchor)?)
        .context("failed to parse trust anchor entity configuration")?;
    let pinned: KeySet = match anchor_jwks {
        Some(path) => config::load_json(path).context("failed to load trust anchor JWK set")?,
        None => KeySet::default(),
    };
    let anchors = TrustAnchors(vec![TrustAnchor::new(anchor.subject.clone(), pinned)]);
    anchors
        .accept(&anchor)
        .context("trust anchor entity configuration was not accepted")?;

    let mut resolver = StaticResolver::new();
    for path in entities {
        let subject = resolver
            .add_raw_entity_configuration(&read_trimmed(path)?)
            .with_context(|| format!("failed to load entity configuration {}", path.display()))?;
        log::debug!("loaded entity configuration for {subject}");
    }

    let outcome = info.verify_federation(&anchor, &resolver);
    report(&info, outcome, verbose)
}

fn report(
    info: &TrustMarkInfo,
    outcome: oidfed_trustmark::Result<()>,
    verbose: bool,
) -> Result<()> {
    let mark = info.trust_mark()?;
    println!("Trust mark: {}", mark.trust_mark_type);
    println!("  Issuer:  {}", mark.issuer);
    println!("  Subject: {}", mark.subject);
    if verbose {
        println!("  Issued:  {}", unix_to_rfc3339(mark.issued_at));
        if let Some(exp) = mark.expires_at {
            println!("  Expires: {}", unix_to_rfc3339(exp));
        }
        println!(
            "  Delegated: {}",
            if mark.delegation_jwt.is_some() { "yes" } else { "no" }
        );
    }
    println!();

    match outcome {
        Ok(()) => {
            println!("Result: VALID");
            Ok(())
        }
        Err(e) => {
            println!("Result: INVALID");
            Err(anyhow!(e).context("trust mark verification failed"))
        }
    }
}
