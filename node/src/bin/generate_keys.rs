//! Key generation for a local federation.
//!
//! Usage: cargo run --bin generate-keys -- --signers 3 --threshold 2 --output configs/local
//!
//! This generates:
//! - signerN.yaml files, one per signer, each carrying that signer's private
//!   key and the shared challenge (full signer set + threshold)
//!
//! The number of signers is independent of the number of nodes: a node may
//! verify a challenge whose signers it does not include.

use anyhow::{bail, Context, Result};
use clap::Parser;
use commonware_codec::Encode;
use commonware_cryptography::{ed25519::PrivateKey, Signer};
use commonware_math::algebra::Random;
use commonware_utils::hex;
use quorate_node::{Config, HexBytes, DEFAULT_LOG_LEVEL, DEFAULT_MEMPOOL_MAX_TRANSACTIONS};
use rand::{rngs::StdRng, SeedableRng};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate-keys")]
#[command(about = "Generate signer keys and configs for a local federation")]
struct Args {
    /// Number of signers in the federation
    #[arg(short, long, default_value_t = 3)]
    signers: u32,

    /// Signatures required to authorize a block
    #[arg(short, long, default_value_t = 2)]
    threshold: u32,

    /// Output directory for configuration files
    #[arg(short, long, default_value = "configs/local")]
    output: PathBuf,

    /// Random seed for key generation (use different seeds for different networks)
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("generate-keys failed: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    let n = args.signers;
    let m = args.threshold;
    if m == 0 || m > n {
        bail!("threshold must be between 1 and {n} (got {m})");
    }

    println!("Generating keys for a {m}-of-{n} federation");
    println!("  Output: {}", args.output.display());
    println!();

    // Use deterministic RNG for reproducibility
    // IMPORTANT: Use different seeds for different environments!
    let mut rng = StdRng::seed_from_u64(args.seed);
    let privates: Vec<PrivateKey> = (0..n).map(|_| PrivateKey::random(&mut rng)).collect();
    let publics: Vec<String> = privates
        .iter()
        .map(|private| hex(&private.public_key().encode()))
        .collect();

    fs::create_dir_all(&args.output).with_context(|| {
        format!(
            "Failed to create output directory {}",
            args.output.display()
        )
    })?;

    for (i, private) in privates.iter().enumerate() {
        let config = Config {
            private_key: HexBytes::from_hex_formatted(&hex(&private.encode()))
                .context("private key must round-trip through hex")?,
            signers: publics.clone(),
            threshold: m,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            mempool_max_transactions: DEFAULT_MEMPOOL_MAX_TRANSACTIONS,
        };

        let rendered = serde_yaml::to_string(&config).context("serialize config")?;
        let config_path = args.output.join(format!("signer{i}.yaml"));
        fs::write(&config_path, rendered)
            .with_context(|| format!("Failed to write config {}", config_path.display()))?;
        println!("Created: {}", config_path.display());
    }

    println!();
    println!("=== Federation ===");
    println!();
    for (i, public) in publics.iter().enumerate() {
        println!("  Signer {}: {}...", i, &public[..16]);
    }
    println!();
    println!("Challenge: {m}/{n} signatures required per block");

    Ok(())
}
