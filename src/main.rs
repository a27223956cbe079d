use anyhow::Result;
use clap::{Parser, Subcommand};
use milestone_quorum::commands;
use milestone_quorum::config::VerifierConfig;
use milestone_quorum::crypto::SharingParams;
use milestone_quorum::protocol::{EscrowRef, MilestoneCheckpoint};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "milestone-quorum")]
#[command(about = "Threshold witness attestation for milestone escrow release", long_about = None)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a milestone secret into witness shares
    Split {
        /// Secret value (must be below the prime)
        #[arg(long)]
        secret: u64,

        /// Total number of shares
        #[arg(long, default_value = "3")]
        n_parties: u32,

        /// Shares needed to reconstruct
        #[arg(long, default_value = "2")]
        threshold: u32,

        /// Field modulus
        #[arg(long, default_value_t = milestone_quorum::config::DEFAULT_PRIME)]
        prime: u64,

        /// Seed for reproducible shares
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Reconstruct a secret from exactly threshold shares
    Reconstruct {
        /// JSON array of shares, e.g. [{"index":1,"value":2},{"index":3,"value":10}]
        #[arg(long)]
        data: String,

        /// Total number of shares in the original split
        #[arg(long, default_value = "3")]
        n_parties: u32,

        /// Shares needed to reconstruct
        #[arg(long, default_value = "2")]
        threshold: u32,

        /// Field modulus
        #[arg(long, default_value_t = milestone_quorum::config::DEFAULT_PRIME)]
        prime: u64,
    },

    /// Run the simulated witness quorum for a milestone
    Verify {
        /// Expected milestone completion value (the shared secret)
        #[arg(long)]
        secret: u64,

        /// Claimed completion value to check
        #[arg(long, required_unless_present = "checkpoint", conflicts_with = "checkpoint")]
        current: Option<u64>,

        /// Milestone checkpoint JSON, e.g. {"task":"Well","amount":"1000","completion":15}
        #[arg(long)]
        checkpoint: Option<String>,

        /// JSON config file; flags below override it
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        n_parties: Option<u32>,

        #[arg(long)]
        threshold: Option<u32>,

        #[arg(long)]
        prime: Option<u64>,

        /// Quorum deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        #[arg(long)]
        min_delay_ms: Option<u64>,

        #[arg(long)]
        max_delay_ms: Option<u64>,

        #[arg(long)]
        seed: Option<u64>,

        /// Escrow owner account (dry-run settlement)
        #[arg(long, requires = "offer_sequence")]
        owner: Option<String>,

        /// Escrow create sequence number
        #[arg(long, requires = "owner")]
        offer_sequence: Option<u32>,
    },
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Split {
            secret,
            n_parties,
            threshold,
            prime,
            seed,
        } => {
            commands::split(secret, SharingParams::new(n_parties, threshold, prime), seed)?;
        }
        Commands::Reconstruct {
            data,
            n_parties,
            threshold,
            prime,
        } => {
            commands::reconstruct(&data, SharingParams::new(n_parties, threshold, prime))?;
        }
        Commands::Verify {
            secret,
            current,
            checkpoint,
            config,
            n_parties,
            threshold,
            prime,
            timeout_ms,
            min_delay_ms,
            max_delay_ms,
            seed,
            owner,
            offer_sequence,
        } => {
            let mut cfg = match config {
                Some(path) => VerifierConfig::from_json_file(path)?,
                None => VerifierConfig::default(),
            };
            if let Some(n) = n_parties {
                cfg.num_shares = n;
            }
            if let Some(k) = threshold {
                cfg.threshold = k;
            }
            if let Some(p) = prime {
                cfg.prime = p;
            }
            if let Some(ms) = timeout_ms {
                cfg.quorum_timeout_ms = ms;
            }
            if let Some(ms) = min_delay_ms {
                cfg.min_delay_ms = ms;
            }
            if let Some(ms) = max_delay_ms {
                cfg.max_delay_ms = ms;
            }
            if seed.is_some() {
                cfg.rng_seed = seed;
            }

            let escrow = match (owner, offer_sequence) {
                (Some(owner), Some(offer_sequence)) => Some(EscrowRef {
                    owner,
                    offer_sequence,
                }),
                _ => None,
            };

            let checkpoint = match (checkpoint, current) {
                (Some(json), _) => commands::parse_checkpoint(&json)?,
                (None, Some(completion)) => MilestoneCheckpoint {
                    task: String::new(),
                    amount: String::new(),
                    completion,
                },
                (None, None) => anyhow::bail!("Either --current or --checkpoint is required"),
            };

            commands::verify(cfg, secret, checkpoint, escrow)?;
        }
    }

    Ok(())
}
