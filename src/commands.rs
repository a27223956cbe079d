//! CLI command implementations
//!
//! Each command has a `*_core` function returning a [`CommandResult`] and a
//! thin wrapper that prints it.

use crate::config::VerifierConfig;
use crate::crypto::{reconstruct_secret, split_secret, Share, SharingParams};
use crate::protocol::{settle, DryRunLedger, EscrowRef, MilestoneCheckpoint, MilestoneVerifier};
use crate::CommandResult;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

#[derive(Serialize, Deserialize, Debug)]
pub struct SplitOutput {
    pub threshold: u32,
    pub num_shares: u32,
    pub prime: u64,
    pub shares: Vec<Share>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct VerifyOutput {
    pub checkpoint: MilestoneCheckpoint,
    pub decision: String,
    pub quorum: Vec<u32>,
    pub escrow_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow: Option<EscrowRef>,
}

pub fn split(secret: u64, params: SharingParams, seed: Option<u64>) -> Result<()> {
    let cmd_result = split_core(secret, params, seed)?;

    println!("{}", cmd_result.output);
    println!("{}", RULE);
    println!("📋 Hand one share to each witness:");
    println!("{}\n", cmd_result.result);

    Ok(())
}

pub fn split_core(secret: u64, params: SharingParams, seed: Option<u64>) -> Result<CommandResult> {
    let mut out = String::new();

    out.push_str("Secret Split\n\n");
    out.push_str(RULE);
    out.push('\n');

    let mut rng = match seed {
        Some(seed) => ChaCha20Rng::seed_from_u64(seed),
        None => ChaCha20Rng::from_entropy(),
    };
    let shares = split_secret(secret, &params, &mut rng)?;

    out.push_str(&format!(
        "Config: {}-of-{} over GF({})\n",
        params.threshold, params.num_shares, params.prime
    ));
    if let Some(seed) = seed {
        out.push_str(&format!("Seed: {} (reproducible)\n", seed));
    }
    out.push_str("\n🧠 f(x) = secret + c₁x + ... + c_{k-1}x^{k-1} (mod prime)\n");
    out.push_str("   Share i = (i, f(i)); any k shares recover f(0)\n");

    let output = SplitOutput {
        threshold: params.threshold,
        num_shares: params.num_shares,
        prime: params.prime,
        shares,
    };

    Ok(CommandResult {
        output: out,
        result: serde_json::to_string(&output)?,
    })
}

pub fn reconstruct(data: &str, params: SharingParams) -> Result<()> {
    let cmd_result = reconstruct_core(data, params)?;

    println!("{}", cmd_result.output);
    println!("{}", RULE);
    println!("Recovered secret: {}", cmd_result.result);

    Ok(())
}

/// `data` is a JSON array of `{"index", "value"}` shares
pub fn reconstruct_core(data: &str, params: SharingParams) -> Result<CommandResult> {
    let mut out = String::new();

    out.push_str("Secret Reconstruction\n\n");
    out.push_str(RULE);
    out.push('\n');

    let shares: Vec<Share> =
        serde_json::from_str(data.trim()).context("Failed to parse shares JSON")?;

    let indices: Vec<u32> = shares.iter().map(|s| s.index).collect();
    out.push_str(&format!("Shares from indices: {:?}\n", indices));
    out.push_str("🧠 Lagrange interpolation at x = 0\n");

    let secret = reconstruct_secret(&shares, &params)?;

    Ok(CommandResult {
        output: out,
        result: secret.to_string(),
    })
}

/// `data` is a `{"task", "amount", "completion"}` object
pub fn parse_checkpoint(data: &str) -> Result<MilestoneCheckpoint> {
    serde_json::from_str(data.trim()).context("Failed to parse milestone checkpoint JSON")
}

pub fn verify(
    config: VerifierConfig,
    secret: u64,
    checkpoint: MilestoneCheckpoint,
    escrow: Option<EscrowRef>,
) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start witness runtime")?;
    let cmd_result = runtime.block_on(verify_core(config, secret, checkpoint, escrow))?;

    println!("{}", cmd_result.output);
    println!("{}", RULE);
    println!("{}", cmd_result.result);

    Ok(())
}

/// Run the simulated witness quorum against the checkpoint's claimed
/// completion value and report the escrow action.
///
/// Verification failures are reported as a Reject decision; only
/// configuration errors abort the command.
pub async fn verify_core(
    config: VerifierConfig,
    secret: u64,
    checkpoint: MilestoneCheckpoint,
    escrow: Option<EscrowRef>,
) -> Result<CommandResult> {
    let mut out = String::new();

    out.push_str("Milestone Verification\n\n");
    out.push_str(RULE);
    out.push('\n');
    out.push_str(&format!(
        "Config: {}-of-{} witnesses, latency {}..{}ms, timeout {}ms\n",
        config.threshold,
        config.num_shares,
        config.min_delay_ms,
        config.max_delay_ms,
        config.quorum_timeout_ms
    ));
    if !checkpoint.task.is_empty() {
        out.push_str(&format!(
            "Milestone: {} ({})\n",
            checkpoint.task, checkpoint.amount
        ));
    }
    out.push_str(&format!("Claimed completion: {}\n\n", checkpoint.completion));

    let verifier = MilestoneVerifier::new(config)?;

    let (decision, quorum) = match verifier.verify(secret, checkpoint.completion).await {
        Ok(report) => {
            out.push_str(&format!("✓ Quorum formed by witnesses {:?}\n", report.quorum));
            (report.decision, report.quorum)
        }
        Err(e) => {
            out.push_str(&format!("✗ Verification failed: {}\n", e));
            (crate::Decision::Reject, Vec::new())
        }
    };

    let action = decision.escrow_action();
    out.push_str(&format!("Decision: {}\n", decision));

    if let Some(escrow) = &escrow {
        let ledger = DryRunLedger::new();
        settle(&ledger, escrow, decision)?;
        out.push_str(&format!(
            "Dry run: would submit {} for escrow {}#{}\n",
            action, escrow.owner, escrow.offer_sequence
        ));
    }

    let output = VerifyOutput {
        checkpoint,
        decision: decision.to_string(),
        quorum,
        escrow_action: action.to_string(),
        escrow,
    };

    Ok(CommandResult {
        output: out,
        result: serde_json::to_string(&output)?,
    })
}
