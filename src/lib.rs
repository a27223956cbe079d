//! Threshold-attested milestone verification.
//!
//! A milestone secret is split among simulated witnesses; release of the
//! escrow is authorized only when a quorum of them reconstructs it and it
//! matches the claimed completion value.

pub mod commands;
pub mod config;
pub mod crypto;
pub mod error;
pub mod protocol;

pub use config::VerifierConfig;
pub use error::{VerificationError, VerificationResult};
pub use protocol::{Decision, MilestoneVerifier, VerificationReport};

/// Result from a command, separating explanatory output from copy-paste result
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Human-readable walkthrough of what happened
    pub output: String,
    /// Clean JSON result for copy-pasting
    pub result: String,
}
