//! Witness Quorum Protocol
//!
//! This module implements the milestone attestation flow:
//!
//! - **witness**: Simulated independent verifiers, one per share
//! - **collector**: First-k quorum over the attestation channel
//! - **decision**: Accept/reject against the expected completion value
//! - **verify**: The end-to-end verification call
//! - **escrow**: Seam to the ledger's escrow finish/cancel

pub mod collector;
pub mod decision;
pub mod escrow;
pub mod verify;
pub mod witness;

pub use collector::{AttestationCollector, AttestationSet};
pub use decision::{decide, resolve, Decision};
pub use escrow::{settle, DryRunLedger, EscrowAction, EscrowLedger, EscrowRef, MilestoneCheckpoint};
pub use verify::{MilestoneVerifier, VerificationReport};
pub use witness::{
    AttestationSink, DelaySource, FixedDelays, RandomDelay, WitnessAttestation, WitnessTask,
};
