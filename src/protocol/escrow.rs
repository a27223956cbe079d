//! Escrow ledger seam
//!
//! Transaction construction and submission live with the ledger client.
//! This module only names the calls a decision maps onto.

use crate::protocol::decision::Decision;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// A milestone as submitted for verification
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MilestoneCheckpoint {
    pub task: String,
    pub amount: String,
    /// Claimed completion value checked against the quorum
    pub completion: u64,
}

/// Identifies an escrow on the ledger
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EscrowRef {
    /// Account that created the escrow
    pub owner: String,
    /// Sequence number of the escrow-create transaction
    pub offer_sequence: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EscrowAction {
    Finish,
    Cancel,
}

impl fmt::Display for EscrowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscrowAction::Finish => write!(f, "EscrowFinish"),
            EscrowAction::Cancel => write!(f, "EscrowCancel"),
        }
    }
}

/// Ledger client operations gated by a decision
pub trait EscrowLedger {
    fn finish_escrow(&self, escrow: &EscrowRef) -> Result<()>;
    fn cancel_escrow(&self, escrow: &EscrowRef) -> Result<()>;
}

/// Submit exactly one of finish/cancel for `decision`.
pub fn settle(
    ledger: &dyn EscrowLedger,
    escrow: &EscrowRef,
    decision: Decision,
) -> Result<EscrowAction> {
    let action = decision.escrow_action();
    match action {
        EscrowAction::Finish => ledger.finish_escrow(escrow)?,
        EscrowAction::Cancel => ledger.cancel_escrow(escrow)?,
    }
    tracing::info!(
        owner = %escrow.owner,
        offer_sequence = escrow.offer_sequence,
        %action,
        "Escrow settled"
    );
    Ok(action)
}

/// Records requested actions instead of submitting them
#[derive(Debug, Default)]
pub struct DryRunLedger {
    submitted: Mutex<Vec<(EscrowAction, EscrowRef)>>,
}

impl DryRunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submitted(&self) -> Vec<(EscrowAction, EscrowRef)> {
        self.submitted
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    fn record(&self, action: EscrowAction, escrow: &EscrowRef) -> Result<()> {
        let mut submitted = self
            .submitted
            .lock()
            .map_err(|_| anyhow::anyhow!("Dry-run ledger lock poisoned"))?;
        submitted.push((action, escrow.clone()));
        Ok(())
    }
}

impl EscrowLedger for DryRunLedger {
    fn finish_escrow(&self, escrow: &EscrowRef) -> Result<()> {
        self.record(EscrowAction::Finish, escrow)
    }

    fn cancel_escrow(&self, escrow: &EscrowRef) -> Result<()> {
        self.record(EscrowAction::Cancel, escrow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escrow() -> EscrowRef {
        EscrowRef {
            owner: "rEXAMPLEowner".to_string(),
            offer_sequence: 7,
        }
    }

    #[test]
    fn test_settle_accept_finishes() {
        let ledger = DryRunLedger::new();
        let action = settle(&ledger, &escrow(), Decision::Accept).unwrap();

        assert_eq!(action, EscrowAction::Finish);
        assert_eq!(ledger.submitted(), vec![(EscrowAction::Finish, escrow())]);
    }

    #[test]
    fn test_settle_reject_cancels() {
        let ledger = DryRunLedger::new();
        let action = settle(&ledger, &escrow(), Decision::Reject).unwrap();

        assert_eq!(action, EscrowAction::Cancel);
        assert_eq!(ledger.submitted(), vec![(EscrowAction::Cancel, escrow())]);
    }

    #[test]
    fn test_ledger_failure_propagates() {
        struct DownLedger;
        impl EscrowLedger for DownLedger {
            fn finish_escrow(&self, _: &EscrowRef) -> Result<()> {
                anyhow::bail!("ledger unreachable")
            }
            fn cancel_escrow(&self, _: &EscrowRef) -> Result<()> {
                anyhow::bail!("ledger unreachable")
            }
        }

        assert!(settle(&DownLedger, &escrow(), Decision::Accept).is_err());
    }
}
