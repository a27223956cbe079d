//! Accept/reject decision for a milestone

use crate::error::VerificationResult;
use crate::protocol::escrow::EscrowAction;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Reject,
}

impl Decision {
    /// Accept finishes the escrow, Reject cancels it
    pub fn escrow_action(self) -> EscrowAction {
        match self {
            Decision::Accept => EscrowAction::Finish,
            Decision::Reject => EscrowAction::Cancel,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Accept => write!(f, "accept"),
            Decision::Reject => write!(f, "reject"),
        }
    }
}

/// Accept iff the reconstructed value equals the expected completion value.
pub fn decide(reconstructed: u64, expected: u64) -> Decision {
    if reconstructed == expected {
        Decision::Accept
    } else {
        Decision::Reject
    }
}

/// Like [`decide`], but any failed reconstruction resolves to Reject.
pub fn resolve(outcome: &VerificationResult<u64>, expected: u64) -> Decision {
    match outcome {
        Ok(reconstructed) => decide(*reconstructed, expected),
        Err(_) => Decision::Reject,
    }
}
