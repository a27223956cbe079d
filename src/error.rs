//! Error types for milestone verification

use std::time::Duration;
use thiserror::Error;

/// Errors raised while splitting, collecting or reconstructing a milestone secret.
///
/// Every variant is treated as "do not finish the escrow" by the decision layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// Sharing parameters or secret rejected before any witness is spawned
    #[error("Invalid parameters: {reason}")]
    InvalidParameters { reason: String },

    /// Fewer than `required` distinct witnesses attested before the deadline.
    ///
    /// `timeout` is the configured bound. The collector also returns this
    /// early once every witness has finished, so less time may have passed.
    #[error("Quorum timeout: {received} of {required} attestations within {timeout:?}")]
    QuorumTimeout {
        received: usize,
        required: usize,
        timeout: Duration,
    },

    /// Share set handed to the reconstructor violates its contract
    #[error("Malformed share set: {reason}")]
    ReconstructionError { reason: String },
}

impl VerificationError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::ReconstructionError {
            reason: reason.into(),
        }
    }
}

/// Result type for verification operations
pub type VerificationResult<T> = Result<T, VerificationError>;
