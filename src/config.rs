//! Verifier configuration

use crate::crypto::SharingParams;
use crate::error::{VerificationError, VerificationResult};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Mersenne prime 2^61 - 1
pub const DEFAULT_PRIME: u64 = (1 << 61) - 1;

/// Parameters for one milestone verification.
///
/// Defaults are a 2-of-3 quorum with witnesses answering in 0.1s..3s.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct VerifierConfig {
    pub num_shares: u32,
    pub threshold: u32,
    pub prime: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub quorum_timeout_ms: u64,
    /// Fixed seed for share generation; fresh entropy when unset
    pub rng_seed: Option<u64>,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            num_shares: 3,
            threshold: 2,
            prime: DEFAULT_PRIME,
            min_delay_ms: 100,
            max_delay_ms: 3_000,
            quorum_timeout_ms: 10_000,
            rng_seed: None,
        }
    }
}

impl VerifierConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn sharing_params(&self) -> SharingParams {
        SharingParams::new(self.num_shares, self.threshold, self.prime)
    }

    pub fn min_delay(&self) -> Duration {
        Duration::from_millis(self.min_delay_ms)
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    pub fn quorum_timeout(&self) -> Duration {
        Duration::from_millis(self.quorum_timeout_ms)
    }

    pub fn validate(&self) -> VerificationResult<()> {
        self.sharing_params().field()?;
        if self.min_delay_ms > self.max_delay_ms {
            return Err(VerificationError::invalid(format!(
                "min delay {}ms exceeds max delay {}ms",
                self.min_delay_ms, self.max_delay_ms
            )));
        }
        if self.quorum_timeout_ms == 0 {
            return Err(VerificationError::invalid("quorum timeout must be non-zero"));
        }
        Ok(())
    }
}
