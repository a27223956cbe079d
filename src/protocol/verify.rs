//! Milestone verification flow
//!
//! split → one witness per share → first-k quorum → reconstruct → decide.
//! Every call builds its own shares and collector and drops them before
//! returning; the report carries node ids only.

use crate::config::VerifierConfig;
use crate::crypto::{reconstruct_secret, split_secret};
use crate::error::VerificationResult;
use crate::protocol::collector::AttestationCollector;
use crate::protocol::decision::{decide, Decision};
use crate::protocol::witness::{DelaySource, RandomDelay};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one verification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    pub decision: Decision,
    /// Node ids whose shares formed the quorum
    pub quorum: Vec<u32>,
    pub threshold: u32,
    pub num_shares: u32,
}

pub struct MilestoneVerifier {
    config: VerifierConfig,
    delays: Arc<dyn DelaySource>,
}

impl MilestoneVerifier {
    /// Verifier with uniformly random witness latency from `config`
    pub fn new(config: VerifierConfig) -> VerificationResult<Self> {
        config.validate()?;
        let delays = Arc::new(RandomDelay::new(config.min_delay(), config.max_delay()));
        Ok(Self { config, delays })
    }

    /// Verifier with injected witness latency
    pub fn with_delays(
        config: VerifierConfig,
        delays: Arc<dyn DelaySource>,
    ) -> VerificationResult<Self> {
        config.validate()?;
        Ok(Self { config, delays })
    }

    /// Split `milestone_secret` among witnesses and check that the quorum's
    /// reconstruction equals `current`.
    ///
    /// Parameter errors fail before any witness is spawned.
    pub async fn verify(
        &self,
        milestone_secret: u64,
        current: u64,
    ) -> VerificationResult<VerificationReport> {
        let params = self.config.sharing_params();

        let mut rng = match self.config.rng_seed {
            Some(seed) => ChaCha20Rng::seed_from_u64(seed),
            None => ChaCha20Rng::from_entropy(),
        };
        let shares = split_secret(milestone_secret, &params, &mut rng)?;

        let mut collector =
            AttestationCollector::new(params.threshold, self.config.quorum_timeout())?;
        collector.dispatch_all(&shares, self.delays.as_ref());
        drop(shares);

        let quorum = collector.collect().await?;
        let reconstructed = reconstruct_secret(&quorum.shares(), &params)?;
        let decision = decide(reconstructed, current);

        info!(
            %decision,
            quorum = ?quorum.node_ids(),
            threshold = params.threshold,
            num_shares = params.num_shares,
            "Milestone verified"
        );

        Ok(VerificationReport {
            decision,
            quorum: quorum.node_ids(),
            threshold: params.threshold,
            num_shares: params.num_shares,
        })
    }

    /// [`verify`](Self::verify), with every failure resolved to Reject.
    pub async fn authorize(&self, milestone_secret: u64, current: u64) -> Decision {
        match self.verify(milestone_secret, current).await {
            Ok(report) => report.decision,
            Err(e) => {
                warn!(error = %e, "Verification failed; rejecting");
                Decision::Reject
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerificationError;
    use crate::protocol::witness::FixedDelays;

    fn config_17() -> VerifierConfig {
        VerifierConfig {
            num_shares: 3,
            threshold: 2,
            prime: 17,
            rng_seed: Some(11),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_accepts_matching_completion() {
        let verifier = MilestoneVerifier::new(config_17()).unwrap();
        let report = verifier.verify(15, 15).await.unwrap();

        assert_eq!(report.decision, Decision::Accept);
        assert_eq!(report.quorum.len(), 2);
        assert_eq!(report.threshold, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejects_mismatched_completion() {
        let verifier = MilestoneVerifier::new(config_17()).unwrap();
        let report = verifier.verify(15, 14).await.unwrap();
        assert_eq!(report.decision, Decision::Reject);
    }

    #[tokio::test(start_paused = true)]
    async fn test_quorum_follows_injected_delays() {
        let delays = Arc::new(FixedDelays::from_millis(&[300, 100, 200]));
        let verifier = MilestoneVerifier::with_delays(config_17(), delays).unwrap();

        let report = verifier.verify(15, 15).await.unwrap();
        assert_eq!(report.quorum, vec![2, 3]);
        assert_eq!(report.decision, Decision::Accept);
    }

    #[tokio::test]
    async fn test_secret_outside_field_fails_fast() {
        let verifier = MilestoneVerifier::new(config_17()).unwrap();
        let err = verifier.verify(17, 17).await.unwrap_err();
        assert!(matches!(err, VerificationError::InvalidParameters { .. }));
        assert_eq!(verifier.authorize(17, 17).await, Decision::Reject);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = VerifierConfig {
            prime: 16,
            ..config_17()
        };
        assert!(MilestoneVerifier::new(config).is_err());
    }
}
