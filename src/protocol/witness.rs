//! Simulated independent witnesses
//!
//! Each witness holds one share, waits out a simulated verification
//! latency, then publishes exactly one attestation into the collector's
//! sink. Latency comes from a [`DelaySource`] so tests can fix arrival
//! order; sleeping uses tokio time, which tests may pause.

use crate::crypto::Share;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// One witness vouching for its share
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessAttestation {
    pub node_id: u32,
    pub share: Share,
    /// Unix milliseconds, audit only
    pub timestamp_ms: u64,
}

impl WitnessAttestation {
    /// Stamp an attestation with the current wall-clock time
    pub fn now(node_id: u32, share: Share) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            node_id,
            share,
            timestamp_ms,
        }
    }
}

/// Source of simulated verification latency per witness
pub trait DelaySource: Send + Sync {
    fn delay_for(&self, node_id: u32) -> Duration;
}

/// Uniformly random latency in `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct RandomDelay {
    min: Duration,
    max: Duration,
}

impl RandomDelay {
    /// `min` and `max` are swapped if given in the wrong order
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }
}

impl DelaySource for RandomDelay {
    fn delay_for(&self, _node_id: u32) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        let millis = rand::thread_rng().gen_range(self.min.as_millis()..=self.max.as_millis());
        Duration::from_millis(millis as u64)
    }
}

/// Fixed per-node latency, for reproducible arrival order
#[derive(Debug, Clone, Default)]
pub struct FixedDelays {
    delays: BTreeMap<u32, Duration>,
    fallback: Duration,
}

impl FixedDelays {
    /// Node `i + 1` gets `delays[i]`; unlisted nodes attest immediately
    pub fn new(delays: impl IntoIterator<Item = Duration>) -> Self {
        let delays = delays
            .into_iter()
            .enumerate()
            .map(|(i, d)| (i as u32 + 1, d))
            .collect();
        Self {
            delays,
            fallback: Duration::ZERO,
        }
    }

    pub fn from_millis(delays: &[u64]) -> Self {
        Self::new(delays.iter().map(|&ms| Duration::from_millis(ms)))
    }

    pub fn with_fallback(mut self, fallback: Duration) -> Self {
        self.fallback = fallback;
        self
    }
}

impl DelaySource for FixedDelays {
    fn delay_for(&self, node_id: u32) -> Duration {
        self.delays.get(&node_id).copied().unwrap_or(self.fallback)
    }
}

/// Producer handle onto the collector's channel
#[derive(Debug, Clone)]
pub struct AttestationSink {
    tx: mpsc::Sender<WitnessAttestation>,
}

impl AttestationSink {
    pub(crate) fn new(tx: mpsc::Sender<WitnessAttestation>) -> Self {
        Self { tx }
    }

    /// Publish an attestation. Returns `false` once the collector has
    /// stopped listening; the attestation is then discarded.
    pub async fn publish(&self, attestation: WitnessAttestation) -> bool {
        self.tx.send(attestation).await.is_ok()
    }
}

/// One simulated verifier holding one share
#[derive(Debug, Clone)]
pub struct WitnessTask {
    node_id: u32,
    share: Share,
    delay: Duration,
}

impl WitnessTask {
    pub fn new(node_id: u32, share: Share, delay: Duration) -> Self {
        Self {
            node_id,
            share,
            delay,
        }
    }

    pub fn node_id(&self) -> u32 {
        self.node_id
    }

    /// Wait out the simulated latency, then attest once.
    pub async fn run(self, sink: AttestationSink) {
        tokio::time::sleep(self.delay).await;

        let attestation = WitnessAttestation::now(self.node_id, self.share);
        let timestamp_ms = attestation.timestamp_ms;

        if sink.publish(attestation).await {
            info!(
                node_id = self.node_id,
                share_index = self.share.index,
                timestamp_ms,
                delay_ms = self.delay.as_millis() as u64,
                "Witness attested"
            );
        } else {
            debug!(
                node_id = self.node_id,
                "Collector closed before attestation; discarded"
            );
        }
    }
}
