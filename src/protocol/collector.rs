//! Quorum collection
//!
//! The collector owns the attestation channel, the witness tasks, and the
//! quorum being built. It is consumed by [`AttestationCollector::collect`],
//! so nothing outlives a single verification.

use crate::crypto::Share;
use crate::error::{VerificationError, VerificationResult};
use crate::protocol::witness::{AttestationSink, DelaySource, WitnessAttestation, WitnessTask};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn};

/// Channel capacity; witnesses wait on a full buffer rather than drop.
const SINK_CAPACITY: usize = 100;

/// Distinct attestations keyed by node id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttestationSet {
    attestations: BTreeMap<u32, WitnessAttestation>,
}

impl AttestationSet {
    /// Record an attestation; returns `false` for an already-seen node.
    fn record(&mut self, attestation: WitnessAttestation) -> bool {
        if self.attestations.contains_key(&attestation.node_id) {
            return false;
        }
        self.attestations.insert(attestation.node_id, attestation);
        true
    }

    pub fn len(&self) -> usize {
        self.attestations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attestations.is_empty()
    }

    pub fn contains(&self, node_id: u32) -> bool {
        self.attestations.contains_key(&node_id)
    }

    /// Node ids in ascending order
    pub fn node_ids(&self) -> Vec<u32> {
        self.attestations.keys().copied().collect()
    }

    pub fn shares(&self) -> Vec<Share> {
        self.attestations.values().map(|a| a.share).collect()
    }
}

/// Waits for the first `threshold` distinct witnesses to attest.
pub struct AttestationCollector {
    threshold: usize,
    quorum_timeout: Duration,
    tx: mpsc::Sender<WitnessAttestation>,
    rx: mpsc::Receiver<WitnessAttestation>,
    witnesses: JoinSet<()>,
}

impl AttestationCollector {
    /// A zero threshold is rejected; an empty quorum proves nothing.
    pub fn new(threshold: u32, quorum_timeout: Duration) -> VerificationResult<Self> {
        if threshold == 0 {
            return Err(VerificationError::invalid("quorum threshold must be at least 1"));
        }
        let (tx, rx) = mpsc::channel(SINK_CAPACITY);
        Ok(Self {
            threshold: threshold as usize,
            quorum_timeout,
            tx,
            rx,
            witnesses: JoinSet::new(),
        })
    }

    /// Producer handle for attestations scheduled outside the collector
    pub fn sink(&self) -> AttestationSink {
        AttestationSink::new(self.tx.clone())
    }

    /// Spawn one witness task
    pub fn dispatch(&mut self, task: WitnessTask) {
        debug!(node_id = task.node_id(), "Dispatching witness");
        let sink = self.sink();
        self.witnesses.spawn(task.run(sink));
    }

    /// Spawn one witness per share; node ids follow share order starting at 1.
    pub fn dispatch_all(&mut self, shares: &[Share], delays: &dyn DelaySource) {
        for (i, share) in shares.iter().enumerate() {
            let node_id = i as u32 + 1;
            self.dispatch(WitnessTask::new(node_id, *share, delays.delay_for(node_id)));
        }
    }

    /// Number of witness tasks not yet joined
    pub fn pending(&self) -> usize {
        self.witnesses.len()
    }

    /// Block until `threshold` distinct node ids have attested, or fail with
    /// `QuorumTimeout` once the deadline passes or every producer is gone.
    ///
    /// After quorum the channel is closed and remaining witnesses are joined
    /// within the same deadline; any still running past it are aborted.
    pub async fn collect(self) -> VerificationResult<AttestationSet> {
        let Self {
            threshold,
            quorum_timeout,
            tx,
            mut rx,
            mut witnesses,
        } = self;

        // Only witnesses and external sinks keep the channel open now
        drop(tx);

        let start = Instant::now();
        let deadline = start + quorum_timeout;
        let mut quorum = AttestationSet::default();

        let reached = timeout_at(deadline, async {
            while quorum.len() < threshold {
                let Some(attestation) = rx.recv().await else {
                    return false;
                };
                let node_id = attestation.node_id;
                if quorum.record(attestation) {
                    debug!(
                        node_id,
                        received = quorum.len(),
                        required = threshold,
                        "Attestation recorded"
                    );
                } else {
                    debug!(node_id, "Duplicate attestation discarded");
                }
            }
            true
        })
        .await
        .unwrap_or(false);

        if !reached {
            let elapsed = start.elapsed();
            if elapsed < quorum_timeout {
                warn!(
                    received = quorum.len(),
                    required = threshold,
                    ?elapsed,
                    "Every witness finished before quorum"
                );
            } else {
                warn!(
                    received = quorum.len(),
                    required = threshold,
                    outstanding = witnesses.len(),
                    ?elapsed,
                    "Quorum deadline passed; aborting witnesses"
                );
            }
            witnesses.abort_all();
            return Err(VerificationError::QuorumTimeout {
                received: quorum.len(),
                required: threshold,
                timeout: quorum_timeout,
            });
        }

        info!(quorum = ?quorum.node_ids(), "Quorum reached");

        // Late attestations are discarded by the closed channel
        rx.close();
        drain(&mut witnesses, deadline).await;

        Ok(quorum)
    }
}

/// Join every witness before `deadline`, aborting stragglers.
async fn drain(witnesses: &mut JoinSet<()>, deadline: Instant) {
    let joined = timeout_at(deadline, async {
        while let Some(result) = witnesses.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "Witness task failed; counted as missing");
            }
        }
    })
    .await;

    if joined.is_err() {
        warn!(
            outstanding = witnesses.len(),
            "Witnesses still running at deadline; aborting"
        );
        witnesses.abort_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::witness::FixedDelays;

    fn attestation(node_id: u32) -> WitnessAttestation {
        WitnessAttestation::now(
            node_id,
            Share {
                index: node_id,
                value: node_id as u64 * 10,
            },
        )
    }

    fn shares(n: u32) -> Vec<Share> {
        (1..=n).map(|index| Share { index, value: 1 }).collect()
    }

    #[test]
    fn test_attestation_set_dedupes() {
        let mut set = AttestationSet::default();
        assert!(set.record(attestation(3)));
        assert!(set.record(attestation(1)));
        assert!(!set.record(attestation(3)));

        assert_eq!(set.len(), 2);
        assert_eq!(set.node_ids(), vec![1, 3]);
        assert!(set.contains(1));
        assert!(!set.contains(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_k_responders_win() {
        let mut collector = AttestationCollector::new(2, Duration::from_secs(10)).unwrap();
        collector.dispatch_all(&shares(3), &FixedDelays::from_millis(&[300, 100, 200]));

        let quorum = collector.collect().await.unwrap();
        assert_eq!(quorum.node_ids(), vec![2, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_for_late_witnesses_before_returning() {
        let mut collector = AttestationCollector::new(1, Duration::from_secs(10)).unwrap();
        collector.dispatch_all(&shares(3), &FixedDelays::from_millis(&[100, 2_000, 5_000]));

        let start = Instant::now();
        let quorum = collector.collect().await.unwrap();

        assert_eq!(quorum.node_ids(), vec![1]);
        // Returned only after the slowest witness finished
        assert!(start.elapsed() >= Duration::from_millis(5_000));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stragglers_aborted_at_deadline() {
        let mut collector = AttestationCollector::new(1, Duration::from_secs(1)).unwrap();
        collector.dispatch_all(&shares(2), &FixedDelays::from_millis(&[100, 60_000]));

        let start = Instant::now();
        let quorum = collector.collect().await.unwrap();

        assert_eq!(quorum.node_ids(), vec![1]);
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_ignored() {
        let collector = AttestationCollector::new(2, Duration::from_secs(5)).unwrap();
        let sink = collector.sink();

        let producer = tokio::spawn(async move {
            sink.publish(attestation(1)).await;
            sink.publish(attestation(1)).await;
            sink.publish(attestation(1)).await;
            sink.publish(attestation(4)).await;
        });

        let quorum = collector.collect().await.unwrap();
        producer.await.unwrap();

        assert_eq!(quorum.len(), 2);
        assert_eq!(quorum.node_ids(), vec![1, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_when_quorum_unreachable() {
        let mut collector = AttestationCollector::new(2, Duration::from_secs(1)).unwrap();
        collector.dispatch_all(&shares(2), &FixedDelays::from_millis(&[200, 3_600_000]));

        let err = collector.collect().await.unwrap_err();
        assert_eq!(
            err,
            VerificationError::QuorumTimeout {
                received: 1,
                required: 2,
                timeout: Duration::from_secs(1),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_fast_when_no_producers() {
        let collector = AttestationCollector::new(1, Duration::from_secs(3600)).unwrap();
        assert_eq!(collector.pending(), 0);

        let start = Instant::now();
        let err = collector.collect().await.unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(1));
        // `timeout` carries the configured bound, not the time spent waiting
        assert_eq!(
            err,
            VerificationError::QuorumTimeout {
                received: 0,
                required: 1,
                timeout: Duration::from_secs(3600),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_witnesses_finishing_short_of_quorum_fail_early() {
        let mut collector = AttestationCollector::new(3, Duration::from_secs(60)).unwrap();
        collector.dispatch_all(&shares(2), &FixedDelays::from_millis(&[100, 200]));

        let start = Instant::now();
        let err = collector.collect().await.unwrap_err();

        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(matches!(
            err,
            VerificationError::QuorumTimeout { received: 2, required: 3, .. }
        ));
    }

    #[test]
    fn test_zero_threshold_rejected() {
        let err = AttestationCollector::new(0, Duration::from_secs(1))
            .err()
            .unwrap();
        assert!(matches!(err, VerificationError::InvalidParameters { .. }));
        assert!(AttestationCollector::new(1, Duration::from_secs(1)).is_ok());
    }
}
