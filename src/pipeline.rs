//! Per-telegram processing: decode, classify, correct, encode, transmit

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::chrony::{DeliveryError, SampleTransmitter, SockSample};
use crate::stats::BridgeStats;
use crate::telegram::TelegramDecoder;
use crate::types::DecodedSample;

/// What became of one candidate telegram
#[derive(Debug)]
pub enum TelegramOutcome {
    /// Not a telegram; discarded
    Rejected,
    /// Decoded, but the oscillator state makes it unusable for timekeeping
    Unusable(Arc<DecodedSample>),
    /// Decoded and handed to chrony
    Delivered(Arc<DecodedSample>),
    /// Decoded, but delivery failed; the sample is dropped
    Failed(Arc<DecodedSample>, DeliveryError),
}

impl TelegramOutcome {
    pub fn sample(&self) -> Option<&Arc<DecodedSample>> {
        match self {
            TelegramOutcome::Rejected => None,
            TelegramOutcome::Unusable(sample)
            | TelegramOutcome::Delivered(sample)
            | TelegramOutcome::Failed(sample, _) => Some(sample),
        }
    }
}

/// Runs one telegram at a time through the decoder and transmitter
#[derive(Debug, Clone)]
pub struct Pipeline {
    decoder: TelegramDecoder,
    transmitter: SampleTransmitter,
    stats: Arc<BridgeStats>,
}

impl Pipeline {
    pub fn new(decoder: TelegramDecoder, transmitter: SampleTransmitter, stats: Arc<BridgeStats>) -> Self {
        Self { decoder, transmitter, stats }
    }

    pub fn stats(&self) -> &Arc<BridgeStats> {
        &self.stats
    }

    /// Process one candidate buffer, updating the run statistics.
    pub async fn handle(&self, raw: &[u8]) -> TelegramOutcome {
        self.stats.record_telegram();

        let Some(sample) = self.decoder.decode(raw) else {
            return TelegramOutcome::Rejected;
        };
        self.stats.record_decoded(&sample);
        info!(
            status = %sample.status(),
            leap = sample.leap_seconds(),
            rolled_over = sample.rolled_over(),
            "GPSDO: {}",
            sample
        );

        let sample = Arc::new(sample);
        let Some(record) = SockSample::from_sample(&sample) else {
            debug!("Not forwarding {} sample", sample.status());
            return TelegramOutcome::Unusable(sample);
        };

        match self.transmitter.transmit(&record).await {
            Ok(()) => {
                self.stats.record_delivery();
                info!(status = %sample.status(), "Chrony sample sent: GPS={}", sample);
                TelegramOutcome::Delivered(sample)
            }
            Err(e) => {
                self.stats.record_delivery_failure();
                warn!("Failed to deliver sample {}: {}", sample, e);
                TelegramOutcome::Failed(sample, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chrony::SOCK_SAMPLE_LEN;
    use crate::test_utils::{LOCKED_2025_043, telegram};
    use crate::types::OscillatorStatus;
    use tokio::net::UnixDatagram;

    fn pipeline(path: &std::path::Path) -> Pipeline {
        Pipeline::new(
            TelegramDecoder::default(),
            SampleTransmitter::new(path),
            Arc::new(BridgeStats::new()),
        )
    }

    #[tokio::test]
    async fn locked_sample_is_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chrony.sock");
        let receiver = UnixDatagram::bind(&path).unwrap();
        let pipeline = pipeline(&path);

        let outcome = pipeline.handle(&LOCKED_2025_043).await;
        assert!(matches!(outcome, TelegramOutcome::Delivered(_)), "got {outcome:?}");

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).await.unwrap();
        let record = SockSample::decode(&buf[..n]).unwrap();
        assert_eq!(record.seconds, 1_739_362_530);

        let stats = pipeline.stats().snapshot();
        assert_eq!((stats.telegrams_seen, stats.telegrams_decoded, stats.samples_sent), (1, 1, 1));
    }

    #[tokio::test]
    async fn holdover_sample_is_delivered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chrony.sock");
        let receiver = UnixDatagram::bind(&path).unwrap();
        let pipeline = pipeline(&path);

        let mut holdover = LOCKED_2025_043;
        holdover[13..15].copy_from_slice(&[10, 0]);
        let outcome = pipeline.handle(&holdover).await;
        match &outcome {
            TelegramOutcome::Delivered(sample) => {
                assert_eq!(sample.status(), OscillatorStatus::Holdover)
            }
            other => panic!("expected delivery, got {other:?}"),
        }

        let mut buf = [0u8; 64];
        let n = receiver.recv(&mut buf).await.unwrap();
        assert_eq!(n, SOCK_SAMPLE_LEN);
        assert_eq!(SockSample::decode(&buf[..n]).unwrap().seconds, 1_739_362_530);
        assert_eq!(pipeline.stats().snapshot().samples_sent, 1);
    }

    #[tokio::test]
    async fn power_up_is_never_transmitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chrony.sock");
        let receiver = UnixDatagram::bind(&path).unwrap();
        let pipeline = pipeline(&path);

        let outcome = pipeline.handle(&telegram(2025, 43, 12, 15, 30, 0, 10)).await;
        assert!(matches!(outcome, TelegramOutcome::Unusable(_)));

        let mut buf = [0u8; 64];
        assert!(receiver.try_recv(&mut buf).is_err());
        assert_eq!(pipeline.stats().snapshot().samples_sent, 0);
    }

    #[tokio::test]
    async fn malformed_buffer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir.path().join("chrony.sock"));

        let mut buf = LOCKED_2025_043;
        buf[15] = 0x0A;
        let outcome = pipeline.handle(&buf).await;
        assert!(outcome.sample().is_none());

        let stats = pipeline.stats().snapshot();
        assert_eq!((stats.telegrams_seen, stats.telegrams_decoded), (1, 0));
        assert!(stats.last_update.is_none());
    }

    #[tokio::test]
    async fn delivery_failure_is_counted_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(&dir.path().join("missing.sock"));

        let outcome = pipeline.handle(&LOCKED_2025_043).await;
        match outcome {
            TelegramOutcome::Failed(sample, DeliveryError::Unreachable { .. }) => {
                assert!(sample.is_valid())
            }
            other => panic!("expected an unreachable socket, got {other:?}"),
        }

        let stats = pipeline.stats().snapshot();
        assert_eq!((stats.delivery_failures, stats.samples_sent), (1, 0));
    }
}
