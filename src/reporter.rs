//! Periodic human-readable status reporting

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::stats::{BridgeStats, StatsSnapshot};
use crate::types::{DecodedSample, OscillatorStatus};

/// How often the status block is logged
pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// The most recent sample as shown in a status block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentSample {
    pub time_of_day: String,
    pub status: OscillatorStatus,
    /// Whole seconds since the last decoded telegram
    pub age_secs: Option<i64>,
}

/// One status block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub stats: StatsSnapshot,
    pub current: Option<CurrentSample>,
}

/// Logs a [`StatusReport`] every interval until cancelled
pub struct StatusReporter {
    stats: Arc<BridgeStats>,
    samples: watch::Receiver<Option<Arc<DecodedSample>>>,
    interval: Duration,
}

impl StatusReporter {
    pub fn new(
        stats: Arc<BridgeStats>,
        samples: watch::Receiver<Option<Arc<DecodedSample>>>,
        interval: Duration,
    ) -> Self {
        Self { stats, samples, interval }
    }

    /// Build a report from the current statistics and latest sample.
    pub fn report(&self, now: DateTime<Utc>) -> StatusReport {
        let stats = self.stats.snapshot();
        let current = self.samples.borrow().as_ref().map(|sample| CurrentSample {
            time_of_day: sample.timestamp().format("%H:%M:%S").to_string(),
            status: sample.status(),
            age_secs: stats.age(now).map(|age| age.num_seconds()),
        });
        StatusReport { stats, current }
    }

    pub fn log(&self, report: &StatusReport) {
        let stats = &report.stats;
        info!("=== GPSDO Status ===");
        info!("Telegrams: Total={}, Valid={}", stats.telegrams_seen, stats.telegrams_decoded);
        info!("Chrony: Samples={}, Failures={}", stats.samples_sent, stats.delivery_failures);
        if let Some(current) = &report.current {
            info!(
                "Current: {} UTC, Status={}, Age={}s",
                current.time_of_day,
                current.status,
                current.age_secs.unwrap_or_default()
            );
        }
        info!("==================");
    }

    /// Spawn the periodic reporting task.
    ///
    /// The first report comes one interval after spawning.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Status reporter cancelled");
                        break;
                    }
                    _ = ticker.tick() => {
                        let report = self.report(Utc::now());
                        self.log(&report);
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telegram::TelegramDecoder;
    use crate::test_utils::LOCKED_2025_043;
    use chrono::TimeZone;

    #[test]
    fn report_without_samples_has_no_current_line() {
        let (_tx, rx) = watch::channel(None);
        let reporter = StatusReporter::new(Arc::new(BridgeStats::new()), rx, DEFAULT_REPORT_INTERVAL);

        let report = reporter.report(Utc::now());
        assert_eq!(report.stats, StatsSnapshot::default());
        assert!(report.current.is_none());
    }

    #[test]
    fn report_includes_latest_sample_and_age() {
        let parsed_at = Utc.with_ymd_and_hms(2025, 2, 12, 12, 15, 31).unwrap();
        let sample = TelegramDecoder::default().decode_at(&LOCKED_2025_043, parsed_at).unwrap();

        let stats = Arc::new(BridgeStats::new());
        stats.record_telegram();
        stats.record_decoded(&sample);
        let (_tx, rx) = watch::channel(Some(Arc::new(sample)));
        let reporter = StatusReporter::new(stats, rx, DEFAULT_REPORT_INTERVAL);

        let report = reporter.report(parsed_at + chrono::Duration::seconds(12));
        let current = report.current.expect("latest sample is reported");
        assert_eq!(current.time_of_day, "12:15:30");
        assert_eq!(current.status, OscillatorStatus::Locked);
        assert_eq!(current.age_secs, Some(12));
        assert_eq!(report.stats.telegrams_decoded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn reporter_stops_on_cancel() {
        let (_tx, rx) = watch::channel(None);
        let reporter =
            StatusReporter::new(Arc::new(BridgeStats::new()), rx, Duration::from_secs(1));
        let cancel = CancellationToken::new();
        let task = reporter.spawn(cancel.clone());

        tokio::time::sleep(Duration::from_secs(3)).await;
        cancel.cancel();
        task.await.unwrap();
    }
}
