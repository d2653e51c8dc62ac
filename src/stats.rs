//! Run statistics shared between the driver and the status reporter

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::types::DecodedSample;

const NO_UPDATE: i64 = i64::MIN;

/// Counters updated by the driver task
///
/// Each counter is independent; readers go through [`BridgeStats::snapshot`] and may
/// see one counter a telegram ahead of another.
#[derive(Debug)]
pub struct BridgeStats {
    telegrams_seen: AtomicU64,
    telegrams_decoded: AtomicU64,
    usable_samples: AtomicU64,
    samples_sent: AtomicU64,
    delivery_failures: AtomicU64,
    provider_errors: AtomicU64,
    last_update_micros: AtomicI64,
}

impl Default for BridgeStats {
    fn default() -> Self {
        Self {
            telegrams_seen: AtomicU64::new(0),
            telegrams_decoded: AtomicU64::new(0),
            usable_samples: AtomicU64::new(0),
            samples_sent: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            provider_errors: AtomicU64::new(0),
            last_update_micros: AtomicI64::new(NO_UPDATE),
        }
    }
}

/// Point-in-time copy of [`BridgeStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatsSnapshot {
    pub telegrams_seen: u64,
    pub telegrams_decoded: u64,
    pub usable_samples: u64,
    pub samples_sent: u64,
    pub delivery_failures: u64,
    pub provider_errors: u64,
    pub last_update: Option<DateTime<Utc>>,
}

impl StatsSnapshot {
    /// Time since the last decoded telegram
    pub fn age(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_update.map(|at| now - at)
    }
}

impl BridgeStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_telegram(&self) {
        self.telegrams_seen.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_decoded(&self, sample: &DecodedSample) {
        self.telegrams_decoded.fetch_add(1, Ordering::Relaxed);
        if sample.is_valid() {
            self.usable_samples.fetch_add(1, Ordering::Relaxed);
        }
        self.last_update_micros.store(sample.parsed_at().timestamp_micros(), Ordering::Relaxed);
    }

    pub fn record_delivery(&self) {
        self.samples_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_delivery_failure(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_provider_error(&self) {
        self.provider_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let micros = self.last_update_micros.load(Ordering::Relaxed);
        StatsSnapshot {
            telegrams_seen: self.telegrams_seen.load(Ordering::Relaxed),
            telegrams_decoded: self.telegrams_decoded.load(Ordering::Relaxed),
            usable_samples: self.usable_samples.load(Ordering::Relaxed),
            samples_sent: self.samples_sent.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            provider_errors: self.provider_errors.load(Ordering::Relaxed),
            last_update: (micros != NO_UPDATE)
                .then(|| Utc.timestamp_micros(micros).single())
                .flatten(),
        }
    }
}
