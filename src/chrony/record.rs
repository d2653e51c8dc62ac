//! chrony `SOCK` refclock sample record
//!
//! chrony reads one `struct sock_sample` per datagram and identifies it by size and
//! magic value alone:
//!
//! ```text
//! struct sock_sample {
//!   struct timeval tv;   // offset 0:  tv_sec (8), offset 8: tv_usec (8)
//!   double offset;       // offset 16
//!   int pulse;           // offset 24
//!   int leap;            // offset 28
//!   int _pad;            // offset 32
//!   int magic;           // offset 36
//! };
//! ```
//!
//! Fields are written little-endian, matching the 64-bit hosts chrony runs on next to
//! the oscillator.

use chrono::{DateTime, TimeZone, Utc};

use crate::types::DecodedSample;

/// `"SOCK"` read as a little-endian integer
pub const SOCK_MAGIC: i32 = 0x534F_434B;

/// Size of one encoded record
pub const SOCK_SAMPLE_LEN: usize = 40;

/// One sample as chrony's `SOCK` driver expects it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SockSample {
    pub seconds: i64,
    pub microseconds: i64,
    /// Measured offset; this source has none, so always 0.0
    pub offset: f64,
    /// 0 for a time-of-day sample, 1 for a PPS edge
    pub pulse: i32,
    /// 0 normal, 1 insert, 2 delete
    pub leap: i32,
    pub pad: i32,
    pub magic: i32,
}

impl SockSample {
    /// Build a record for a usable sample.
    ///
    /// Returns `None` for samples taken while powering up or in an unknown state, so
    /// those can never reach chrony.
    pub fn from_sample(sample: &DecodedSample) -> Option<Self> {
        if !sample.is_valid() {
            return None;
        }
        Some(Self::from_timestamp(sample.timestamp()))
    }

    /// Build a record for an arbitrary instant, truncating to microseconds.
    pub fn from_timestamp(timestamp: DateTime<Utc>) -> Self {
        Self {
            seconds: timestamp.timestamp(),
            microseconds: i64::from(timestamp.timestamp_subsec_nanos() / 1_000),
            offset: 0.0,
            pulse: 0,
            leap: 0,
            pad: 0,
            magic: SOCK_MAGIC,
        }
    }

    pub fn encode(&self) -> [u8; SOCK_SAMPLE_LEN] {
        let mut buf = [0u8; SOCK_SAMPLE_LEN];
        buf[0..8].copy_from_slice(&self.seconds.to_le_bytes());
        buf[8..16].copy_from_slice(&self.microseconds.to_le_bytes());
        buf[16..24].copy_from_slice(&self.offset.to_le_bytes());
        buf[24..28].copy_from_slice(&self.pulse.to_le_bytes());
        buf[28..32].copy_from_slice(&self.leap.to_le_bytes());
        buf[32..36].copy_from_slice(&self.pad.to_le_bytes());
        buf[36..40].copy_from_slice(&self.magic.to_le_bytes());
        buf
    }

    /// Parse a record the way chrony does: exact size and matching magic.
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let buf: &[u8; SOCK_SAMPLE_LEN] = buf.try_into().ok()?;
        let sample = Self {
            seconds: i64::from_le_bytes(field(buf, 0)),
            microseconds: i64::from_le_bytes(field(buf, 8)),
            offset: f64::from_le_bytes(field(buf, 16)),
            pulse: i32::from_le_bytes(field(buf, 24)),
            leap: i32::from_le_bytes(field(buf, 28)),
            pad: i32::from_le_bytes(field(buf, 32)),
            magic: i32::from_le_bytes(field(buf, 36)),
        };
        (sample.magic == SOCK_MAGIC).then_some(sample)
    }

    /// The instant this record describes
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let nanos = u32::try_from(self.microseconds).ok()?.checked_mul(1_000)?;
        Utc.timestamp_opt(self.seconds, nanos).single()
    }
}

fn field<const N: usize>(buf: &[u8; SOCK_SAMPLE_LEN], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[offset..offset + N]);
    out
}
