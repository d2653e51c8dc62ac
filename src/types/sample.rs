//! Decoded Time-of-Day samples

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::OscillatorStatus;

/// One decoded telegram
///
/// Only the telegram decoder builds these, so every instance satisfies the range
/// invariants: year in 2000..=2099, day-of-year in 1..=366, a valid time of day.
/// `year` and `day_of_year` describe the rollover-corrected timestamp when a
/// correction was applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedSample {
    year: i32,
    day_of_year: u32,
    hour: u8,
    minute: u8,
    second: u8,
    leap_seconds: u16,
    status: OscillatorStatus,
    valid: bool,
    rolled_over: bool,
    timestamp: DateTime<Utc>,
    parsed_at: DateTime<Utc>,
}

/// Calendar fields handed from the decoder to [`DecodedSample::new`]
#[derive(Debug, Clone, Copy)]
pub(crate) struct SampleFields {
    pub year: i32,
    pub day_of_year: u32,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub leap_seconds: u16,
    pub status: OscillatorStatus,
    pub rolled_over: bool,
    pub timestamp: DateTime<Utc>,
}

impl DecodedSample {
    pub(crate) fn new(fields: SampleFields, parsed_at: DateTime<Utc>) -> Self {
        Self {
            year: fields.year,
            day_of_year: fields.day_of_year,
            hour: fields.hour,
            minute: fields.minute,
            second: fields.second,
            leap_seconds: fields.leap_seconds,
            status: fields.status,
            valid: fields.status.is_usable(),
            rolled_over: fields.rolled_over,
            timestamp: fields.timestamp,
            parsed_at,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn day_of_year(&self) -> u32 {
        self.day_of_year
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn second(&self) -> u8 {
        self.second
    }

    /// GPS-UTC leap second count as broadcast by the oscillator
    pub fn leap_seconds(&self) -> u16 {
        self.leap_seconds
    }

    pub fn status(&self) -> OscillatorStatus {
        self.status
    }

    /// True when the sample may be handed to chrony (locked or holdover)
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// True when the GPS week rollover correction was applied
    pub fn rolled_over(&self) -> bool {
        self.rolled_over
    }

    /// Absolute UTC time of the telegram, after rollover correction
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Host clock reading taken when the telegram was decoded
    pub fn parsed_at(&self) -> DateTime<Utc> {
        self.parsed_at
    }

    /// Compare everything except the decode time
    pub fn same_reading(&self, other: &DecodedSample) -> bool {
        Self { parsed_at: other.parsed_at, ..self.clone() } == *other
    }
}

impl fmt::Display for DecodedSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:03} {:02}:{:02}:{:02} UTC",
            self.year, self.day_of_year, self.hour, self.minute, self.second
        )
    }
}
