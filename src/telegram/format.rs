//! Z3805A Time-of-Day telegram layout and decoding
//!
//! The oscillator emits one telegram every two seconds. Each byte before the terminator
//! carries a single decimal digit as its numeric value (not ASCII, not packed BCD):
//!
//! | Offset | Field              | Digits |
//! |--------|--------------------|--------|
//! | 0–1    | Year (minus 2000)  | 2      |
//! | 2–4    | Day of year        | 3      |
//! | 5–6    | Hour               | 2      |
//! | 7–8    | Minute             | 2      |
//! | 9–10   | Second             | 2      |
//! | 11–12  | Leap seconds       | 2      |
//! | 13–14  | Status code        | 2      |
//! | 15     | Terminator (`\r`)  | –      |
//!
//! Digits are combined positionally without checking that each byte is below ten;
//! only the resulting field values are range checked.

use std::ops::Range;

use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone, Utc};
use thiserror::Error;
use tracing::trace;

use crate::calendar::RolloverPolicy;
use crate::types::{DecodedSample, OscillatorStatus, SampleFields};

/// Length of one telegram including the terminator
pub const TELEGRAM_LEN: usize = 16;

/// Carriage return closing every telegram
pub const TERMINATOR: u8 = 0x0D;

const YEAR_BASE: u32 = 2000;

const YEAR: Range<usize> = 0..2;
const DAY_OF_YEAR: Range<usize> = 2..5;
const HOUR: Range<usize> = 5..7;
const MINUTE: Range<usize> = 7..9;
const SECOND: Range<usize> = 9..11;
const LEAP_SECONDS: Range<usize> = 11..13;
const STATUS: Range<usize> = 13..15;

/// Why a buffer was not accepted as a telegram
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelegramError {
    #[error("expected 16 bytes, got {0}")]
    Length(usize),

    #[error("terminator is {0:#04x}, expected 0x0d")]
    Terminator(u8),

    #[error("{field} value {value} outside {min}..={max}")]
    OutOfRange { field: &'static str, value: u32, min: u32, max: u32 },
}

/// Raw field values of a well-formed telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Telegram {
    pub year: u16,
    pub day_of_year: u16,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub leap_seconds: u16,
    pub status_code: u16,
}

fn digits(buf: &[u8], range: Range<usize>) -> u32 {
    buf[range].iter().fold(0, |acc, &digit| acc * 10 + u32::from(digit))
}

fn check(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, TelegramError> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(TelegramError::OutOfRange { field, value, min, max })
    }
}

impl Telegram {
    /// Validate framing and field ranges of a candidate buffer.
    pub fn parse(buf: &[u8]) -> Result<Self, TelegramError> {
        if buf.len() != TELEGRAM_LEN {
            return Err(TelegramError::Length(buf.len()));
        }
        let terminator = buf[TELEGRAM_LEN - 1];
        if terminator != TERMINATOR {
            return Err(TelegramError::Terminator(terminator));
        }

        let year = check("year", YEAR_BASE + digits(buf, YEAR), 2000, 2099)?;
        let day_of_year = check("day of year", digits(buf, DAY_OF_YEAR), 1, 366)?;
        let hour = check("hour", digits(buf, HOUR), 0, 23)?;
        let minute = check("minute", digits(buf, MINUTE), 0, 59)?;
        let second = check("second", digits(buf, SECOND), 0, 59)?;

        // Two digits at most 10*255 + 255, so these always fit
        let leap_seconds = digits(buf, LEAP_SECONDS) as u16;
        let status_code = digits(buf, STATUS) as u16;

        Ok(Self {
            year: year as u16,
            day_of_year: day_of_year as u16,
            hour: hour as u8,
            minute: minute as u8,
            second: second as u8,
            leap_seconds,
            status_code,
        })
    }

    /// UTC timestamp before rollover correction.
    ///
    /// Day 366 of a common year rolls over into January 1 of the following year.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        let date = NaiveDate::from_ymd_opt(i32::from(self.year), 1, 1)?
            .checked_add_days(Days::new(u64::from(self.day_of_year) - 1))?;
        let datetime = date.and_hms_opt(
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )?;
        Some(Utc.from_utc_datetime(&datetime))
    }

    pub fn status(&self) -> OscillatorStatus {
        OscillatorStatus::from_code(self.status_code)
    }
}

/// Turns raw buffers into [`DecodedSample`]s
///
/// Decoding is total over its input: a buffer either yields a sample or nothing. The
/// rejection reason is only traced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelegramDecoder {
    policy: RolloverPolicy,
}

impl TelegramDecoder {
    pub fn new(policy: RolloverPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RolloverPolicy {
        self.policy
    }

    /// Decode a buffer, stamping it with the current host time.
    pub fn decode(&self, buf: &[u8]) -> Option<DecodedSample> {
        self.decode_at(buf, Utc::now())
    }

    /// Decode a buffer with an explicit decode time.
    pub fn decode_at(&self, buf: &[u8], parsed_at: DateTime<Utc>) -> Option<DecodedSample> {
        let telegram = match Telegram::parse(buf) {
            Ok(telegram) => telegram,
            Err(e) => {
                trace!("Discarding {} byte buffer: {}", buf.len(), e);
                return None;
            }
        };

        let decoded = telegram.timestamp()?;
        let year = i32::from(telegram.year);

        let fields = match self.policy.correct(year, decoded) {
            Some(corrected) => {
                trace!("GPS week rollover: {} -> {}", decoded, corrected);
                SampleFields {
                    year: corrected.year(),
                    day_of_year: corrected.ordinal(),
                    timestamp: corrected,
                    rolled_over: true,
                    ..Self::raw_fields(&telegram, decoded)
                }
            }
            None => Self::raw_fields(&telegram, decoded),
        };

        Some(DecodedSample::new(fields, parsed_at))
    }

    fn raw_fields(telegram: &Telegram, timestamp: DateTime<Utc>) -> SampleFields {
        SampleFields {
            year: i32::from(telegram.year),
            day_of_year: u32::from(telegram.day_of_year),
            hour: telegram.hour,
            minute: telegram.minute,
            second: telegram.second,
            leap_seconds: telegram.leap_seconds,
            status: telegram.status(),
            rolled_over: false,
            timestamp,
        }
    }
}
