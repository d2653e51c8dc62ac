//! Telegram fixtures shared by unit tests and benchmarks

#![cfg(any(test, feature = "benchmark"))]

use crate::telegram::{TELEGRAM_LEN, TERMINATOR};

/// 2025, day 043, 12:15:30, leap 00, status 00 (locked)
pub const LOCKED_2025_043: [u8; TELEGRAM_LEN] =
    [2, 5, 0, 4, 3, 1, 2, 1, 5, 3, 0, 0, 0, 0, 0, TERMINATOR];

/// Build a telegram with one decimal digit per byte.
///
/// `year` is written as its last two digits. Values are not range checked so that
/// out-of-range fields can be produced on purpose.
pub fn telegram(
    year: u16,
    day: u16,
    hour: u8,
    minute: u8,
    second: u8,
    leap: u16,
    status: u16,
) -> [u8; TELEGRAM_LEN] {
    assert!(leap <= 99, "leap seconds field holds two digits");
    assert!(status <= 99, "status field holds two digits");
    assert!(day <= 999, "day field holds three digits");

    let yy = (year % 100) as u8;
    let day_hundreds = (day / 100) as u8;
    let day_rest = (day % 100) as u8;
    let leap = leap as u8;
    let status = status as u8;

    [
        yy / 10,
        yy % 10,
        day_hundreds,
        day_rest / 10,
        day_rest % 10,
        hour / 10,
        hour % 10,
        minute / 10,
        minute % 10,
        second / 10,
        second % 10,
        leap / 10,
        leap % 10,
        status / 10,
        status % 10,
        TERMINATOR,
    ]
}
