//! Oscillator status classification

use std::fmt;

use serde::{Deserialize, Serialize};

/// Operating state reported by the oscillator in each telegram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OscillatorStatus {
    /// Warming up, no usable time yet
    PowerUp,
    /// GPS lost, free-running from the last good reference
    Holdover,
    /// Disciplined to GPS
    Locked,
    /// Any status code outside the documented table
    Unknown,
}

impl OscillatorStatus {
    pub const LOCKED_CODE: u16 = 0;
    pub const POWER_UP_CODE: u16 = 10;
    pub const HOLDOVER_CODE: u16 = 100;

    /// Classify a decoded status code.
    ///
    /// The table is exact: no other telegram field takes part in the decision.
    pub fn from_code(code: u16) -> Self {
        match code {
            Self::LOCKED_CODE => OscillatorStatus::Locked,
            Self::POWER_UP_CODE => OscillatorStatus::PowerUp,
            Self::HOLDOVER_CODE => OscillatorStatus::Holdover,
            _ => OscillatorStatus::Unknown,
        }
    }

    /// Whether samples taken in this state may be used for timekeeping
    pub fn is_usable(self) -> bool {
        matches!(self, OscillatorStatus::Locked | OscillatorStatus::Holdover)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OscillatorStatus::PowerUp => "POWER_UP",
            OscillatorStatus::Holdover => "HOLDOVER",
            OscillatorStatus::Locked => "LOCKED",
            OscillatorStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for OscillatorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documented_codes_classify_exactly() {
        assert_eq!(OscillatorStatus::from_code(0), OscillatorStatus::Locked);
        assert_eq!(OscillatorStatus::from_code(10), OscillatorStatus::PowerUp);
        assert_eq!(OscillatorStatus::from_code(100), OscillatorStatus::Holdover);
    }

    #[test]
    fn usability_follows_status() {
        assert!(OscillatorStatus::Locked.is_usable());
        assert!(OscillatorStatus::Holdover.is_usable());
        assert!(!OscillatorStatus::PowerUp.is_usable());
        assert!(!OscillatorStatus::Unknown.is_usable());
    }

    #[test]
    fn other_two_digit_codes_are_unknown() {
        for code in (1..100u16).filter(|c| *c != 10) {
            assert_eq!(OscillatorStatus::from_code(code), OscillatorStatus::Unknown, "code {code}");
        }
    }

    #[test]
    fn display_matches_log_names() {
        assert_eq!(OscillatorStatus::PowerUp.to_string(), "POWER_UP");
        assert_eq!(OscillatorStatus::Locked.to_string(), "LOCKED");
        assert_eq!(
            serde_yaml_ng::to_string(&OscillatorStatus::Holdover).unwrap().trim(),
            "HOLDOVER"
        );
    }
}
