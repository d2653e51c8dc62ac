//! Bridge configuration
//!
//! Every field has a default, so a YAML file only needs the values that differ:
//!
//! ```yaml
//! serial_port: /dev/ttyUSB0
//! socket_path: /run/chrony/z3805a.sock
//! rollover_threshold_year: 2020
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::{DEFAULT_ROLLOVER_THRESHOLD_YEAR, RolloverPolicy};
use crate::chrony::{DEFAULT_SOCKET_PATH, DEFAULT_WRITE_TIMEOUT};
use crate::providers::serial::{DEFAULT_BAUD_RATE, is_supported_baud_rate};
use crate::reporter::DEFAULT_REPORT_INTERVAL;
use crate::{BridgeError, Result};

pub const DEFAULT_SERIAL_PORT: &str = "/dev/ttyAMA0";

/// Runtime settings for the bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Serial device the oscillator is attached to
    pub serial_port: PathBuf,
    pub baud_rate: u32,
    /// chrony `SOCK` refclock path
    pub socket_path: PathBuf,
    pub write_timeout_ms: u64,
    pub report_interval_secs: u64,
    /// Decoded years below this get the GPS week rollover correction
    pub rollover_threshold_year: i32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            serial_port: PathBuf::from(DEFAULT_SERIAL_PORT),
            baud_rate: DEFAULT_BAUD_RATE,
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT.as_millis() as u64,
            report_interval_secs: DEFAULT_REPORT_INTERVAL.as_secs(),
            rollover_threshold_year: DEFAULT_ROLLOVER_THRESHOLD_YEAR,
        }
    }
}

impl BridgeConfig {
    /// Parse a YAML document; missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml_ng::from_str(yaml)
            .map_err(|e| BridgeError::config("configuration file", e.to_string()))
    }

    /// Read and parse a YAML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|source| BridgeError::ConfigFile { path: path.to_path_buf(), source })?;
        let config = Self::from_yaml(&yaml)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.serial_port.as_os_str().is_empty() {
            return Err(BridgeError::config("serial_port", "path must not be empty"));
        }
        if self.socket_path.as_os_str().is_empty() {
            return Err(BridgeError::config("socket_path", "path must not be empty"));
        }
        if !is_supported_baud_rate(self.baud_rate) {
            return Err(BridgeError::config(
                "baud_rate",
                format!("{} is not a supported line speed", self.baud_rate),
            ));
        }
        if self.write_timeout_ms == 0 {
            return Err(BridgeError::config("write_timeout_ms", "must be positive"));
        }
        if self.report_interval_secs == 0 {
            return Err(BridgeError::config("report_interval_secs", "must be positive"));
        }
        if !(2000..=2099).contains(&self.rollover_threshold_year) {
            return Err(BridgeError::config(
                "rollover_threshold_year",
                format!("{} is outside 2000..=2099", self.rollover_threshold_year),
            ));
        }
        Ok(())
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    pub fn rollover_policy(&self) -> RolloverPolicy {
        RolloverPolicy::new(self.rollover_threshold_year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_z3805a_setup() {
        let config = BridgeConfig::default();
        assert_eq!(config.serial_port, PathBuf::from("/dev/ttyAMA0"));
        assert_eq!(config.socket_path, PathBuf::from("/var/run/chrony/gpsdo.sock"));
        assert_eq!(config.write_timeout(), Duration::from_secs(2));
        assert_eq!(config.report_interval(), Duration::from_secs(30));
        assert_eq!(config.rollover_policy(), RolloverPolicy::default());
        config.validate().unwrap();
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = BridgeConfig::from_yaml(
            "serial_port: /dev/ttyUSB0\nrollover_threshold_year: 2030\n",
        )
        .unwrap();
        assert_eq!(config.serial_port, PathBuf::from("/dev/ttyUSB0"));
        assert_eq!(config.rollover_threshold_year, 2030);
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.socket_path, PathBuf::from(DEFAULT_SOCKET_PATH));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = BridgeConfig::from_yaml("sock_path: /tmp/x.sock\n").unwrap_err();
        assert!(matches!(err, BridgeError::Config { .. }), "got {err}");
    }

    #[test]
    fn invalid_values_fail_validation() {
        let cases = [
            BridgeConfig { socket_path: PathBuf::new(), ..Default::default() },
            BridgeConfig { write_timeout_ms: 0, ..Default::default() },
            BridgeConfig { report_interval_secs: 0, ..Default::default() },
            BridgeConfig { rollover_threshold_year: 1999, ..Default::default() },
            BridgeConfig { baud_rate: 1234, ..Default::default() },
        ];
        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "socket_path: /run/chrony/z3805a.sock").unwrap();
        writeln!(file, "report_interval_secs: 10").unwrap();

        let config = BridgeConfig::load(file.path()).unwrap();
        assert_eq!(config.socket_path, PathBuf::from("/run/chrony/z3805a.sock"));
        assert_eq!(config.report_interval(), Duration::from_secs(10));

        let missing = BridgeConfig::load("/nonexistent/gpsdo-sock.yaml").unwrap_err();
        assert!(matches!(missing, BridgeError::ConfigFile { .. }));
    }
}
