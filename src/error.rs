//! Error types for the GPSDO bridge.
//!
//! Only conditions that stop the bridge surface as [`BridgeError`]. Per-telegram problems
//! are recovered inside the pipeline and have their own narrower types:
//!
//! - [`TelegramError`](crate::telegram::TelegramError): why a buffer was not a telegram
//! - [`DeliveryError`](crate::chrony::DeliveryError): why a sample did not reach chrony
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use gpsdo_sock::BridgeError;
//!
//! let error = BridgeError::config("socket_path", "path must not be empty");
//! assert!(!error.is_retryable());
//! for suggestion in error.recovery_suggestions() {
//!     println!("  - {}", suggestion);
//! }
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for bridge operations.
pub type Result<T, E = BridgeError> = std::result::Result<T, E>;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum BridgeError {
    #[error("Serial device error: {path}")]
    Serial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to configure serial line {path}: {details}")]
    SerialConfig { path: PathBuf, details: String },

    #[error("Telegram stream from {source_name} failed")]
    Stream {
        source_name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error in {context}: {details}")]
    Config { context: String, details: String },

    #[error("Failed to read configuration file: {path}")]
    ConfigFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BridgeError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::Stream { .. } => true,
            BridgeError::Serial { .. } => false,
            BridgeError::SerialConfig { .. } => false,
            BridgeError::Config { .. } => false,
            BridgeError::ConfigFile { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            BridgeError::Serial { .. } => vec![
                "Check the serial device path exists",
                "Verify the user is in the dialout group",
                "Make sure no other process holds the port",
            ],
            BridgeError::SerialConfig { .. } => vec![
                "Confirm the path is a tty device",
                "Use a supported baud rate (the Z3805A default is 9600)",
            ],
            BridgeError::Stream { .. } => vec![
                "Check the oscillator cable and power",
                "Restart the bridge once the device is back",
            ],
            BridgeError::Config { .. } => vec![
                "Review the configuration values",
                "Compare against the defaults printed by --help",
            ],
            BridgeError::ConfigFile { .. } => vec![
                "Check the configuration file exists and is readable",
                "Check file permissions",
            ],
        }
    }

    /// Helper constructor for serial device errors with path context.
    pub fn serial(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        BridgeError::Serial { path: path.as_ref().to_path_buf(), source }
    }

    /// Helper constructor for serial line configuration failures.
    pub fn serial_config(path: impl AsRef<Path>, details: impl Into<String>) -> Self {
        BridgeError::SerialConfig { path: path.as_ref().to_path_buf(), details: details.into() }
    }

    /// Helper constructor for telegram stream read failures.
    pub fn stream(source_name: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::Stream { source_name: source_name.into(), source }
    }

    /// Helper constructor for configuration errors.
    pub fn config(context: impl Into<String>, details: impl Into<String>) -> Self {
        BridgeError::Config { context: context.into(), details: details.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn error_messages_carry_their_context(
            context in "\\w+",
            details in ".*",
            path in "/dev/[a-zA-Z0-9]{1,12}",
        ) {
            let config_msg = BridgeError::config(context.clone(), details.clone()).to_string();
            prop_assert!(config_msg.contains(&context));
            prop_assert!(config_msg.contains(&details));

            let serial_msg = BridgeError::serial_config(&path, details.clone()).to_string();
            prop_assert!(serial_msg.contains(&path));
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<BridgeError>();

        let error = BridgeError::config("test", "test");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn source_chain_is_preserved() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such device");
        let error = BridgeError::serial("/dev/ttyAMA0", io_err);

        let source = std::error::Error::source(&error).expect("serial error keeps its source");
        assert_eq!(source.to_string(), "no such device");
        assert!(error.to_string().contains("/dev/ttyAMA0"));
    }

    #[test]
    fn recovery_methods_work() {
        let stream = BridgeError::stream("/dev/ttyUSB0", std::io::Error::other("unplugged"));
        let config = BridgeError::config("report_interval", "must be positive");

        assert!(stream.is_retryable());
        assert!(!config.is_retryable());

        for error in [&stream, &config] {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty());
            assert!(suggestions.iter().all(|s| s.len() > 5));
        }
    }
}
