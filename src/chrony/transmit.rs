//! One-shot delivery of sample records to chrony's datagram socket

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::net::UnixDatagram;
use tracing::trace;

use super::record::{SOCK_SAMPLE_LEN, SockSample};

/// Socket chrony creates for `refclock SOCK /var/run/chrony/gpsdo.sock`
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/chrony/gpsdo.sock";

/// Upper bound on a single write
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

/// Why a record did not reach chrony
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("chrony socket {path} is unreachable")]
    Unreachable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write to {path} timed out after {timeout:?}")]
    TimedOut { path: PathBuf, timeout: Duration },

    #[error("write to {path} failed")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("short write to {path}: {written} of {expected} bytes")]
    ShortWrite { path: PathBuf, written: usize, expected: usize },
}

/// Sends each record over a fresh, connectionless Unix socket
///
/// Nothing is held open between samples and nothing is retried: a failed record is
/// lost and the next telegram supersedes it.
#[derive(Debug, Clone)]
pub struct SampleTransmitter {
    path: PathBuf,
    timeout: Duration,
}

impl SampleTransmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), timeout: DEFAULT_WRITE_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Write exactly one record, closing the socket whatever the outcome.
    pub async fn transmit(&self, record: &SockSample) -> Result<(), DeliveryError> {
        let unreachable =
            |source| DeliveryError::Unreachable { path: self.path.clone(), source };

        let socket = UnixDatagram::unbound().map_err(unreachable)?;
        socket.connect(&self.path).map_err(unreachable)?;

        let bytes = record.encode();
        let written = match tokio::time::timeout(self.timeout, socket.send(&bytes)).await {
            Err(_) => {
                return Err(DeliveryError::TimedOut {
                    path: self.path.clone(),
                    timeout: self.timeout,
                });
            }
            Ok(Err(source)) => {
                return Err(DeliveryError::Write { path: self.path.clone(), source });
            }
            Ok(Ok(written)) => written,
        };

        if written != SOCK_SAMPLE_LEN {
            return Err(DeliveryError::ShortWrite {
                path: self.path.clone(),
                written,
                expected: SOCK_SAMPLE_LEN,
            });
        }

        trace!("Sent {} byte record to {}", written, self.path.display());
        Ok(())
    }
}
