//! Bridge HP Z3805A GPS-disciplined oscillator telegrams into chrony.
//!
//! The Z3805A emits a 16-byte Time-of-Day telegram every two seconds on its serial port.
//! This crate decodes each telegram, corrects the GPS week number rollover the receiver
//! firmware suffers from, and forwards usable samples to chrony's `SOCK` refclock as
//! 40-byte `sock_sample` records over a Unix datagram socket.
//!
//! # Pipeline
//!
//! ```text
//! serial port -> TelegramCodec -> TelegramDecoder -> SockSample -> SampleTransmitter
//! ```
//!
//! Samples are only forwarded while the oscillator reports `LOCKED` or `HOLDOVER`.
//! Malformed telegrams and failed deliveries are logged and counted, never fatal.
//!
//! ## Example (decoding)
//!
//! ```rust
//! use gpsdo_sock::{SockSample, TelegramDecoder};
//!
//! let raw = [2, 5, 0, 4, 3, 1, 2, 1, 5, 3, 0, 0, 0, 0, 0, 0x0D];
//! let sample = TelegramDecoder::default().decode(&raw).expect("valid telegram");
//! assert!(sample.is_valid());
//!
//! let record = SockSample::from_sample(&sample).expect("usable sample");
//! assert_eq!(record.encode().len(), 40);
//! ```
//!
//! ## Example (running the bridge)
//!
//! ```rust,no_run
//! use gpsdo_sock::{Bridge, BridgeConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BridgeConfig::load("/etc/gpsdo-sock.yaml")?;
//!     let bridge = Bridge::open(&config)?;
//!     bridge.closed().await;
//!     println!("{:?}", bridge.stats());
//!     bridge.join().await;
//!     Ok(())
//! }
//! ```

mod error;
#[cfg(any(test, feature = "benchmark"))]
pub mod test_utils;
pub mod types;

// Wire formats
pub mod calendar;
pub mod chrony;
pub mod telegram;

// Runtime
pub mod bridge;
pub mod config;
pub mod driver;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod reporter;
pub mod stats;

pub use bridge::{Bridge, BridgeHandle};
pub use calendar::RolloverPolicy;
pub use chrony::{DeliveryError, SampleTransmitter, SockSample};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
pub use pipeline::{Pipeline, TelegramOutcome};
pub use provider::TelegramProvider;
pub use providers::{SerialProvider, StreamProvider};
pub use stats::{BridgeStats, StatsSnapshot};
pub use telegram::{Telegram, TelegramCodec, TelegramDecoder, TelegramError};
pub use types::{DecodedSample, OscillatorStatus};
