//! Core types shared by the decoder, the chrony encoder and the bridge.
//!
//! - [`OscillatorStatus`] is the closed set of states the oscillator can report
//! - [`DecodedSample`] is one validated Time-of-Day reading with its UTC timestamp
//!
//! Samples are immutable once decoded and are shared between tasks behind `Arc`.

mod sample;
mod status;

pub(crate) use sample::SampleFields;
pub use sample::DecodedSample;
pub use status::OscillatorStatus;
