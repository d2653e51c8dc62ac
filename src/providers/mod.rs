//! Telegram provider implementations

pub mod serial;
pub mod stream;

pub use serial::SerialProvider;
pub use stream::StreamProvider;
