//! Provider trait for telegram sources

use bytes::Bytes;

use crate::Result;

/// Trait for telegram sources
///
/// Providers abstract over where candidate telegrams come from (a serial device, a
/// captured byte stream, a test harness) and own their blocking reads.
#[async_trait::async_trait]
pub trait TelegramProvider: Send + 'static {
    /// Get the next candidate telegram
    ///
    /// Returns:
    /// - `Ok(Some(buf))` - A terminator-delimited buffer, not yet validated
    /// - `Ok(None)` - Source ended (normal termination)
    /// - `Err(e)` - Reading from the source failed
    async fn next_telegram(&mut self) -> Result<Option<Bytes>>;

    /// Name of the source, for logging only
    fn source(&self) -> &str;
}
