//! Provider over any async byte stream

use bytes::Bytes;
use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::trace;

use crate::provider::TelegramProvider;
use crate::telegram::TelegramCodec;
use crate::{BridgeError, Result};

/// Frames an [`AsyncRead`] into candidate telegrams
pub struct StreamProvider<R> {
    frames: FramedRead<R, TelegramCodec>,
    source: String,
}

impl<R: AsyncRead + Unpin + Send + 'static> StreamProvider<R> {
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self { frames: FramedRead::new(reader, TelegramCodec::new()), source: source.into() }
    }

    pub fn with_codec(reader: R, codec: TelegramCodec, source: impl Into<String>) -> Self {
        Self { frames: FramedRead::new(reader, codec), source: source.into() }
    }
}

#[async_trait::async_trait]
impl<R: AsyncRead + Unpin + Send + 'static> TelegramProvider for StreamProvider<R> {
    async fn next_telegram(&mut self) -> Result<Option<Bytes>> {
        match self.frames.next().await {
            Some(Ok(frame)) => {
                trace!("{}: {} byte frame", self.source, frame.len());
                Ok(Some(frame.freeze()))
            }
            Some(Err(e)) => Err(BridgeError::stream(self.source.clone(), e)),
            None => Ok(None),
        }
    }

    fn source(&self) -> &str {
        &self.source
    }
}
