//! Framing of the raw serial byte stream into candidate telegrams

use bytes::BytesMut;
use tokio_util::codec::Decoder;
use tracing::trace;

use super::format::{TELEGRAM_LEN, TERMINATOR};

/// Bytes tolerated without a terminator before the buffer is discarded
pub const DEFAULT_MAX_FRAME: usize = 256;

/// Splits a serial stream on the carriage-return terminator
///
/// Every run of bytes ending in `\r` is emitted as one candidate, whatever its length,
/// so the telegram decoder sees (and rejects) short or long runs. Digit bytes never
/// equal `\r`, which lets the codec resynchronise after line noise.
#[derive(Debug, Clone)]
pub struct TelegramCodec {
    max_frame: usize,
}

impl Default for TelegramCodec {
    fn default() -> Self {
        Self { max_frame: DEFAULT_MAX_FRAME }
    }
}

impl TelegramCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the garbage limit, never below one telegram
    pub fn with_max_frame(mut self, max_frame: usize) -> Self {
        self.max_frame = max_frame.max(TELEGRAM_LEN);
        self
    }
}

impl Decoder for TelegramCodec {
    type Item = BytesMut;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(pos) = src.iter().position(|&b| b == TERMINATOR) {
            return Ok(Some(src.split_to(pos + 1)));
        }

        if src.len() > self.max_frame {
            trace!("Dropping {} bytes without terminator", src.len());
            src.clear();
        }
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(frame) => Ok(Some(frame)),
            None => {
                if !src.is_empty() {
                    trace!("Dropping {} trailing bytes at end of stream", src.len());
                    src.clear();
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::LOCKED_2025_043;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    #[test]
    fn splits_on_terminator() {
        let mut codec = TelegramCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&LOCKED_2025_043);
        buf.extend_from_slice(&LOCKED_2025_043[..5]);

        let frame = codec.decode(&mut buf).unwrap().expect("complete telegram");
        assert_eq!(&frame[..], &LOCKED_2025_043[..]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 5);

        buf.extend_from_slice(&LOCKED_2025_043[5..]);
        let frame = codec.decode(&mut buf).unwrap().expect("reassembled telegram");
        assert_eq!(&frame[..], &LOCKED_2025_043[..]);
        assert!(buf.is_empty());
    }

    #[test]
    fn noise_before_telegram_is_emitted_separately() {
        let mut codec = TelegramCodec::new();
        let mut buf = BytesMut::from(&[7u8, 7, TERMINATOR][..]);
        buf.extend_from_slice(&LOCKED_2025_043);

        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), 3);
        assert_eq!(codec.decode(&mut buf).unwrap().unwrap().len(), TELEGRAM_LEN);
    }

    #[test]
    fn garbage_without_terminator_is_discarded() {
        let mut codec = TelegramCodec::new().with_max_frame(32);
        let mut buf = BytesMut::from(&[1u8; 40][..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn max_frame_never_drops_below_telegram_length() {
        let mut codec = TelegramCodec::new().with_max_frame(4);
        let mut buf = BytesMut::from(&LOCKED_2025_043[..10]);
        assert!(codec.decode(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 10);
    }

    #[tokio::test]
    async fn framed_read_drops_partial_tail() {
        let mut input = LOCKED_2025_043.to_vec();
        input.extend_from_slice(&LOCKED_2025_043);
        input.extend_from_slice(&[1, 2, 3]);

        let frames: Vec<_> = FramedRead::new(&input[..], TelegramCodec::new()).collect().await;
        assert_eq!(frames.len(), 2);
        assert!(frames.iter().all(|f| f.as_ref().is_ok_and(|f| f.len() == TELEGRAM_LEN)));
    }
}
