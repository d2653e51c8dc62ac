//! Z3805A Time-of-Day telegram support
//!
//! [`format`] validates and decodes single 16-byte telegrams; [`codec`] cuts the raw
//! serial stream into candidate telegrams.

pub mod codec;
pub mod format;

pub use codec::TelegramCodec;
pub use format::{TELEGRAM_LEN, TERMINATOR, Telegram, TelegramDecoder, TelegramError};
