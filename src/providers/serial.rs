//! Serial device provider
//!
//! The Z3805A talks 9600 baud, 8 data bits, no parity, one stop bit. The line is put
//! into raw mode with reads blocking until at least one byte arrives.

use std::fs::OpenOptions;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use bytes::Bytes;
use nix::fcntl::OFlag;
use nix::sys::termios::{self, BaudRate, ControlFlags, SetArg, SpecialCharacterIndices};
use tracing::{debug, info};

use super::StreamProvider;
use crate::provider::TelegramProvider;
use crate::{BridgeError, Result};

/// Line speed of the oscillator's Time-of-Day port
pub const DEFAULT_BAUD_RATE: u32 = 9600;

fn baud_rate(rate: u32) -> Option<BaudRate> {
    match rate {
        1200 => Some(BaudRate::B1200),
        2400 => Some(BaudRate::B2400),
        4800 => Some(BaudRate::B4800),
        9600 => Some(BaudRate::B9600),
        19200 => Some(BaudRate::B19200),
        38400 => Some(BaudRate::B38400),
        57600 => Some(BaudRate::B57600),
        115200 => Some(BaudRate::B115200),
        _ => None,
    }
}

/// Whether the rate can be programmed into the line
pub fn is_supported_baud_rate(rate: u32) -> bool {
    baud_rate(rate).is_some()
}

/// Reads telegrams from a tty device
pub struct SerialProvider {
    inner: StreamProvider<tokio::fs::File>,
}

impl SerialProvider {
    /// Open and configure the device at `path`.
    pub fn open(path: impl AsRef<Path>, rate: u32) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(OFlag::O_NOCTTY.bits())
            .open(path)
            .map_err(|e| BridgeError::serial(path, e))?;

        configure_line(&file, path, rate)?;
        info!("Serial port {} opened at {} baud", path.display(), rate);

        let reader = tokio::fs::File::from_std(file);
        Ok(Self { inner: StreamProvider::new(reader, path.display().to_string()) })
    }
}

fn configure_line(file: &std::fs::File, path: &Path, rate: u32) -> Result<()> {
    let speed = baud_rate(rate)
        .ok_or_else(|| BridgeError::serial_config(path, format!("unsupported baud rate {rate}")))?;
    let fail = |op: &str, e: nix::Error| BridgeError::serial_config(path, format!("{op}: {e}"));

    let mut tio = termios::tcgetattr(file).map_err(|e| fail("tcgetattr", e))?;
    termios::cfmakeraw(&mut tio);
    termios::cfsetspeed(&mut tio, speed).map_err(|e| fail("cfsetspeed", e))?;

    // 8N1, ignore modem control lines
    tio.control_flags.remove(ControlFlags::CSTOPB | ControlFlags::PARENB);
    tio.control_flags.insert(ControlFlags::CS8 | ControlFlags::CLOCAL | ControlFlags::CREAD);
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;

    termios::tcsetattr(file, SetArg::TCSANOW, &tio).map_err(|e| fail("tcsetattr", e))?;
    debug!("Configured {} for {} baud 8N1 raw", path.display(), rate);
    Ok(())
}

#[async_trait::async_trait]
impl TelegramProvider for SerialProvider {
    async fn next_telegram(&mut self) -> Result<Option<Bytes>> {
        self.inner.next_telegram().await
    }

    fn source(&self) -> &str {
        self.inner.source()
    }
}
