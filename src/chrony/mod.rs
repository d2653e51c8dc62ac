//! chrony `SOCK` refclock output
//!
//! [`record`] defines the binary sample layout; [`transmit`] delivers one record per
//! datagram to the socket chrony listens on.

pub mod record;
pub mod transmit;

pub use record::{SOCK_MAGIC, SOCK_SAMPLE_LEN, SockSample};
pub use transmit::{DEFAULT_SOCKET_PATH, DEFAULT_WRITE_TIMEOUT, DeliveryError, SampleTransmitter};
