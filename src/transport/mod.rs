//! Transport trait for the adapter byte stream

use std::time::Duration;

use crate::Result;

pub mod memory;

pub use memory::{MemoryPeer, MemoryTransport};

/// Outcome of one [`Transport::read`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// `n` bytes were written to the start of the buffer.
    Data(usize),
    /// Nothing arrived within the timeout.
    Timeout,
}

/// Byte stream to the USB-CEC adapter.
///
/// Opening the serial device, baud rate and reconnection belong to the
/// implementor. The bus makes no assumption about chunking: a read may return
/// any number of bytes, split anywhere in a frame.
///
/// Both methods take `&self` so one reader task and one writer can share the
/// transport through an `Arc`.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Read available bytes into `buf`, waiting at most `timeout`.
    ///
    /// Returns:
    /// - `Ok(ReadOutcome::Data(n))` - `n > 0` bytes were read
    /// - `Ok(ReadOutcome::Timeout)` - nothing arrived in time
    /// - `Err(e)` - the transport failed or was closed
    async fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome>;

    /// Write all of `bytes`, returning the number written.
    async fn write(&self, bytes: &[u8]) -> Result<usize>;
}
