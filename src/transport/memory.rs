//! In-process transport pair

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::trace;

use super::{ReadOutcome, Transport};
use crate::{CecError, Result};

/// Bus side of an in-memory link.
///
/// Bytes written here arrive at the [`MemoryPeer`]; bytes the peer sends are
/// read here. Dropping the peer closes the transport.
pub struct MemoryTransport {
    incoming: tokio::sync::Mutex<Incoming>,
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
}

struct Incoming {
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    pending: VecDeque<u8>,
}

/// Adapter side of an in-memory link.
pub struct MemoryPeer {
    to_bus: mpsc::UnboundedSender<Vec<u8>>,
    from_bus: mpsc::UnboundedReceiver<Vec<u8>>,
    written: Mutex<Vec<Vec<u8>>>,
}

impl MemoryTransport {
    /// Create a connected transport and peer.
    pub fn pair() -> (MemoryTransport, MemoryPeer) {
        let (to_bus, bus_rx) = mpsc::unbounded_channel();
        let (bus_tx, from_bus) = mpsc::unbounded_channel();
        let transport = MemoryTransport {
            incoming: tokio::sync::Mutex::new(Incoming { rx: bus_rx, pending: VecDeque::new() }),
            outgoing: bus_tx,
        };
        let peer = MemoryPeer { to_bus, from_bus, written: Mutex::new(Vec::new()) };
        (transport, peer)
    }
}

#[async_trait::async_trait]
impl Transport for MemoryTransport {
    async fn read(&self, buf: &mut [u8], timeout: Duration) -> Result<ReadOutcome> {
        let mut incoming = self.incoming.lock().await;
        if incoming.pending.is_empty() {
            match tokio::time::timeout(timeout, incoming.rx.recv()).await {
                Err(_) => return Ok(ReadOutcome::Timeout),
                Ok(None) => return Err(CecError::Closed),
                Ok(Some(chunk)) => incoming.pending.extend(chunk),
            }
        }
        let n = buf.len().min(incoming.pending.len());
        for (slot, byte) in buf.iter_mut().zip(incoming.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(ReadOutcome::Data(n))
    }

    async fn write(&self, bytes: &[u8]) -> Result<usize> {
        trace!(len = bytes.len(), "Memory transport write");
        self.outgoing.send(bytes.to_vec()).map_err(|_| CecError::Closed)?;
        Ok(bytes.len())
    }
}

impl MemoryPeer {
    /// Deliver bytes to the bus as if the adapter sent them.
    pub fn send(&self, bytes: &[u8]) -> Result<()> {
        self.to_bus.send(bytes.to_vec()).map_err(|_| CecError::Closed)
    }

    /// Wait for the next chunk the bus wrote. `None` once the bus side is dropped.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        let chunk = self.from_bus.recv().await?;
        self.record(&chunk);
        Some(chunk)
    }

    /// Take a chunk if one is already waiting.
    pub fn try_recv(&mut self) -> Option<Vec<u8>> {
        let chunk = self.from_bus.try_recv().ok()?;
        self.record(&chunk);
        Some(chunk)
    }

    /// Every chunk received so far, in order.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn record(&self, chunk: &[u8]) {
        self.written.lock().unwrap_or_else(|e| e.into_inner()).push(chunk.to_vec());
    }
}
