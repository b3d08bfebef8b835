//! Incremental decoder turning raw adapter bytes into frames

use tracing::{trace, warn};

use super::frame::{AdapterFrame, ESCAPE, ESCAPE_MASK, FRAME_START, MAX_FRAME_LEN};

/// Result of feeding one byte to the [`FrameDecoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// A frame was closed by an unescaped `FRAME_START`.
    FrameComplete(AdapterFrame),
    NeedsMore,
}

/// Byte-at-a-time frame decoder.
///
/// The decoder keeps all state between calls, so input may be split at any
/// byte boundary. Malformed frames (an unexpected reserved byte, or more than
/// [`MAX_FRAME_LEN`] bytes) are dropped and decoding resumes at the next
/// `FRAME_START`.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    in_frame: bool,
    escape_pending: bool,
    discarding: bool,
    faults: u64,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one received byte.
    pub fn push_received_byte(&mut self, byte: u8) -> DecodeStatus {
        if byte == FRAME_START {
            if self.escape_pending {
                self.fault("frame start after escape marker");
            }
            let completed = self.in_frame && !self.discarding && !self.buffer.is_empty();
            let status = if completed {
                let frame = AdapterFrame::from_bytes(std::mem::take(&mut self.buffer));
                trace!(frame = %frame, "Frame complete");
                DecodeStatus::FrameComplete(frame)
            } else {
                DecodeStatus::NeedsMore
            };
            self.buffer.clear();
            self.in_frame = true;
            self.escape_pending = false;
            self.discarding = false;
            return status;
        }

        if !self.in_frame || self.discarding {
            trace!(byte = format_args!("{byte:#04x}"), "Dropping byte outside a frame");
            return DecodeStatus::NeedsMore;
        }

        if self.escape_pending {
            self.escape_pending = false;
            self.store(byte ^ ESCAPE_MASK);
        } else if byte == ESCAPE {
            self.escape_pending = true;
        } else if byte > ESCAPE {
            self.fault("unexpected reserved byte");
        } else {
            self.store(byte);
        }
        DecodeStatus::NeedsMore
    }

    /// Feed a chunk of bytes and collect every completed frame.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Vec<AdapterFrame> {
        bytes
            .iter()
            .filter_map(|&byte| match self.push_received_byte(byte) {
                DecodeStatus::FrameComplete(frame) => Some(frame),
                DecodeStatus::NeedsMore => None,
            })
            .collect()
    }

    /// Number of malformed frames dropped so far.
    pub fn framing_faults(&self) -> u64 {
        self.faults
    }

    /// Forget any partial frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.in_frame = false;
        self.escape_pending = false;
        self.discarding = false;
    }

    fn store(&mut self, byte: u8) {
        if self.buffer.len() >= MAX_FRAME_LEN {
            self.fault("frame too long");
            return;
        }
        self.buffer.push(byte);
    }

    fn fault(&mut self, reason: &str) {
        self.faults += 1;
        warn!(reason, partial_len = self.buffer.len(), "Discarding malformed adapter frame");
        self.buffer.clear();
        self.escape_pending = false;
        self.discarding = true;
    }
}
