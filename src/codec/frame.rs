//! Adapter frame representation and wire encoding

use super::message_code::{FLAG_ACK, FLAG_EOM, MessageCode};
use crate::types::LogicalAddress;

/// Reserved byte opening a frame; also closes the previous one.
pub const FRAME_START: u8 = 0xFF;
/// Reserved byte announcing that the next byte is escaped.
pub const ESCAPE: u8 = 0xFD;
/// XOR mask applied to an escaped byte.
pub const ESCAPE_MASK: u8 = 0x10;
/// Longest logical frame (code byte included) accepted from the wire.
pub const MAX_FRAME_LEN: usize = 64;

/// Whether `byte` must be escaped on the wire.
///
/// Covers the frame-start and escape markers and the legacy end marker 0xFE.
pub const fn needs_escape(byte: u8) -> bool {
    byte >= ESCAPE
}

/// One frame exchanged with the USB adapter.
///
/// Byte 0 is the code byte: the [`MessageCode`] in the low six bits with the
/// EOM and ACK flags in the two high bits. The remaining bytes are data.
/// All bytes are logical (unescaped); escaping only exists in [`to_wire`].
///
/// [`to_wire`]: AdapterFrame::to_wire
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterFrame {
    bytes: Vec<u8>,
}

impl AdapterFrame {
    pub fn new(code: MessageCode) -> Self {
        Self { bytes: vec![code.as_byte()] }
    }

    pub fn with_data(code: MessageCode, data: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(1 + data.len());
        bytes.push(code.as_byte());
        bytes.extend_from_slice(data);
        Self { bytes }
    }

    /// Wrap logical bytes received from the wire.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Set or clear the EOM and ACK flags on the code byte.
    pub fn with_flags(mut self, eom: bool, ack: bool) -> Self {
        if let Some(code) = self.bytes.first_mut() {
            *code &= !(FLAG_EOM | FLAG_ACK);
            if eom {
                *code |= FLAG_EOM;
            }
            if ack {
                *code |= FLAG_ACK;
            }
        }
        self
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Data bytes after the code byte.
    pub fn data(&self) -> &[u8] {
        self.bytes.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte at `pos`, or 0 when `pos` is out of range.
    pub fn at(&self, pos: usize) -> u8 {
        self.bytes.get(pos).copied().unwrap_or(0)
    }

    /// Drop the first `n` bytes. Dropping more than the length empties the frame.
    pub fn shift(&mut self, n: usize) {
        let n = n.min(self.bytes.len());
        self.bytes.drain(..n);
    }

    /// Append all bytes of `other`, preserving order.
    pub fn append(&mut self, other: &AdapterFrame) {
        self.bytes.extend_from_slice(&other.bytes);
    }

    pub fn push_back(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    pub fn clear(&mut self) {
        self.bytes.clear();
    }

    /// Message code of this frame; unknown codes read as [`MessageCode::Nothing`].
    pub fn message(&self) -> MessageCode {
        MessageCode::from_byte(self.at(0)).unwrap_or(MessageCode::Nothing)
    }

    pub fn is_end_of_message(&self) -> bool {
        !self.is_empty()
            && (self.at(0) & FLAG_EOM != 0 || self.message() == MessageCode::TransmitEom)
    }

    pub fn is_ack(&self) -> bool {
        !self.is_empty() && self.at(0) & FLAG_ACK != 0
    }

    pub fn is_error(&self) -> bool {
        !self.is_empty() && self.message().is_error()
    }

    pub fn needs_retry(&self) -> bool {
        !self.is_empty() && self.message().needs_retry()
    }

    pub fn is_transmission(&self) -> bool {
        !self.is_empty() && self.message().is_transmission()
    }

    /// Initiator nibble of the address byte following the code byte.
    pub fn initiator(&self) -> LogicalAddress {
        LogicalAddress::from_nibble(self.at(1) >> 4)
    }

    /// Destination nibble of the address byte following the code byte.
    pub fn destination(&self) -> LogicalAddress {
        LogicalAddress::from_nibble(self.at(1))
    }

    /// Append the escaped wire form of this frame to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.bytes.len() + 2);
        out.push(FRAME_START);
        for &byte in &self.bytes {
            if needs_escape(byte) {
                out.push(ESCAPE);
                out.push(byte ^ ESCAPE_MASK);
            } else {
                out.push(byte);
            }
        }
        out.push(FRAME_START);
    }

    /// Escaped wire form: `FRAME_START`, code, data, `FRAME_START`.
    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes.len() + 2);
        self.encode_into(&mut out);
        out
    }
}

impl std::fmt::Display for AdapterFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())?;
        for byte in self.data() {
            write!(f, " {byte:02x}")?;
        }
        if self.is_ack() {
            f.write_str(" (ack)")?;
        }
        if self.at(0) & FLAG_EOM != 0 {
            f.write_str(" (eom)")?;
        }
        Ok(())
    }
}
