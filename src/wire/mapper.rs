//! Mapping between CEC commands and adapter frames

use tracing::{debug, trace};

use crate::codec::{AdapterFrame, MessageCode};
use crate::types::{CecCommand, Opcode};

/// Split a command into the frames the adapter expects for a transmission.
///
/// The first frame selects the acknowledge polarity (1 for broadcasts), then
/// every CEC byte travels in its own frame: header, opcode, operands. Only the
/// last frame uses `TRANSMIT_EOM`.
pub fn encode(command: &CecCommand) -> Vec<AdapterFrame> {
    let mut bytes = Vec::with_capacity(command.wire_len());
    bytes.push(command.header_byte());
    if let Some(opcode) = command.opcode {
        bytes.push(u8::from(opcode));
        bytes.extend_from_slice(command.operands());
    }

    let mut frames = Vec::with_capacity(bytes.len() + 1);
    frames.push(AdapterFrame::with_data(
        MessageCode::TransmitAckPolarity,
        &[u8::from(command.is_broadcast())],
    ));
    let last = bytes.len() - 1;
    for (i, byte) in bytes.into_iter().enumerate() {
        let code = if i == last { MessageCode::TransmitEom } else { MessageCode::Transmit };
        frames.push(AdapterFrame::with_data(code, &[byte]));
    }
    frames
}

/// Outcome of feeding frames to the [`CommandAssembler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    Complete(CecCommand),
    Incomplete,
}

/// Reassembles CEC commands from bus frames.
///
/// Accepts the received layout (`FRAME_START` header, `FRAME_DATA` bytes,
/// EOM flag on the last) as well as the transmit layout produced by
/// [`encode`], so a transmission can be read back.
#[derive(Debug, Default)]
pub struct CommandAssembler {
    open: Option<CecCommand>,
    expect_header: bool,
    discarded: u64,
}

impl CommandAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one frame.
    pub fn push(&mut self, frame: &AdapterFrame) -> Decoded {
        match frame.message() {
            MessageCode::FrameStart => {
                self.expect_header = false;
                self.open_header(frame)
            }
            MessageCode::TransmitAckPolarity => {
                if self.open.take().is_some() {
                    self.discard("new transmission before end of message");
                }
                self.expect_header = true;
                Decoded::Incomplete
            }
            MessageCode::Transmit | MessageCode::TransmitEom if self.expect_header => {
                self.expect_header = false;
                self.open_header(frame)
            }
            MessageCode::FrameData | MessageCode::Transmit | MessageCode::TransmitEom => {
                self.push_data(frame)
            }
            _ if frame.is_error() => {
                if self.open.take().is_some() {
                    self.discard("receive error");
                }
                self.expect_header = false;
                Decoded::Incomplete
            }
            _ => Decoded::Incomplete,
        }
    }

    /// Number of partial or headerless commands dropped.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// Whether a command is partially assembled.
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn open_header(&mut self, frame: &AdapterFrame) -> Decoded {
        if self.open.take().is_some() {
            self.discard("header before end of message");
        }
        if frame.len() < 2 {
            self.discard("header frame without address byte");
            return Decoded::Incomplete;
        }
        let mut command = CecCommand::poll(frame.initiator(), frame.destination());
        command.ack = frame.is_ack();
        trace!(header = format_args!("{:02x}", frame.at(1)), "Command header");
        if frame.is_end_of_message() {
            command.eom = true;
            return Decoded::Complete(command);
        }
        self.open = Some(command);
        Decoded::Incomplete
    }

    fn push_data(&mut self, frame: &AdapterFrame) -> Decoded {
        let Some(command) = self.open.as_mut() else {
            self.discard("data frame without open header");
            return Decoded::Incomplete;
        };
        if frame.len() < 2 {
            self.open = None;
            self.discard("data frame without data byte");
            return Decoded::Incomplete;
        }

        let byte = frame.at(1);
        command.ack = frame.is_ack();
        if command.opcode.is_none() {
            command.opcode = Some(Opcode::from(byte));
        } else if command.push_operand(byte).is_err() {
            self.open = None;
            self.discard("too many operands");
            return Decoded::Incomplete;
        }

        if frame.is_end_of_message() {
            if let Some(mut command) = self.open.take() {
                command.eom = true;
                return Decoded::Complete(command);
            }
        }
        Decoded::Incomplete
    }

    fn discard(&mut self, reason: &str) {
        self.discarded += 1;
        debug!(reason, "Discarding malformed command frames");
    }
}

/// Decode the first complete command in `frames`.
pub fn decode<'a>(frames: impl IntoIterator<Item = &'a AdapterFrame>) -> Decoded {
    let mut assembler = CommandAssembler::new();
    for frame in frames {
        if let Decoded::Complete(command) = assembler.push(frame) {
            return Decoded::Complete(command);
        }
    }
    Decoded::Incomplete
}
