//! CEC command representation

use std::time::Duration;

use super::{LogicalAddress, Opcode};
use crate::{CecError, Result};

/// Maximum number of operand bytes after the opcode.
pub const MAX_OPERANDS: usize = 14;

/// Default per-attempt acknowledgement wait.
const DEFAULT_TRANSMIT_TIMEOUT: Duration = Duration::from_millis(1000);

/// One CEC message between two logical addresses.
///
/// A command without an opcode is a poll: it only checks whether the
/// destination acknowledges its address and never carries operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CecCommand {
    pub initiator: LogicalAddress,
    pub destination: LogicalAddress,
    pub opcode: Option<Opcode>,
    operands: Vec<u8>,
    /// Acknowledge bit as seen on the bus for received commands.
    pub ack: bool,
    /// End-of-message bit as seen on the bus for received commands.
    pub eom: bool,
    /// How long each transmit attempt waits for the adapter's acknowledgement.
    pub transmit_timeout: Duration,
}

impl CecCommand {
    pub fn new(initiator: LogicalAddress, destination: LogicalAddress, opcode: Opcode) -> Self {
        Self {
            initiator,
            destination,
            opcode: Some(opcode),
            operands: Vec::new(),
            ack: false,
            eom: false,
            transmit_timeout: DEFAULT_TRANSMIT_TIMEOUT,
        }
    }

    /// Build a poll: addressing only, no opcode.
    pub fn poll(initiator: LogicalAddress, destination: LogicalAddress) -> Self {
        Self {
            initiator,
            destination,
            opcode: None,
            operands: Vec::new(),
            ack: false,
            eom: false,
            transmit_timeout: DEFAULT_TRANSMIT_TIMEOUT,
        }
    }

    /// Build a command with operands.
    pub fn with_operands(
        initiator: LogicalAddress,
        destination: LogicalAddress,
        opcode: Opcode,
        operands: &[u8],
    ) -> Result<Self> {
        let mut cmd = Self::new(initiator, destination, opcode);
        for byte in operands {
            cmd.push_operand(*byte)?;
        }
        Ok(cmd)
    }

    /// Append one operand byte.
    ///
    /// Fails on a poll and once [`MAX_OPERANDS`] bytes are present.
    pub fn push_operand(&mut self, byte: u8) -> Result<()> {
        if self.opcode.is_none() {
            return Err(CecError::invalid_command("a poll carries no operands"));
        }
        if self.operands.len() >= MAX_OPERANDS {
            return Err(CecError::invalid_command(format!(
                "more than {MAX_OPERANDS} operands"
            )));
        }
        self.operands.push(byte);
        Ok(())
    }

    pub fn operands(&self) -> &[u8] {
        &self.operands
    }

    /// Operand at `pos`, or 0 when absent.
    pub fn operand(&self, pos: usize) -> u8 {
        self.operands.get(pos).copied().unwrap_or(0)
    }

    pub fn is_poll(&self) -> bool {
        self.opcode.is_none()
    }

    pub fn is_broadcast(&self) -> bool {
        self.destination.is_broadcast()
    }

    /// Addressing byte: initiator in the high nibble, destination in the low.
    pub fn header_byte(&self) -> u8 {
        (u8::from(self.initiator) << 4) | u8::from(self.destination)
    }

    /// Build a reply from `from` back to this command's initiator.
    pub fn reply(&self, from: LogicalAddress, opcode: Opcode) -> Self {
        Self::new(from, self.initiator, opcode)
    }

    /// Number of CEC bytes on the bus: header, opcode and operands.
    pub fn wire_len(&self) -> usize {
        1 + usize::from(self.opcode.is_some()) + self.operands.len()
    }

    pub(crate) fn set_transmit_timeout(&mut self, timeout: Duration) {
        self.transmit_timeout = timeout;
    }
}

impl std::fmt::Display for CecCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.initiator, self.destination)?;
        if let Some(opcode) = self.opcode {
            write!(f, ":{:02x}", u8::from(opcode))?;
        }
        for byte in &self.operands {
            write!(f, ":{byte:02x}")?;
        }
        Ok(())
    }
}
