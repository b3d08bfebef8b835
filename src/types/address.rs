//! Logical addresses on the CEC bus

use serde::{Deserialize, Serialize};

use crate::{CecError, Result};

/// 4-bit logical address identifying a device role on the bus.
///
/// Address 15 is both the broadcast destination and the "unregistered"
/// initiator address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum LogicalAddress {
    Tv,
    Recording1,
    Recording2,
    Tuner1,
    Playback1,
    AudioSystem,
    Tuner2,
    Tuner3,
    Playback2,
    Recording3,
    Tuner4,
    Playback3,
    Reserved1,
    Reserved2,
    FreeUse,
    Broadcast,
}

impl LogicalAddress {
    /// All addresses in numeric order.
    pub const ALL: [LogicalAddress; 16] = [
        LogicalAddress::Tv,
        LogicalAddress::Recording1,
        LogicalAddress::Recording2,
        LogicalAddress::Tuner1,
        LogicalAddress::Playback1,
        LogicalAddress::AudioSystem,
        LogicalAddress::Tuner2,
        LogicalAddress::Tuner3,
        LogicalAddress::Playback2,
        LogicalAddress::Recording3,
        LogicalAddress::Tuner4,
        LogicalAddress::Playback3,
        LogicalAddress::Reserved1,
        LogicalAddress::Reserved2,
        LogicalAddress::FreeUse,
        LogicalAddress::Broadcast,
    ];

    /// Alias of [`LogicalAddress::Broadcast`] used as an initiator.
    pub const UNREGISTERED: LogicalAddress = LogicalAddress::Broadcast;

    /// Build an address from the low nibble of `value`.
    pub const fn from_nibble(value: u8) -> Self {
        Self::ALL[(value & 0x0F) as usize]
    }

    /// Index of this address in a 16-entry table.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_broadcast(self) -> bool {
        matches!(self, LogicalAddress::Broadcast)
    }

    /// Bit of this address in the adapter's acknowledge mask.
    pub const fn mask_bit(self) -> u16 {
        1 << (self as u16)
    }

    /// Device type byte reported with `ReportPhysicalAddress`.
    pub const fn device_type(self) -> u8 {
        match self {
            LogicalAddress::Tv => 0,
            LogicalAddress::Recording1 | LogicalAddress::Recording2 | LogicalAddress::Recording3 => 1,
            LogicalAddress::Tuner1
            | LogicalAddress::Tuner2
            | LogicalAddress::Tuner3
            | LogicalAddress::Tuner4 => 3,
            LogicalAddress::Playback1 | LogicalAddress::Playback2 | LogicalAddress::Playback3 => 4,
            LogicalAddress::AudioSystem => 5,
            _ => 2,
        }
    }
}

impl TryFrom<u8> for LogicalAddress {
    type Error = CecError;

    fn try_from(value: u8) -> Result<Self> {
        if value > 0x0F {
            return Err(CecError::InvalidAddress { value });
        }
        Ok(Self::from_nibble(value))
    }
}

impl From<LogicalAddress> for u8 {
    fn from(address: LogicalAddress) -> u8 {
        address as u8
    }
}

impl std::fmt::Display for LogicalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:X}", *self as u8)
    }
}
