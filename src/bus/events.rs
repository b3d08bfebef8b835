//! Events published by the bus

use crate::types::{CecCommand, LogicalAddress, PowerStatus, UserControlCode, VendorId};

/// Something observable happened on the bus.
///
/// Delivered through [`Bus::events`](super::Bus::events). Slow subscribers
/// miss events rather than stall the reader.
#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BusEvent {
    /// A complete command arrived from the bus, before it was handled.
    CommandReceived(CecCommand),
    KeyPressed { from: LogicalAddress, key: UserControlCode },
    /// `synthetic` is set when the release was generated locally for a
    /// remote that repeats presses instead of sending releases.
    KeyReleased { from: LogicalAddress, key: Option<UserControlCode>, synthetic: bool },
    PowerStatusChanged { address: LogicalAddress, from: PowerStatus, to: PowerStatus },
    VendorChanged { address: LogicalAddress, vendor: VendorId },
    ActiveSourceChanged { address: LogicalAddress },
    /// A vendor firmware anomaly worth the user's attention.
    Diagnostic { address: LogicalAddress, message: String },
    TransmitFailed { command: CecCommand, attempts: u8 },
    TransportClosed,
}
