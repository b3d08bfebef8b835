//! Core CEC protocol types.
//!
//! These types model the values carried on the CEC bus itself, independent of
//! the USB adapter that bridges the bus to the host:
//! - [`LogicalAddress`] is the 4-bit role of a device on the bus
//! - [`Opcode`] identifies a CEC command, [`UserControlCode`] a remote key
//! - [`PowerStatus`], [`CecVersion`] and [`VendorId`] are learned per device
//! - [`CecCommand`] is one complete CEC message between two logical addresses
//!
//! ## Usage Example
//!
//! ```rust
//! use cecbridge::types::{CecCommand, LogicalAddress, Opcode};
//!
//! let cmd = CecCommand::new(LogicalAddress::Playback1, LogicalAddress::Tv, Opcode::GiveDevicePowerStatus);
//! assert_eq!(cmd.header_byte(), 0x40);
//! assert_eq!(Opcode::GiveDevicePowerStatus.expected_reply(), Some(Opcode::ReportPowerStatus));
//! ```

/// Declares a byte-valued enum with an `Unknown(u8)` catch-all so every wire
/// byte converts losslessly in both directions.
macro_rules! byte_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )*
            /// A value without a name in this crate.
            Unknown(u8),
        }

        impl From<u8> for $name {
            fn from(value: u8) -> Self {
                match value {
                    $( $value => $name::$variant, )*
                    other => $name::Unknown(other),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                match value {
                    $( $name::$variant => $value, )*
                    $name::Unknown(other) => other,
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{:?} ({:#04x})", self, u8::from(*self))
            }
        }
    };
}

mod address;
mod command;
mod opcode;
mod power;
mod user_control;
mod vendor;

pub use address::LogicalAddress;
pub use command::{CecCommand, MAX_OPERANDS};
pub use opcode::{AbortReason, Opcode};
pub use power::{CecVersion, PowerStatus};
pub use user_control::UserControlCode;
pub use vendor::VendorId;
