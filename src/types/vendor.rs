//! IEEE OUI vendor identifiers

use serde::{Deserialize, Serialize};

/// 24-bit vendor identifier announced with `DeviceVendorId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VendorId(pub u32);

impl VendorId {
    pub const UNKNOWN: VendorId = VendorId(0);
    pub const SAMSUNG: VendorId = VendorId(0x0000F0);
    pub const LG: VendorId = VendorId(0x00E091);
    pub const PANASONIC: VendorId = VendorId(0x008045);
    pub const PHILIPS: VendorId = VendorId(0x00903E);
    pub const SHARP: VendorId = VendorId(0x08001F);

    pub fn is_known(self) -> bool {
        self != VendorId::UNKNOWN
    }

    /// Decode the three big-endian operand bytes of `DeviceVendorId`.
    ///
    /// Returns `None` when fewer than three bytes are present.
    pub fn from_operands(operands: &[u8]) -> Option<Self> {
        match operands {
            [a, b, c, ..] => Some(VendorId(u32::from_be_bytes([0, *a, *b, *c]))),
            _ => None,
        }
    }

    pub fn to_operands(self) -> [u8; 3] {
        let [_, a, b, c] = self.0.to_be_bytes();
        [a, b, c]
    }

    pub fn name(self) -> &'static str {
        match self {
            VendorId::SAMSUNG => "Samsung",
            VendorId::LG => "LG",
            VendorId::PANASONIC => "Panasonic",
            VendorId::PHILIPS => "Philips",
            VendorId::SHARP => "Sharp",
            VendorId::UNKNOWN => "unknown",
            _ => "other",
        }
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:#08x})", self.name(), self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_are_big_endian() {
        assert_eq!(VendorId::from_operands(&[0x00, 0x00, 0xF0]), Some(VendorId::SAMSUNG));
        assert_eq!(VendorId::from_operands(&[0x00, 0xE0, 0x91, 0xAA]), Some(VendorId::LG));
        assert_eq!(VendorId::from_operands(&[0x00, 0x80]), None);
        assert_eq!(VendorId::PHILIPS.to_operands(), [0x00, 0x90, 0x3E]);
    }

    #[test]
    fn display_names_vendor() {
        assert_eq!(VendorId::SAMSUNG.to_string(), "Samsung (0x0000f0)");
        assert!(!VendorId::default().is_known());
    }
}
