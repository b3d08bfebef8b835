//! Power status and CEC version values

use serde::{Deserialize, Serialize};

/// Power status reported by `ReportPowerStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerStatus {
    On,
    Standby,
    InTransitionStandbyToOn,
    InTransitionOnToStandby,
    #[default]
    Unknown,
}

impl PowerStatus {
    pub const fn to_byte(self) -> u8 {
        match self {
            PowerStatus::On => 0x00,
            PowerStatus::Standby => 0x01,
            PowerStatus::InTransitionStandbyToOn => 0x02,
            PowerStatus::InTransitionOnToStandby => 0x03,
            PowerStatus::Unknown => 0x99,
        }
    }

    /// Decode a power status operand. Out of range values map to `Unknown`.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            0x00 => PowerStatus::On,
            0x01 => PowerStatus::Standby,
            0x02 => PowerStatus::InTransitionStandbyToOn,
            0x03 => PowerStatus::InTransitionOnToStandby,
            _ => PowerStatus::Unknown,
        }
    }
}

impl std::fmt::Display for PowerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PowerStatus::On => "on",
            PowerStatus::Standby => "standby",
            PowerStatus::InTransitionStandbyToOn => "in transition from standby to on",
            PowerStatus::InTransitionOnToStandby => "in transition from on to standby",
            PowerStatus::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

byte_enum! {
    /// CEC version reported by `CecVersion`.
    pub enum CecVersion {
        V1_2 = 0x01,
        V1_2a = 0x02,
        V1_3 = 0x03,
        V1_3a = 0x04,
        V1_4 = 0x05,
        V2_0 = 0x06,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn power_status_bytes() {
        for status in [
            PowerStatus::On,
            PowerStatus::Standby,
            PowerStatus::InTransitionStandbyToOn,
            PowerStatus::InTransitionOnToStandby,
            PowerStatus::Unknown,
        ] {
            assert_eq!(PowerStatus::from_byte(status.to_byte()), status);
        }
        assert_eq!(PowerStatus::from_byte(0x42), PowerStatus::Unknown);
    }
}
