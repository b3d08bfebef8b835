//! Vendor-specific overrides of the base opcode table

use tracing::debug;

use super::keys::{self, RepeatPolicy};
use super::{base, HandledOutcome};
use crate::bus::BusState;
use crate::types::{CecCommand, LogicalAddress, Opcode, PowerStatus, UserControlCode, VendorId};

/// Samsung vendor query and its fixed answer, after the vendor id bytes.
const SAMSUNG_QUERY: u8 = 0x23;
const SAMSUNG_ANSWER: [u8; 3] = [0x24, 0x00, 0x80];

const LG_QUERY: [u8; 1] = [0xA0];
const LG_ANSWER: [u8; 2] = [0x02, 0x05];

/// Firmware family of a device, selected from its announced vendor id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VendorVariant {
    #[default]
    Generic,
    Samsung,
    Lg,
    Panasonic,
    Philips,
    Sharp,
}

impl VendorVariant {
    pub fn for_vendor(vendor: VendorId) -> Self {
        match vendor {
            VendorId::SAMSUNG => VendorVariant::Samsung,
            VendorId::LG => VendorVariant::Lg,
            VendorId::PANASONIC => VendorVariant::Panasonic,
            VendorId::PHILIPS => VendorVariant::Philips,
            VendorId::SHARP => VendorVariant::Sharp,
            _ => VendorVariant::Generic,
        }
    }

    /// Displays that resend key presses instead of holding them.
    pub(super) fn repeat_policy(self) -> RepeatPolicy {
        match self {
            VendorVariant::Samsung | VendorVariant::Philips => RepeatPolicy::SynthesizeRelease,
            _ => RepeatPolicy::Report,
        }
    }

    /// Whether `power_on` is followed by a delayed power status check.
    pub(super) fn confirms_power_on(self) -> bool {
        self == VendorVariant::Sharp
    }

    /// Whether the display drops active source announcements while booting.
    pub(super) fn polls_image_view_on(self) -> bool {
        self == VendorVariant::Philips
    }

    /// Key used to wake a non-TV device.
    pub(super) fn power_on_key(self, destination: LogicalAddress) -> UserControlCode {
        match (self, destination) {
            (VendorVariant::Samsung, LogicalAddress::AudioSystem) => UserControlCode::PowerOnFunction,
            _ => UserControlCode::Power,
        }
    }
}

/// Run the override for `command`, if the variant has one.
///
/// `None` means the base table decides.
pub(super) fn handle(
    variant: VendorVariant,
    bus: &mut BusState,
    command: &CecCommand,
) -> Option<HandledOutcome> {
    let opcode = command.opcode?;
    match (variant, opcode) {
        (VendorVariant::Samsung | VendorVariant::Philips, Opcode::UserControlPressed) => {
            Some(keys::pressed(bus, command, variant.repeat_policy()))
        }
        (VendorVariant::Samsung, Opcode::VendorRemoteButtonDown) => {
            Some(keys::pressed(bus, command, RepeatPolicy::Report))
        }
        (VendorVariant::Samsung, Opcode::VendorRemoteButtonUp) => {
            Some(keys::released(bus, command.initiator))
        }
        (VendorVariant::Samsung, Opcode::VendorCommandWithId) => samsung_vendor_query(bus, command),
        (VendorVariant::Samsung, Opcode::SetMenuLanguage)
            if command.initiator == LogicalAddress::Tv =>
        {
            bus.set_power_status(LogicalAddress::Tv, PowerStatus::On);
            None
        }
        (VendorVariant::Philips, Opcode::DeviceVendorId) => {
            bus.set_power_status(command.initiator, PowerStatus::On);
            None
        }
        (VendorVariant::Lg, Opcode::VendorCommand) if command.operands() == LG_QUERY => {
            debug!(from = %command.initiator, "Answering LG vendor query");
            base::send(bus, command.initiator, Opcode::VendorCommand, &LG_ANSWER);
            Some(HandledOutcome::Handled)
        }
        (VendorVariant::Panasonic, Opcode::SetStreamPath) => {
            let address = base::physical_address(command.operands())?;
            if !base::stream_path_changed(bus, address) {
                return None;
            }
            base::send(bus, command.initiator, Opcode::ImageViewOn, &[]);
            base::send(bus, command.initiator, Opcode::MenuStatus, &[0x00]);
            Some(HandledOutcome::Handled)
        }
        _ => None,
    }
}

fn samsung_vendor_query(bus: &mut BusState, command: &CecCommand) -> Option<HandledOutcome> {
    let operands = command.operands();
    if operands.len() != 4 || VendorId::from_operands(operands) != Some(VendorId::SAMSUNG) {
        return None;
    }
    if operands[3] != SAMSUNG_QUERY {
        return None;
    }
    debug!(from = %command.initiator, "Answering Samsung vendor query");
    let mut answer = VendorId::SAMSUNG.to_operands().to_vec();
    answer.extend_from_slice(&SAMSUNG_ANSWER);
    base::send(bus, command.initiator, Opcode::VendorCommandWithId, &answer);
    Some(HandledOutcome::Handled)
}
