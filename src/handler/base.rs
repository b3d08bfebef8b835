//! Vendor-agnostic opcode table

use tracing::{debug, warn};

use super::keys::{self, RepeatPolicy};
use super::HandledOutcome;
use crate::bus::BusState;
use crate::types::{
    AbortReason, CecCommand, CecVersion, LogicalAddress, Opcode, PowerStatus, VendorId,
};

pub(super) fn handle(bus: &mut BusState, command: &CecCommand) -> HandledOutcome {
    let Some(opcode) = command.opcode else {
        return HandledOutcome::Handled;
    };
    let from = command.initiator;

    let outcome = match opcode {
        Opcode::ReportPowerStatus => match command.operands().first() {
            Some(byte) => {
                bus.set_power_status(from, PowerStatus::from_byte(*byte));
                HandledOutcome::Handled
            }
            None => HandledOutcome::InvalidParameters,
        },
        Opcode::GiveDevicePowerStatus => {
            let status = bus.device(bus.our_address()).current_power_status();
            send(bus, from, Opcode::ReportPowerStatus, &[status.to_byte()]);
            HandledOutcome::Handled
        }
        Opcode::CecVersion => match command.operands().first() {
            Some(byte) => {
                bus.device_mut(from).set_cec_version(CecVersion::from(*byte));
                HandledOutcome::Handled
            }
            None => HandledOutcome::InvalidParameters,
        },
        Opcode::GetCecVersion => {
            let version = bus.config().cec_version;
            send(bus, from, Opcode::CecVersion, &[version]);
            HandledOutcome::Handled
        }
        Opcode::SetMenuLanguage => {
            if command.operands().len() < 3 {
                return HandledOutcome::InvalidParameters;
            }
            let language = String::from_utf8_lossy(&command.operands()[..3]).into_owned();
            bus.device_mut(from).set_menu_language(language);
            HandledOutcome::Handled
        }
        Opcode::GetMenuLanguage => {
            let language = bus.config().menu_language.clone();
            send(bus, LogicalAddress::Broadcast, Opcode::SetMenuLanguage, language.as_bytes());
            HandledOutcome::Handled
        }
        Opcode::GivePhysicalAddress => {
            let [hi, lo] = bus.config().physical_address_operands();
            let device_type = bus.our_address().device_type();
            send(bus, LogicalAddress::Broadcast, Opcode::ReportPhysicalAddress, &[hi, lo, device_type]);
            HandledOutcome::Handled
        }
        Opcode::ReportPhysicalAddress => match physical_address(command.operands()) {
            Some(address) => {
                bus.device_mut(from).set_physical_address(address);
                HandledOutcome::Handled
            }
            None => HandledOutcome::InvalidParameters,
        },
        Opcode::GiveOsdName => {
            let name = bus.config().osd_name.clone();
            send(bus, from, Opcode::SetOsdName, name.as_bytes());
            HandledOutcome::Handled
        }
        Opcode::SetOsdName => {
            let name = String::from_utf8_lossy(command.operands()).into_owned();
            bus.device_mut(from).set_osd_name(name);
            HandledOutcome::Handled
        }
        Opcode::GiveDeviceVendorId => {
            let vendor = bus.config().vendor_id;
            if vendor.is_known() {
                send(bus, LogicalAddress::Broadcast, Opcode::DeviceVendorId, &vendor.to_operands());
            } else {
                feature_abort(bus, command, AbortReason::Refused);
            }
            HandledOutcome::Handled
        }
        Opcode::DeviceVendorId | Opcode::VendorCommandWithId => {
            match VendorId::from_operands(command.operands()) {
                Some(vendor) => {
                    bus.set_vendor_id(from, vendor);
                    HandledOutcome::Handled
                }
                None => HandledOutcome::InvalidParameters,
            }
        }
        Opcode::MenuRequest => {
            send(bus, from, Opcode::MenuStatus, &[0x00]);
            HandledOutcome::Handled
        }
        Opcode::GiveDeckStatus => {
            feature_abort(bus, command, AbortReason::Refused);
            HandledOutcome::Handled
        }
        Opcode::UserControlPressed => keys::pressed(bus, command, RepeatPolicy::Report),
        Opcode::UserControlRelease => keys::released(bus, from),
        Opcode::ActiveSource => {
            if let Some(address) = physical_address(command.operands()) {
                bus.device_mut(from).set_physical_address(address);
            }
            bus.set_active_source(from);
            HandledOutcome::Handled
        }
        Opcode::ImageViewOn | Opcode::TextViewOn => {
            bus.set_active_source(from);
            if command.destination == bus.our_address() {
                bus.set_power_status(command.destination, PowerStatus::On);
            }
            HandledOutcome::Handled
        }
        Opcode::InactiveSource => {
            bus.device_mut(from).set_active_source(false);
            HandledOutcome::Handled
        }
        Opcode::RequestActiveSource => {
            if bus.device(bus.our_address()).is_active_source() {
                announce_active_source(bus);
            }
            HandledOutcome::Handled
        }
        Opcode::SetStreamPath => match physical_address(command.operands()) {
            Some(address) => {
                stream_path_changed(bus, address);
                HandledOutcome::Handled
            }
            None => HandledOutcome::InvalidParameters,
        },
        Opcode::RoutingChange => match command.operands().get(2..4).and_then(physical_address) {
            Some(address) => {
                stream_path_changed(bus, address);
                HandledOutcome::Handled
            }
            None => HandledOutcome::InvalidParameters,
        },
        Opcode::Standby => {
            bus.set_power_status(from, PowerStatus::Standby);
            HandledOutcome::Handled
        }
        Opcode::FeatureAbort => {
            if command.operands().is_empty() {
                return HandledOutcome::InvalidParameters;
            }
            let aborted = Opcode::from(command.operand(0));
            let reason = AbortReason::from(command.operand(1));
            debug!(from = %from, opcode = %aborted, reason = %reason, "Feature abort received");
            bus.abort_waiters(from, aborted, reason);
            HandledOutcome::Handled
        }
        Opcode::Abort => {
            feature_abort(bus, command, AbortReason::Refused);
            HandledOutcome::Handled
        }
        _ => HandledOutcome::Unhandled,
    };

    if outcome == HandledOutcome::Unhandled {
        feature_abort(bus, command, AbortReason::UnrecognizedOpcode);
    }
    outcome
}

/// Queue a command from us to `destination`.
pub(super) fn send(bus: &mut BusState, destination: LogicalAddress, opcode: Opcode, operands: &[u8]) {
    match CecCommand::with_operands(bus.our_address(), destination, opcode, operands) {
        Ok(reply) => bus.enqueue(reply),
        Err(e) => warn!(opcode = %opcode, error = %e, "Dropping reply"),
    }
}

/// Answer a directed command with `FeatureAbort`. Broadcasts are never answered.
pub(super) fn feature_abort(bus: &mut BusState, command: &CecCommand, reason: AbortReason) {
    let Some(opcode) = command.opcode else { return };
    if command.is_broadcast() || opcode == Opcode::FeatureAbort {
        return;
    }
    debug!(to = %command.initiator, opcode = %opcode, reason = %reason, "Sending feature abort");
    send(bus, command.initiator, Opcode::FeatureAbort, &[u8::from(opcode), u8::from(reason)]);
}

/// Mark us active and broadcast `ActiveSource` with our physical address.
pub(super) fn announce_active_source(bus: &mut BusState) {
    let ours = bus.our_address();
    bus.set_active_source(ours);
    let operands = bus.config().physical_address_operands();
    send(bus, LogicalAddress::Broadcast, Opcode::ActiveSource, &operands);
}

/// Take over as active source when the new stream path points at us.
/// Returns whether it did.
pub(super) fn stream_path_changed(bus: &mut BusState, address: u16) -> bool {
    if address != bus.config().physical_address {
        return false;
    }
    announce_active_source(bus);
    true
}

pub(super) fn physical_address(operands: &[u8]) -> Option<u16> {
    match operands {
        [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
        _ => None,
    }
}
