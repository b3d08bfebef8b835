//! Remote key press tracking

use tracing::{debug, trace};

use super::HandledOutcome;
use crate::bus::{BusEvent, BusState};
use crate::types::{CecCommand, LogicalAddress, Opcode, UserControlCode};

/// How a handler treats a press of the key that is already held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum RepeatPolicy {
    /// Every press is reported as is.
    Report,
    /// The display resends presses instead of holding: allow-listed keys get
    /// a synthetic release between the two presses, other keys are swallowed.
    SynthesizeRelease,
}

pub(super) fn pressed(bus: &mut BusState, command: &CecCommand, policy: RepeatPolicy) -> HandledOutcome {
    if command.operands().is_empty() {
        return HandledOutcome::InvalidParameters;
    }
    press(bus, command.initiator, UserControlCode::from(command.operand(0)), policy)
}

pub(super) fn press(
    bus: &mut BusState,
    from: LogicalAddress,
    key: UserControlCode,
    policy: RepeatPolicy,
) -> HandledOutcome {
    let held = bus.device(from).handler().last_key();
    if policy == RepeatPolicy::SynthesizeRelease && held == Some(key) {
        if !key.is_repeatable() {
            trace!(from = %from, key = %key, "Swallowing repeated key");
            return HandledOutcome::Handled;
        }
        debug!(from = %from, key = %key, "Synthesizing release for repeated key");
        let release = CecCommand::new(bus.our_address(), from, Opcode::UserControlRelease);
        bus.enqueue(release);
        bus.publish(BusEvent::KeyReleased { from, key: Some(key), synthetic: true });
    }

    bus.device_mut(from).handler_mut().set_last_key(Some(key));
    bus.publish(BusEvent::KeyPressed { from, key });
    HandledOutcome::Handled
}

pub(super) fn released(bus: &mut BusState, from: LogicalAddress) -> HandledOutcome {
    let key = bus.device(from).handler().last_key();
    bus.device_mut(from).handler_mut().set_last_key(None);
    bus.publish(BusEvent::KeyReleased { from, key, synthetic: false });
    HandledOutcome::Handled
}
