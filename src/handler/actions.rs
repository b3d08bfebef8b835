//! Power, standby and active source operations

use std::sync::Arc;

use tracing::{debug, info};

use super::checks;
use super::transmit::transmit;
use crate::bus::BusShared;
use crate::types::{CecCommand, LogicalAddress, Opcode, PowerStatus, UserControlCode};
use crate::Result;

/// Wake `destination`.
///
/// The TV is woken with `ImageViewOn`, other devices with a power key press
/// and release. Handlers that confirm power on follow up with a delayed
/// check that asks the device for its power status.
pub(crate) async fn power_on(
    shared: &Arc<BusShared>,
    initiator: LogicalAddress,
    destination: LogicalAddress,
) -> Result<()> {
    let (variant, was_on) = {
        let state = shared.lock_state();
        let device = state.device(destination);
        (device.handler().variant(), device.current_power_status() == PowerStatus::On)
    };
    info!(initiator = %initiator, destination = %destination, ?variant, "Powering on");

    if destination == LogicalAddress::Tv {
        transmit(shared, CecCommand::new(initiator, destination, Opcode::ImageViewOn), true).await?;
    } else {
        let key = variant.power_on_key(destination);
        send_keypress(shared, initiator, destination, key, true).await?;
        send_key_release(shared, initiator, destination, true).await?;
    }

    if variant.confirms_power_on() && !was_on {
        checks::start_power_on_check(shared, destination);
    }
    Ok(())
}

pub(crate) async fn standby(
    shared: &Arc<BusShared>,
    initiator: LogicalAddress,
    destination: LogicalAddress,
) -> Result<()> {
    info!(initiator = %initiator, destination = %destination, "Sending standby");
    transmit(shared, CecCommand::new(initiator, destination, Opcode::Standby), true).await
}

/// Announce us as the active source.
///
/// A TV that drops announcements while booting is polled until it reports
/// power on.
pub(crate) async fn activate_source(shared: &Arc<BusShared>) -> Result<()> {
    let (ours, tv_variant, tv_on) = {
        let mut state = shared.lock_state();
        let ours = state.our_address();
        state.set_active_source(ours);
        state.set_power_status(ours, PowerStatus::On);
        let tv = state.device(LogicalAddress::Tv);
        (ours, tv.handler().variant(), tv.current_power_status() == PowerStatus::On)
    };

    let operands = shared.config.physical_address_operands();
    let announcement = CecCommand::with_operands(ours, LogicalAddress::Broadcast, Opcode::ActiveSource, &operands)?;
    transmit(shared, announcement.clone(), true).await?;

    if ours != LogicalAddress::Tv && tv_variant.polls_image_view_on() && !tv_on {
        debug!("TV is not on yet");
        checks::start_image_view_on_poll(shared, announcement);
    }
    Ok(())
}

pub(crate) async fn send_keypress(
    shared: &Arc<BusShared>,
    initiator: LogicalAddress,
    destination: LogicalAddress,
    key: UserControlCode,
    wait_for_ack: bool,
) -> Result<()> {
    let press = CecCommand::with_operands(initiator, destination, Opcode::UserControlPressed, &[u8::from(key)])?;
    transmit(shared, press, wait_for_ack).await
}

pub(crate) async fn send_key_release(
    shared: &Arc<BusShared>,
    initiator: LogicalAddress,
    destination: LogicalAddress,
    wait_for_ack: bool,
) -> Result<()> {
    transmit(shared, CecCommand::new(initiator, destination, Opcode::UserControlRelease), wait_for_ack).await
}
