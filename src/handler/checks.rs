//! Background consistency checks for misbehaving displays
//!
//! Checks run as handler tasks. They hold a `Weak` reference to the bus and
//! the owning handler's cancellation token, and take the bus lock only after
//! waking. A replaced handler's checks observe cancellation immediately.
//! The power-on check upgrades its reference only for its status query.

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::transmit::request;
use crate::bus::BusShared;
use crate::types::{CecCommand, LogicalAddress, Opcode, PowerStatus};

pub(super) const POWER_ON_CHECK: &str = "power-on-check";
pub(super) const IMAGE_VIEW_ON_POLL: &str = "image-view-on-poll";

/// Confirm `address` reached power on after `delay`.
///
/// Starts only when no check is running for the device. After the delay the
/// check asks the device for its power status; that query is the only
/// command it sends. A device that does not answer on yields a single
/// diagnostic and the caller decides whether to wake it again.
pub(super) fn start_power_on_check(shared: &Arc<BusShared>, address: LogicalAddress) {
    let delay = shared.config.power_on_check_delay();
    let weak = Arc::downgrade(shared);
    let mut state = shared.lock_state();
    let handler = state.device_mut(address).handler_mut();
    if handler.has_task(POWER_ON_CHECK) {
        debug!(address = %address, "Power-on check already running");
        return;
    }
    let cancel = handler.cancel_token();
    handler.spawn_task(POWER_ON_CHECK, power_on_check(weak, cancel, address, delay));
}

async fn power_on_check(
    shared: Weak<BusShared>,
    cancel: CancellationToken,
    address: LogicalAddress,
    delay: Duration,
) {
    tokio::select! {
        _ = cancel.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }
    let Some(shared) = shared.upgrade() else { return };
    let query = CecCommand::new(shared.config.logical_address, address, Opcode::GiveDevicePowerStatus);
    let answer = tokio::select! {
        _ = cancel.cancelled() => return,
        answer = request(&shared, query) => answer,
    };

    let state = shared.lock_state();
    if cancel.is_cancelled() {
        return;
    }
    let status = match answer {
        Ok(reply) => reply.operands().first().map_or(PowerStatus::Unknown, |b| PowerStatus::from_byte(*b)),
        Err(e) => {
            state.diagnostic(
                address,
                format!("device {address} did not report its power status after {delay:?}: {e}"),
            );
            return;
        }
    };
    if status == PowerStatus::On {
        debug!(address = %address, "Power-on confirmed");
        return;
    }
    state.diagnostic(
        address,
        format!("device {address} did not power on after {delay:?}, power status is {status}"),
    );
}

/// Keep announcing `announcement` to the TV until it reports power on.
///
/// The announcement is also deferred on the TV handler so it goes out once
/// more when the TV finally reports on.
pub(super) fn start_image_view_on_poll(shared: &Arc<BusShared>, announcement: CecCommand) {
    let interval = shared.config.active_source_interval();
    let weak = Arc::downgrade(shared);
    let mut state = shared.lock_state();
    let handler = state.device_mut(LogicalAddress::Tv).handler_mut();
    handler.defer_until_on(announcement);
    handler.config_mut().active_source_pending = Some(Instant::now() + interval);
    if handler.has_task(IMAGE_VIEW_ON_POLL) {
        return;
    }
    let cancel = handler.cancel_token();
    info!(interval = ?interval, "Polling TV until it reports power on");
    handler.spawn_task(IMAGE_VIEW_ON_POLL, image_view_on_poll(weak, cancel, interval));
}

async fn image_view_on_poll(shared: Weak<BusShared>, cancel: CancellationToken, interval: Duration) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(interval) => {}
        }
        let Some(shared) = shared.upgrade() else { return };
        let mut state = shared.lock_state();
        if cancel.is_cancelled() {
            return;
        }

        let ours = state.our_address();
        let tv = LogicalAddress::Tv;
        let tv_status = state.device(tv).current_power_status();
        let tv_on = tv_status == PowerStatus::On;
        if tv_on || !state.device(ours).is_active_source() {
            debug!(tv_on, "Stopping image view on poll");
            state.device_mut(tv).handler_mut().config_mut().active_source_pending = None;
            return;
        }

        if tv_status == PowerStatus::InTransitionStandbyToOn {
            // Booting; only ask for its status.
            debug!("TV is powering on, waiting before announcing again");
        } else {
            debug!("TV not on yet, announcing active source again");
            let operands = state.config().physical_address_operands();
            state.enqueue(CecCommand::new(ours, tv, Opcode::ImageViewOn));
            match CecCommand::with_operands(ours, LogicalAddress::Broadcast, Opcode::ActiveSource, &operands) {
                Ok(announce) => state.enqueue(announce),
                Err(e) => debug!(error = %e, "Skipping active source announcement"),
            }
        }
        state.enqueue(CecCommand::new(ours, tv, Opcode::GiveDevicePowerStatus));
        state.device_mut(tv).handler_mut().config_mut().active_source_pending =
            Some(Instant::now() + interval);
    }
}
