//! Outbound commands and response waits

use std::sync::Arc;

use tracing::{debug, warn};

use super::TransmitState;
use crate::bus::{BusEvent, BusShared, TransmitPolicy, WaitOutcome};
use crate::types::{CecCommand, LogicalAddress};
use crate::{CecError, Result};

/// Device whose handler owns an outbound command.
fn target(command: &CecCommand) -> LogicalAddress {
    if command.is_broadcast() { command.initiator } else { command.destination }
}

fn set_state(shared: &BusShared, address: LogicalAddress, state: TransmitState) {
    shared.lock_state().device_mut(address).handler_mut().set_transmit_state(state);
}

fn policy_for(shared: &BusShared, address: LogicalAddress) -> TransmitPolicy {
    let state = shared.lock_state();
    let config = state.device(address).handler().config();
    TransmitPolicy {
        transmit_timeout: config.transmit_timeout,
        max_tries: config.max_tries,
        retry_wait: shared.config.retry_wait(),
        line_timeout: shared.config.line_timeout,
        retry_line_timeout: shared.config.retry_line_timeout,
    }
}

/// Transmit `command` with the owning handler's timeout and retry policy.
///
/// With `wait_for_ack` unset the command is handed to the writer task and
/// the handler goes straight to `Done`.
pub(crate) async fn transmit(shared: &Arc<BusShared>, command: CecCommand, wait_for_ack: bool) -> Result<()> {
    deliver(shared, command, wait_for_ack, false).await
}

async fn deliver(
    shared: &Arc<BusShared>,
    mut command: CecCommand,
    wait_for_ack: bool,
    awaits_response: bool,
) -> Result<()> {
    let address = target(&command);
    let policy = policy_for(shared, address);
    command.set_transmit_timeout(policy.transmit_timeout);

    if !wait_for_ack {
        let mut state = shared.lock_state();
        if state.is_closed() {
            return Err(CecError::Closed);
        }
        state.enqueue(command);
        state.device_mut(address).handler_mut().set_transmit_state(TransmitState::Done);
        return Ok(());
    }

    let result = shared.send_command(&command, &policy, |s| set_state(shared, address, s)).await;
    match result {
        Ok(attempts) => {
            debug!(command = %command, attempts, "Transmitted");
            let next = if awaits_response && !command.is_poll() {
                TransmitState::AwaitingResponse
            } else {
                TransmitState::Done
            };
            set_state(shared, address, next);
            Ok(())
        }
        Err(e) => {
            set_state(shared, address, TransmitState::Failed);
            warn!(command = %command, error = %e, "Transmit failed");
            if let CecError::TransmitFailed { attempts, .. } = &e {
                shared
                    .lock_state()
                    .publish(BusEvent::TransmitFailed { command, attempts: *attempts });
            }
            Err(e)
        }
    }
}

/// Transmit a request and wait for the reply opcode it expects.
///
/// Ends early with [`CecError::FeatureAbort`] when the destination aborts
/// the request.
pub(crate) async fn request(shared: &Arc<BusShared>, command: CecCommand) -> Result<CecCommand> {
    let Some((request, expected)) = command.opcode.and_then(|op| op.expected_reply().map(|reply| (op, reply)))
    else {
        return Err(CecError::invalid_command(format!("{command} does not expect a reply")));
    };
    let address = target(&command);
    let from = (!command.is_broadcast()).then_some(command.destination);
    let mut rx = shared.lock_state().register_waiter(from, request, expected);

    deliver(shared, command, true, true).await?;

    let timeout = shared.config.response_timeout();
    let outcome = tokio::time::timeout(timeout, &mut rx).await;
    let (state, result) = match outcome {
        Ok(Ok(WaitOutcome::Reply(reply))) => (TransmitState::Done, Ok(reply)),
        Ok(Ok(WaitOutcome::Aborted(reason))) => (
            TransmitState::Failed,
            Err(CecError::FeatureAbort { opcode: u8::from(request), reason: u8::from(reason) }),
        ),
        Ok(Err(_)) => (TransmitState::Failed, Err(CecError::Closed)),
        Err(_) => (TransmitState::Failed, Err(CecError::Timeout { duration: timeout })),
    };
    set_state(shared, address, state);
    if let Err(e) = &result {
        debug!(opcode = %request, error = %e, "Request ended without reply");
    }
    result
}
