//! Vendor command handlers.
//!
//! Every [`BusDevice`](crate::device::BusDevice) is bound to one
//! [`CommandHandler`]. The handler holds the transmit policy and transient
//! per-device state (last key, background checks, deferred commands); its
//! [`VendorVariant`] selects which opcodes get vendor-specific treatment.
//!
//! Received commands go through [`dispatch`]: the variant's overrides run
//! first and anything they leave alone falls through to the base opcode
//! table. Dispatch only touches in-memory state; replies are queued for the
//! writer task.

mod actions;
mod base;
mod checks;
mod keys;
mod tasks;
mod transmit;
mod vendor;

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::bus::BusState;
use crate::types::{CecCommand, UserControlCode};

pub(crate) use actions::{activate_source, power_on, send_key_release, send_keypress, standby};
pub(crate) use transmit::{request, transmit};
pub use vendor::VendorVariant;

use tasks::TaskSet;

/// What dispatch did with a received command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandledOutcome {
    Handled,
    /// Recognised as addressed to us but not supported; a feature abort
    /// was queued for directed commands.
    Unhandled,
    /// Directed at another device.
    NotAddressed,
    /// Operands missing or out of range.
    InvalidParameters,
}

/// Progress of the handler's current outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransmitState {
    #[default]
    Idle,
    AwaitingAck,
    AwaitingResponse,
    Retrying,
    Failed,
    Done,
}

/// Settings that survive handler replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerConfig {
    pub transmit_timeout: Duration,
    pub max_tries: u8,
    /// When the next active-source re-announcement is due, if one is pending.
    pub active_source_pending: Option<Instant>,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self { transmit_timeout: Duration::from_millis(1000), max_tries: 2, active_source_pending: None }
    }
}

/// Handler bound to one bus device.
#[derive(Debug)]
pub struct CommandHandler {
    variant: VendorVariant,
    config: HandlerConfig,
    transmit_state: TransmitState,
    last_key: Option<UserControlCode>,
    deferred: Vec<CecCommand>,
    tasks: TaskSet,
    cancel: CancellationToken,
    root: CancellationToken,
}

impl CommandHandler {
    pub(crate) fn new(variant: VendorVariant, config: HandlerConfig, root: &CancellationToken) -> Self {
        Self {
            variant,
            config,
            transmit_state: TransmitState::Idle,
            last_key: None,
            deferred: Vec::new(),
            tasks: TaskSet::default(),
            cancel: root.child_token(),
            root: root.clone(),
        }
    }

    /// A fresh handler of `variant` inheriting this handler's config.
    pub(crate) fn successor(&self, variant: VendorVariant) -> Self {
        Self::new(variant, self.config.clone(), &self.root)
    }

    /// Cancel every background task and drop deferred commands.
    ///
    /// Returns the task join handles; every task observes the cancellation
    /// on its next wake-up, which the token triggers immediately.
    pub(crate) fn teardown(&mut self) -> Vec<JoinHandle<()>> {
        self.cancel.cancel();
        if !self.deferred.is_empty() {
            debug!(dropped = self.deferred.len(), "Dropping deferred commands");
            self.deferred.clear();
        }
        self.tasks.drain()
    }

    pub fn variant(&self) -> VendorVariant {
        self.variant
    }

    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    pub(crate) fn config_mut(&mut self) -> &mut HandlerConfig {
        &mut self.config
    }

    pub fn transmit_state(&self) -> TransmitState {
        self.transmit_state
    }

    pub(crate) fn set_transmit_state(&mut self, state: TransmitState) {
        if self.transmit_state != state {
            trace!(from = ?self.transmit_state, to = ?state, "Transmit state");
        }
        self.transmit_state = state;
    }

    pub fn last_key(&self) -> Option<UserControlCode> {
        self.last_key
    }

    pub(crate) fn set_last_key(&mut self, key: Option<UserControlCode>) {
        self.last_key = key;
    }

    /// Queue a command to be sent once the device reports power on.
    pub(crate) fn defer_until_on(&mut self, command: CecCommand) {
        if !self.deferred.contains(&command) {
            self.deferred.push(command);
        }
    }

    pub(crate) fn take_deferred(&mut self) -> Vec<CecCommand> {
        std::mem::take(&mut self.deferred)
    }

    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Token cancelled when this handler is torn down.
    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub(crate) fn spawn_task<F>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(name, task);
    }

    pub(crate) fn has_task(&mut self, name: &'static str) -> bool {
        self.tasks.is_running(name)
    }

    pub fn running_tasks(&self) -> usize {
        self.tasks.running()
    }
}

/// Route a received command to the initiator's handler.
pub(crate) fn dispatch(bus: &mut BusState, command: &CecCommand) -> HandledOutcome {
    let ours = bus.our_address();
    if command.destination != ours && !command.is_broadcast() {
        trace!(command = %command, "Ignoring command for another device");
        return HandledOutcome::NotAddressed;
    }

    let variant = bus.device(command.initiator).handler().variant();
    let outcome = match vendor::handle(variant, bus, command) {
        Some(outcome) => outcome,
        None => base::handle(bus, command),
    };
    bus.complete_waiters(command);
    debug!(command = %command, ?variant, ?outcome, "Dispatched command");
    outcome
}
