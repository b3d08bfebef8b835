//! Shared bus state guarded by one mutex

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::events::BusEvent;
use super::transmitter::Transmitter;
use crate::codec::AdapterFrame;
use crate::config::BusConfig;
use crate::device::BusDevice;
use crate::handler::{self, HandlerConfig};
use crate::types::{AbortReason, CecCommand, LogicalAddress, Opcode, PowerStatus, VendorId};
use crate::wire::{AdapterMessage, CommandAssembler, Decoded};

/// Everything the reader, the writer and callers share.
pub(crate) struct BusShared {
    state: Mutex<BusState>,
    pub(crate) transmitter: Transmitter,
    pub(crate) config: Arc<BusConfig>,
    pub(crate) cancel: CancellationToken,
}

impl BusShared {
    pub(crate) fn new(
        config: Arc<BusConfig>,
        transmitter: Transmitter,
        outbound: mpsc::UnboundedSender<CecCommand>,
        events: broadcast::Sender<BusEvent>,
    ) -> Arc<Self> {
        let cancel = CancellationToken::new();
        Arc::new(BusShared {
            state: Mutex::new(BusState::new(config.clone(), &cancel, outbound, events)),
            transmitter,
            config,
            cancel,
        })
    }

    /// Lock the state. Every mutation leaves it consistent, so a poisoned
    /// lock is still usable.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Slot for the one adapter exchange in flight.
pub(crate) struct Mailbox {
    pub(crate) message: AdapterMessage,
    pub(crate) done: oneshot::Sender<AdapterMessage>,
}

/// How a response wait ended.
#[derive(Debug)]
pub(crate) enum WaitOutcome {
    Reply(CecCommand),
    Aborted(AbortReason),
}

struct ResponseWaiter {
    /// `None` accepts the reply from any device.
    from: Option<LogicalAddress>,
    request: Opcode,
    expected: Opcode,
    tx: oneshot::Sender<WaitOutcome>,
}

impl ResponseWaiter {
    fn accepts_from(&self, initiator: LogicalAddress) -> bool {
        self.from.is_none_or(|from| from == initiator)
    }
}

/// Devices, in-flight exchange and pending waits of one bus.
pub(crate) struct BusState {
    devices: Vec<BusDevice>,
    ours: LogicalAddress,
    config: Arc<BusConfig>,
    outbound: mpsc::UnboundedSender<CecCommand>,
    events: broadcast::Sender<BusEvent>,
    pub(crate) mailbox: Option<Mailbox>,
    waiters: Vec<ResponseWaiter>,
    assembler: CommandAssembler,
    retired: Vec<JoinHandle<()>>,
    closed: bool,
}

impl BusState {
    fn new(
        config: Arc<BusConfig>,
        root: &CancellationToken,
        outbound: mpsc::UnboundedSender<CecCommand>,
        events: broadcast::Sender<BusEvent>,
    ) -> Self {
        let handler_config = HandlerConfig {
            transmit_timeout: config.transmit_timeout(),
            max_tries: config.max_tries,
            active_source_pending: None,
        };
        let mut devices: Vec<BusDevice> = LogicalAddress::ALL
            .iter()
            .map(|address| BusDevice::new(*address, handler_config.clone(), root))
            .collect();

        let ours = config.logical_address;
        let local = &mut devices[ours.index()];
        local.set_power_status(PowerStatus::On);
        // No tasks exist yet, so nothing is retired here.
        let _ = local.set_vendor_id(config.vendor_id);
        local.set_physical_address(config.physical_address);
        local.set_osd_name(config.osd_name.clone());
        local.set_menu_language(config.menu_language.clone());
        local.set_cec_version(config.cec_version.into());
        local.set_present(true);

        Self {
            devices,
            ours,
            config,
            outbound,
            events,
            mailbox: None,
            waiters: Vec::new(),
            assembler: CommandAssembler::new(),
            retired: Vec::new(),
            closed: false,
        }
    }

    /// A detached state for exercising dispatch without a transport.
    #[cfg(test)]
    pub(crate) fn for_test(
        config: BusConfig,
    ) -> (Self, mpsc::UnboundedReceiver<CecCommand>, broadcast::Receiver<BusEvent>) {
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (events, events_rx) = broadcast::channel(config.event_capacity);
        let state = Self::new(Arc::new(config), &CancellationToken::new(), outbound, events);
        (state, outbound_rx, events_rx)
    }

    pub(crate) fn our_address(&self) -> LogicalAddress {
        self.ours
    }

    pub(crate) fn config(&self) -> &BusConfig {
        &self.config
    }

    pub(crate) fn device(&self, address: LogicalAddress) -> &BusDevice {
        &self.devices[address.index()]
    }

    pub(crate) fn device_mut(&mut self, address: LogicalAddress) -> &mut BusDevice {
        &mut self.devices[address.index()]
    }

    pub(crate) fn devices(&self) -> impl Iterator<Item = &BusDevice> {
        self.devices.iter()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Queue a command for the writer task.
    pub(crate) fn enqueue(&mut self, command: CecCommand) {
        trace!(command = %command, "Queueing command");
        if self.outbound.send(command).is_err() {
            debug!("Writer task gone, dropping command");
        }
    }

    pub(crate) fn publish(&self, event: BusEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.events.subscribe()
    }

    /// Report a vendor firmware anomaly.
    pub(crate) fn diagnostic(&self, address: LogicalAddress, message: String) {
        warn!(address = %address, "{message}");
        self.publish(BusEvent::Diagnostic { address, message });
    }

    /// Record a power status, flushing commands deferred until the device is on.
    pub(crate) fn set_power_status(&mut self, address: LogicalAddress, status: PowerStatus) {
        let Some(previous) = self.device_mut(address).set_power_status(status) else {
            return;
        };
        self.publish(BusEvent::PowerStatusChanged { address, from: previous, to: status });
        if status == PowerStatus::On {
            let deferred = self.device_mut(address).handler_mut().take_deferred();
            for command in deferred {
                debug!(address = %address, command = %command, "Sending deferred command");
                self.enqueue(command);
            }
        }
    }

    pub(crate) fn set_vendor_id(&mut self, address: LogicalAddress, vendor: VendorId) {
        let Some(replaced) = self.device_mut(address).set_vendor_id(vendor) else {
            return;
        };
        self.retired.retain(|handle| !handle.is_finished());
        self.retired.extend(replaced.retired);
        self.publish(BusEvent::VendorChanged { address, vendor });
    }

    /// Make `address` the only active source.
    pub(crate) fn set_active_source(&mut self, address: LogicalAddress) {
        let changed = !self.device(address).is_active_source();
        for device in &mut self.devices {
            let active = device.logical_address() == address;
            device.set_active_source(active);
        }
        if changed {
            self.publish(BusEvent::ActiveSourceChanged { address });
        }
    }

    /// Register interest in the reply to `request`, before it is sent.
    pub(crate) fn register_waiter(
        &mut self,
        from: Option<LogicalAddress>,
        request: Opcode,
        expected: Opcode,
    ) -> oneshot::Receiver<WaitOutcome> {
        let (tx, rx) = oneshot::channel();
        self.waiters.retain(|waiter| !waiter.tx.is_closed());
        self.waiters.push(ResponseWaiter { from, request, expected, tx });
        rx
    }

    /// Hand `command` to every waiter expecting it.
    pub(crate) fn complete_waiters(&mut self, command: &CecCommand) {
        let Some(opcode) = command.opcode else { return };
        let (done, pending) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition::<Vec<_>, _>(|w| w.expected == opcode && w.accepts_from(command.initiator));
        self.waiters = pending;
        for waiter in done {
            let _ = waiter.tx.send(WaitOutcome::Reply(command.clone()));
        }
    }

    /// End waits on `request` after `from` answered with a feature abort.
    pub(crate) fn abort_waiters(&mut self, from: LogicalAddress, request: Opcode, reason: AbortReason) {
        let (done, pending) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition::<Vec<_>, _>(|w| w.request == request && w.accepts_from(from));
        self.waiters = pending;
        for waiter in done {
            let _ = waiter.tx.send(WaitOutcome::Aborted(reason));
        }
    }

    /// Route one adapter frame: replies go to the in-flight exchange,
    /// everything else is assembled into commands and dispatched.
    pub(crate) fn receive_frame(&mut self, frame: AdapterFrame) {
        if let Some(mailbox) = self.mailbox.as_mut() {
            if mailbox.message.is_response(&frame) {
                if mailbox.message.on_reply(&frame) {
                    if let Some(Mailbox { message, done }) = self.mailbox.take() {
                        let _ = done.send(message);
                    }
                }
                return;
            }
        }

        if let Decoded::Complete(command) = self.assembler.push(&frame) {
            debug!(command = %command, "Received command");
            self.publish(BusEvent::CommandReceived(command.clone()));
            handler::dispatch(self, &command);
        }
    }

    pub(crate) fn discarded_commands(&self) -> u64 {
        self.assembler.discarded()
    }

    /// Stop accepting exchanges; in-flight and future waits fail with `Closed`.
    pub(crate) fn mark_closed(&mut self) {
        self.closed = true;
        self.mailbox = None;
        self.waiters.clear();
    }

    /// Every handler task and retired task, for joining at shutdown.
    pub(crate) fn take_tasks(&mut self) -> Vec<JoinHandle<()>> {
        let mut tasks = std::mem::take(&mut self.retired);
        for device in &mut self.devices {
            tasks.extend(device.handler_mut().teardown());
        }
        tasks
    }
}
