//! Bus orchestrator.
//!
//! [`Bus`] owns the sixteen [`BusDevice`] records of one CEC bus, the reader
//! task that turns the adapter byte stream into commands and the writer task
//! that sends replies queued by dispatch.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cecbridge::{Bus, BusConfig, LogicalAddress, MemoryTransport};
//!
//! # async fn demo() -> cecbridge::Result<()> {
//! let (transport, _adapter) = MemoryTransport::pair();
//! let bus = Bus::start(transport, BusConfig::default())?;
//! bus.initialise().await?;
//! bus.power_on(LogicalAddress::Tv).await?;
//! bus.activate_source().await?;
//! bus.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod driver;
mod events;
mod state;
#[cfg(test)]
mod tests;
mod transmitter;

use std::sync::Arc;

use futures::{Stream, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info};

use crate::codec::MessageCode;
use crate::config::BusConfig;
use crate::device::DeviceSnapshot;
use crate::handler::{self, HandlerConfig};
use crate::transport::Transport;
use crate::types::{CecCommand, LogicalAddress, Opcode, PowerStatus, UserControlCode};
use crate::{CecError, Result};

pub use events::BusEvent;
pub(crate) use state::{BusShared, BusState, WaitOutcome};
pub(crate) use transmitter::TransmitPolicy;

use driver::Driver;
use transmitter::Transmitter;

/// Handle to a running CEC bus.
///
/// Dropping the handle cancels the background tasks; [`Bus::shutdown`] also
/// waits for them.
pub struct Bus {
    shared: Arc<BusShared>,
    tasks: Vec<JoinHandle<()>>,
}

impl Bus {
    /// Validate `config` and start the reader and writer tasks.
    ///
    /// Must be called from within a tokio runtime. Adapter setup is left to
    /// [`Bus::initialise`].
    pub fn start<T: Transport>(transport: T, config: BusConfig) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(config.event_capacity);

        let shared = BusShared::new(
            config.clone(),
            Transmitter::new(transport.clone()),
            outbound_tx,
            events,
        );
        let driver = Driver::spawn(shared.clone(), transport, outbound_rx);

        info!(
            address = %config.logical_address,
            physical_address = format_args!("{:#06x}", config.physical_address),
            "CEC bus started"
        );
        Ok(Self { shared, tasks: vec![driver.reader, driver.writer] })
    }

    /// Ping the adapter, read its firmware version, take control and
    /// acknowledge our logical address.
    pub async fn initialise(&self) -> Result<u16> {
        self.ping().await?;
        let firmware = self.firmware_version().await?;
        self.set_controlled(true).await?;
        self.set_ack_mask(self.shared.config.logical_address.mask_bit()).await?;
        info!(firmware, "Adapter initialised");
        Ok(firmware)
    }

    pub fn config(&self) -> &BusConfig {
        &self.shared.config
    }

    pub fn logical_address(&self) -> LogicalAddress {
        self.shared.config.logical_address
    }

    /// Transmit `command`, waiting for the adapter's acknowledgement when
    /// `wait_for_ack` is set.
    pub async fn transmit(&self, command: CecCommand, wait_for_ack: bool) -> Result<()> {
        handler::transmit(&self.shared, command, wait_for_ack).await
    }

    /// Transmit a request and wait for the reply it expects.
    pub async fn request(&self, command: CecCommand) -> Result<CecCommand> {
        handler::request(&self.shared, command).await
    }

    /// Probe whether a device acknowledges `address`. Polls are never retried.
    pub async fn poll(&self, address: LogicalAddress) -> Result<bool> {
        let poll = CecCommand::poll(self.logical_address(), address);
        let present = match handler::transmit(&self.shared, poll, true).await {
            Ok(()) => true,
            Err(CecError::TransmitFailed { .. }) => false,
            Err(e) => return Err(e),
        };
        self.shared.lock_state().device_mut(address).set_present(present);
        debug!(address = %address, present, "Poll result");
        Ok(present)
    }

    pub async fn power_on(&self, destination: LogicalAddress) -> Result<()> {
        handler::power_on(&self.shared, self.logical_address(), destination).await
    }

    /// Wake `destination` on behalf of another initiator address.
    pub async fn power_on_from(&self, initiator: LogicalAddress, destination: LogicalAddress) -> Result<()> {
        handler::power_on(&self.shared, initiator, destination).await
    }

    pub async fn standby(&self, destination: LogicalAddress) -> Result<()> {
        handler::standby(&self.shared, self.logical_address(), destination).await
    }

    pub async fn activate_source(&self) -> Result<()> {
        handler::activate_source(&self.shared).await
    }

    /// Ask `address` for its power status.
    pub async fn request_power_status(&self, address: LogicalAddress) -> Result<PowerStatus> {
        let query = CecCommand::new(self.logical_address(), address, Opcode::GiveDevicePowerStatus);
        let reply = self.request(query).await?;
        Ok(PowerStatus::from_byte(reply.operand(0)))
    }

    pub async fn send_keypress(&self, destination: LogicalAddress, key: UserControlCode, wait_for_ack: bool) -> Result<()> {
        handler::send_keypress(&self.shared, self.logical_address(), destination, key, wait_for_ack).await
    }

    pub async fn send_key_release(&self, destination: LogicalAddress, wait_for_ack: bool) -> Result<()> {
        handler::send_key_release(&self.shared, self.logical_address(), destination, wait_for_ack).await
    }

    /// Snapshot of one device.
    pub fn device(&self, address: LogicalAddress) -> DeviceSnapshot {
        self.shared.lock_state().device(address).snapshot()
    }

    /// Snapshots of all sixteen devices in address order.
    pub fn devices(&self) -> Vec<DeviceSnapshot> {
        self.shared.lock_state().devices().map(|device| device.snapshot()).collect()
    }

    /// Change the transmit policy of the handler bound to `address`.
    ///
    /// The change survives handler replacement.
    pub fn update_handler(&self, address: LogicalAddress, update: impl FnOnce(&mut HandlerConfig)) {
        let mut state = self.shared.lock_state();
        update(state.device_mut(address).handler_mut().config_mut());
    }

    /// Stream of bus events. Events published while the subscriber lags are
    /// skipped.
    pub fn events(&self) -> impl Stream<Item = BusEvent> + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(|event| async move { event.ok() })
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.shared.lock_state().subscribe()
    }

    pub async fn ping(&self) -> Result<()> {
        self.shared.housekeeping(MessageCode::Ping, &[]).await.map(|_| ())
    }

    pub async fn firmware_version(&self) -> Result<u16> {
        let reply = self.shared.housekeeping(MessageCode::FirmwareVersion, &[]).await?;
        match reply.response() {
            [hi, lo, ..] => Ok(u16::from_be_bytes([*hi, *lo])),
            [version] => Ok(u16::from(*version)),
            [] => Err(CecError::framing("firmware version reply without data")),
        }
    }

    /// Set which logical addresses the adapter acknowledges.
    pub async fn set_ack_mask(&self, mask: u16) -> Result<()> {
        self.shared.housekeeping(MessageCode::SetAckMask, &mask.to_be_bytes()).await.map(|_| ())
    }

    /// Switch the adapter between host-controlled and autonomous mode.
    pub async fn set_controlled(&self, controlled: bool) -> Result<()> {
        self.shared.housekeeping(MessageCode::SetControlled, &[u8::from(controlled)]).await.map(|_| ())
    }

    pub async fn set_line_timeout(&self, line_timeout: u8) -> Result<()> {
        self.shared.set_line_timeout(line_timeout).await
    }

    /// Cancel every task and wait for it to finish, including the background
    /// checks of replaced handlers.
    pub async fn shutdown(mut self) {
        info!("Shutting down CEC bus");
        self.shared.cancel.cancel();
        let mut tasks = std::mem::take(&mut self.tasks);
        {
            let mut state = self.shared.lock_state();
            state.mark_closed();
            tasks.extend(state.take_tasks());
        }
        let count = tasks.len();
        for task in tasks {
            if let Err(e) = task.await {
                debug!("Bus task ended abnormally: {}", e);
            }
        }
        info!(tasks = count, "CEC bus stopped");
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        debug!("Dropping CEC bus");
        self.shared.cancel.cancel();
    }
}
