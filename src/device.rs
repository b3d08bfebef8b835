//! Per-logical-address device state

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::handler::{CommandHandler, HandlerConfig, TransmitState, VendorVariant};
use crate::types::{CecVersion, LogicalAddress, PowerStatus, VendorId};

/// State of one logical address on the bus.
///
/// Created once per address when the bus starts and kept until shutdown.
/// The bound [`CommandHandler`] is replaced, never removed, when the device
/// announces a vendor that maps to a different [`VendorVariant`].
#[derive(Debug)]
pub struct BusDevice {
    address: LogicalAddress,
    power_status: PowerStatus,
    vendor_id: VendorId,
    active_source: bool,
    physical_address: Option<u16>,
    cec_version: Option<CecVersion>,
    osd_name: Option<String>,
    menu_language: Option<String>,
    present: Option<bool>,
    handler: CommandHandler,
}

/// Result of [`BusDevice::set_vendor_id`] when the handler was swapped.
#[derive(Debug)]
pub struct HandlerReplaced {
    pub previous: VendorVariant,
    pub current: VendorVariant,
    /// Join handles of the cancelled background tasks of the old handler.
    pub retired: Vec<JoinHandle<()>>,
}

impl BusDevice {
    pub(crate) fn new(
        address: LogicalAddress,
        config: HandlerConfig,
        root: &CancellationToken,
    ) -> Self {
        Self {
            address,
            power_status: PowerStatus::Unknown,
            vendor_id: VendorId::UNKNOWN,
            active_source: false,
            physical_address: (address == LogicalAddress::Tv).then_some(0x0000),
            cec_version: None,
            osd_name: None,
            menu_language: None,
            present: None,
            handler: CommandHandler::new(VendorVariant::Generic, config, root),
        }
    }

    pub fn logical_address(&self) -> LogicalAddress {
        self.address
    }

    pub fn current_power_status(&self) -> PowerStatus {
        self.power_status
    }

    /// Record a power status. Returns the previous value when it changed.
    pub fn set_power_status(&mut self, status: PowerStatus) -> Option<PowerStatus> {
        if self.power_status == status {
            return None;
        }
        let previous = std::mem::replace(&mut self.power_status, status);
        debug!(address = %self.address, from = %previous, to = %status, "Power status changed");
        Some(previous)
    }

    pub fn vendor_id(&self) -> VendorId {
        self.vendor_id
    }

    /// Record a vendor id, replacing the handler when the vendor maps to a
    /// different variant.
    ///
    /// The new handler inherits the old handler's [`HandlerConfig`]. The old
    /// handler's background tasks are cancelled and their join handles
    /// returned so the caller can wait for them.
    pub fn set_vendor_id(&mut self, vendor: VendorId) -> Option<HandlerReplaced> {
        self.vendor_id = vendor;
        let variant = VendorVariant::for_vendor(vendor);
        if variant == self.handler.variant() {
            return None;
        }

        let replacement = self.handler.successor(variant);
        let mut previous = std::mem::replace(&mut self.handler, replacement);
        let retired = previous.teardown();
        info!(
            address = %self.address,
            vendor = %vendor,
            from = ?previous.variant(),
            to = ?variant,
            cancelled_tasks = retired.len(),
            "Replaced command handler"
        );
        Some(HandlerReplaced { previous: previous.variant(), current: variant, retired })
    }

    pub fn is_active_source(&self) -> bool {
        self.active_source
    }

    pub(crate) fn set_active_source(&mut self, active: bool) {
        if self.active_source != active {
            debug!(address = %self.address, active, "Active source flag changed");
        }
        self.active_source = active;
    }

    pub fn physical_address(&self) -> Option<u16> {
        self.physical_address
    }

    pub(crate) fn set_physical_address(&mut self, address: u16) {
        self.physical_address = Some(address);
    }

    pub fn cec_version(&self) -> Option<CecVersion> {
        self.cec_version
    }

    pub(crate) fn set_cec_version(&mut self, version: CecVersion) {
        self.cec_version = Some(version);
    }

    pub fn osd_name(&self) -> Option<&str> {
        self.osd_name.as_deref()
    }

    pub(crate) fn set_osd_name(&mut self, name: String) {
        self.osd_name = Some(name);
    }

    pub fn menu_language(&self) -> Option<&str> {
        self.menu_language.as_deref()
    }

    pub(crate) fn set_menu_language(&mut self, language: String) {
        self.menu_language = Some(language);
    }

    /// Result of the last poll, if any.
    pub fn is_present(&self) -> Option<bool> {
        self.present
    }

    pub(crate) fn set_present(&mut self, present: bool) {
        self.present = Some(present);
    }

    pub fn handler(&self) -> &CommandHandler {
        &self.handler
    }

    pub(crate) fn handler_mut(&mut self) -> &mut CommandHandler {
        &mut self.handler
    }

    /// Copy of the observable state.
    pub fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            address: self.address,
            power_status: self.power_status,
            vendor_id: self.vendor_id,
            active_source: self.active_source,
            physical_address: self.physical_address,
            cec_version: self.cec_version,
            osd_name: self.osd_name.clone(),
            menu_language: self.menu_language.clone(),
            present: self.present,
            variant: self.handler.variant(),
            handler_config: self.handler.config().clone(),
            transmit_state: self.handler.transmit_state(),
            background_tasks: self.handler.running_tasks(),
            deferred_commands: self.handler.deferred_len(),
        }
    }
}

/// Point-in-time copy of a [`BusDevice`].
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub address: LogicalAddress,
    pub power_status: PowerStatus,
    pub vendor_id: VendorId,
    pub active_source: bool,
    pub physical_address: Option<u16>,
    pub cec_version: Option<CecVersion>,
    pub osd_name: Option<String>,
    pub menu_language: Option<String>,
    pub present: Option<bool>,
    pub variant: VendorVariant,
    pub handler_config: HandlerConfig,
    pub transmit_state: TransmitState,
    pub background_tasks: usize,
    pub deferred_commands: usize,
}
