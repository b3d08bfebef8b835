//! Bus configuration.
//!
//! Every field has a default, so a YAML document only needs the values it
//! changes:
//!
//! ```rust
//! use cecbridge::BusConfig;
//!
//! let config = BusConfig::from_yaml_str("logical_address: 8\nmax_tries: 3\n").unwrap();
//! assert_eq!(u8::from(config.logical_address), 8);
//! assert_eq!(config.max_tries, 3);
//! assert_eq!(config.transmit_timeout_ms, 1000);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{LogicalAddress, VendorId};
use crate::{CecError, Result};

/// Longest OSD name CEC can carry.
const MAX_OSD_NAME: usize = 14;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Our logical address; the adapter acknowledges frames sent to it.
    pub logical_address: LogicalAddress,
    /// Our physical address, as learned from the sink's EDID.
    pub physical_address: u16,
    pub osd_name: String,
    /// Our own vendor id, announced on `GiveDeviceVendorId`.
    pub vendor_id: VendorId,
    /// CEC version byte answered to `GetCecVersion`.
    pub cec_version: u8,
    /// ISO 639-2 menu language.
    pub menu_language: String,
    pub transmit_timeout_ms: u64,
    pub max_tries: u8,
    pub retry_wait_ms: u64,
    pub line_timeout: u8,
    pub retry_line_timeout: u8,
    pub response_timeout_ms: u64,
    pub power_on_check_delay_ms: u64,
    pub active_source_interval_ms: u64,
    pub read_timeout_ms: u64,
    pub event_capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            logical_address: LogicalAddress::Playback1,
            physical_address: 0x1000,
            osd_name: "cecbridge".to_string(),
            vendor_id: VendorId::UNKNOWN,
            cec_version: 0x05,
            menu_language: "eng".to_string(),
            transmit_timeout_ms: 1000,
            max_tries: 2,
            retry_wait_ms: 500,
            line_timeout: 3,
            retry_line_timeout: 3,
            response_timeout_ms: 1000,
            power_on_check_delay_ms: 2000,
            active_source_interval_ms: 5000,
            read_timeout_ms: 50,
            event_capacity: 64,
        }
    }
}

impl BusConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: BusConfig = serde_yaml_ng::from_str(yaml)
            .map_err(|e| CecError::config(format!("invalid YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| CecError::file_error(path.to_path_buf(), e))?;
        Self::from_yaml_str(&yaml)
    }

    pub fn validate(&self) -> Result<()> {
        if self.logical_address.is_broadcast() {
            return Err(CecError::config("logical_address cannot be the broadcast address"));
        }
        if self.max_tries == 0 {
            return Err(CecError::config("max_tries must be at least 1"));
        }
        if self.transmit_timeout_ms == 0 {
            return Err(CecError::config("transmit_timeout_ms must be positive"));
        }
        if self.active_source_interval_ms == 0 {
            return Err(CecError::config("active_source_interval_ms must be positive"));
        }
        if self.read_timeout_ms == 0 {
            return Err(CecError::config("read_timeout_ms must be positive"));
        }
        if self.event_capacity == 0 {
            return Err(CecError::config("event_capacity must be positive"));
        }
        if self.osd_name.is_empty() || self.osd_name.len() > MAX_OSD_NAME {
            return Err(CecError::config(format!(
                "osd_name must be 1 to {MAX_OSD_NAME} bytes"
            )));
        }
        if self.menu_language.len() != 3 {
            return Err(CecError::config("menu_language must be a 3 letter code"));
        }
        if self.line_timeout > 0x0F || self.retry_line_timeout > 0x0F {
            return Err(CecError::config("line timeouts must fit in 4 bits"));
        }
        Ok(())
    }

    pub fn transmit_timeout(&self) -> Duration {
        Duration::from_millis(self.transmit_timeout_ms)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn power_on_check_delay(&self) -> Duration {
        Duration::from_millis(self.power_on_check_delay_ms)
    }

    pub fn active_source_interval(&self) -> Duration {
        Duration::from_millis(self.active_source_interval_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Physical address as two big-endian operand bytes.
    pub fn physical_address_operands(&self) -> [u8; 2] {
        self.physical_address.to_be_bytes()
    }
}
