//! HDMI-CEC control plane for USB-CEC bridge adapters.
//!
//! cecbridge turns the escaped byte stream of a USB-CEC adapter into CEC
//! commands, keeps per-device state for the sixteen logical addresses of a
//! bus and transmits commands with the adapter's acknowledgement and retry
//! semantics.
//!
//! # Features
//!
//! - **Frame codec**: incremental, chunking-agnostic decoding of adapter frames
//! - **Wire mapping**: CEC commands to adapter frames and back, with reply correlation
//! - **Vendor handlers**: per-device opcode tables with Samsung, LG, Panasonic,
//!   Philips and Sharp workarounds
//! - **Background checks**: cancellable power-on and active-source checks
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use cecbridge::{Bus, BusConfig, BusEvent, LogicalAddress, MemoryTransport};
//! use futures::StreamExt;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> cecbridge::Result<()> {
//!     // A real application passes its serial port transport here.
//!     let (transport, _adapter) = MemoryTransport::pair();
//!     let bus = Bus::start(transport, BusConfig::default())?;
//!     bus.initialise().await?;
//!
//!     let mut events = std::pin::pin!(bus.events());
//!     bus.power_on(LogicalAddress::Tv).await?;
//!     while let Some(event) = events.next().await {
//!         if let BusEvent::KeyPressed { key, .. } = event {
//!             println!("key {key}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core types and error handling
pub mod config;
mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

// Adapter protocol
pub mod codec;
pub mod transport;
pub mod wire;

// Bus state and behaviour
pub mod bus;
pub mod device;
pub mod handler;

// Core exports
pub use bus::{Bus, BusEvent};
pub use config::BusConfig;
pub use device::{BusDevice, DeviceSnapshot};
pub use error::*;
pub use handler::{HandledOutcome, HandlerConfig, TransmitState, VendorVariant};
pub use transport::{MemoryPeer, MemoryTransport, ReadOutcome, Transport};
pub use types::*;
