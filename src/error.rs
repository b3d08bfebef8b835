//! Error types for the CEC control plane.
//!
//! All fallible operations return [`Result`] with a [`CecError`]. Errors carry
//! structured context so callers can decide whether an operation is worth
//! repeating.
//!
//! ## Error Categories
//!
//! - **Transport Errors**: the byte transport failed or was closed
//! - **Framing Errors**: malformed adapter frames (logged by the reader, rarely surfaced)
//! - **Transmit Errors**: a CEC command was not acknowledged after all attempts
//! - **Protocol Errors**: invalid addresses, commands or a feature abort reply
//! - **Configuration Errors**: invalid or unreadable configuration
//!
//! ## Recovery and Retry
//!
//! ```rust
//! use cecbridge::CecError;
//!
//! let error = CecError::transport_failed("adapter unplugged");
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for CEC operations.
pub type Result<T, E = CecError> = std::result::Result<T, E>;

/// Main error type for CEC operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CecError {
    #[error("Transport failure: {reason}")]
    Transport {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Transport closed")]
    Closed,

    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Framing error: {details}")]
    Framing { details: String },

    #[error("Transmit failed after {attempts} attempt(s): {reason}")]
    TransmitFailed { attempts: u8, reason: String },

    #[error("Invalid logical address {value:#x}")]
    InvalidAddress { value: u8 },

    #[error("Invalid command: {details}")]
    InvalidCommand { details: String },

    #[error("Feature abort for opcode {opcode:#04x} (reason {reason})")]
    FeatureAbort { opcode: u8, reason: u8 },

    #[error("Configuration error: {reason}")]
    Config { reason: String },

    #[error("Configuration file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CecError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            CecError::Transport { .. } => true,
            CecError::Timeout { .. } => true,
            CecError::TransmitFailed { .. } => true,
            CecError::Closed => false,
            CecError::Framing { .. } => false,
            CecError::InvalidAddress { .. } => false,
            CecError::InvalidCommand { .. } => false,
            CecError::FeatureAbort { .. } => false,
            CecError::Config { .. } => false,
            CecError::File { .. } => false,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            CecError::Transport { .. } => vec![
                "Check the adapter is plugged in",
                "Reopen the serial device",
                "Verify no other process holds the adapter",
            ],
            CecError::Closed => vec!["Start a new bus on a fresh transport"],
            CecError::Timeout { .. } => vec![
                "Increase the transmit or response timeout",
                "Check the destination device is powered",
            ],
            CecError::Framing { .. } => vec![
                "Check the adapter firmware version",
                "Check for electrical noise on the USB link",
            ],
            CecError::TransmitFailed { .. } => vec![
                "Poll the destination to confirm it is present",
                "Increase max_tries",
                "Check the HDMI cable",
            ],
            CecError::InvalidAddress { .. } => vec!["Use a logical address between 0 and 15"],
            CecError::InvalidCommand { .. } => vec![
                "A poll carries no operands",
                "A command carries at most 14 operands",
            ],
            CecError::FeatureAbort { .. } => {
                vec!["The destination does not support this opcode"]
            }
            CecError::Config { .. } => vec!["Check configuration values against their documented ranges"],
            CecError::File { .. } => vec!["Check the file exists and is readable"],
        }
    }

    /// Helper constructor for transport failures.
    pub fn transport_failed(reason: impl Into<String>) -> Self {
        CecError::Transport { reason: reason.into(), source: None }
    }

    /// Helper constructor for transport failures with a source error.
    pub fn transport_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        CecError::Transport { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for framing errors.
    pub fn framing(details: impl Into<String>) -> Self {
        CecError::Framing { details: details.into() }
    }

    /// Helper constructor for invalid commands.
    pub fn invalid_command(details: impl Into<String>) -> Self {
        CecError::InvalidCommand { details: details.into() }
    }

    /// Helper constructor for configuration errors.
    pub fn config(reason: impl Into<String>) -> Self {
        CecError::Config { reason: reason.into() }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        CecError::File { path, source }
    }
}

impl From<std::io::Error> for CecError {
    fn from(err: std::io::Error) -> Self {
        CecError::Transport { reason: err.to_string(), source: Some(Box::new(err)) }
    }
}
