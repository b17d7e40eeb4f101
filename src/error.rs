//! # Error Types
//!
//! Custom error types for Tablet Bridge using `thiserror`.
//!
//! Only session setup is fallible towards callers. Nothing on the per-report
//! path surfaces here: unusable reports decode to an ignored outcome, device
//! removal ends the read loop silently, and transient transport faults are
//! logged and retried.

use thiserror::Error;

/// Main error type for Tablet Bridge
#[derive(Debug, Error)]
pub enum TabletBridgeError {
    /// No supported tablet is connected
    #[error("no supported tablet found")]
    DeviceNotFound,

    /// A matching device was found but does not expose the expected pen
    /// interface shape
    #[error("device not supported: {0}")]
    Unsupported(String),

    /// Transport (HID) errors
    #[error("transport error: {0}")]
    Transport(String),

    /// Failures registering or driving the virtual input device
    #[error("input device error: {0}")]
    InputDevice(#[source] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<hidapi::HidError> for TabletBridgeError {
    fn from(e: hidapi::HidError) -> Self {
        TabletBridgeError::Transport(e.to_string())
    }
}

/// Result type alias for Tablet Bridge
pub type Result<T> = std::result::Result<T, TabletBridgeError>;
