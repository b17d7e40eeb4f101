//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a sensible default, so an absent or empty file yields a
//! working configuration for the built-in device table.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::transport::{DEFAULT_FAULT_BACKOFF_MS, DEFAULT_POLL_TIMEOUT_MS};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub device: DeviceConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub events: EventsConfig,
}

/// Device selection configuration
///
/// Leaving both ids unset selects every entry of the built-in supported
/// device table. Setting both restricts the bridge to that one device.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DeviceConfig {
    pub vendor_id: Option<u16>,

    pub product_id: Option<u16>,

    /// Display name used for an id override. Ignored without one.
    pub name: Option<String>,
}

/// Transport tuning
#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    /// Poll window for one interrupt read, in milliseconds
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: i32,

    /// Pause after a transient read fault before resubmitting
    #[serde(default = "default_fault_backoff_ms")]
    pub fault_backoff_ms: u64,

    /// Interval between hotplug rescans of the bus
    #[serde(default = "default_rescan_interval_ms")]
    pub rescan_interval_ms: u64,
}

/// Input device configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EventsConfig {
    /// Override for the registered input device name. Defaults to the
    /// supported-table name of the attached tablet.
    pub device_name: Option<String>,
}

// Default value functions
fn default_poll_timeout_ms() -> i32 { DEFAULT_POLL_TIMEOUT_MS }
fn default_fault_backoff_ms() -> u64 { DEFAULT_FAULT_BACKOFF_MS }
fn default_rescan_interval_ms() -> u64 { 1000 }

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            fault_backoff_ms: default_fault_backoff_ms(),
            rescan_interval_ms: default_rescan_interval_ms(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tablet_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.device.vendor_id.is_some() != self.device.product_id.is_some() {
            return Err(crate::error::TabletBridgeError::Config(
                toml::de::Error::custom("vendor_id and product_id must be set together"),
            ));
        }

        if self.transport.poll_timeout_ms < 1 || self.transport.poll_timeout_ms > 1000 {
            return Err(crate::error::TabletBridgeError::Config(
                toml::de::Error::custom("poll_timeout_ms must be between 1 and 1000"),
            ));
        }

        if self.transport.fault_backoff_ms == 0 || self.transport.fault_backoff_ms > 10000 {
            return Err(crate::error::TabletBridgeError::Config(
                toml::de::Error::custom("fault_backoff_ms must be between 1 and 10000"),
            ));
        }

        if self.transport.rescan_interval_ms < 100 || self.transport.rescan_interval_ms > 60000 {
            return Err(crate::error::TabletBridgeError::Config(
                toml::de::Error::custom("rescan_interval_ms must be between 100 and 60000"),
            ));
        }

        if let Some(name) = &self.events.device_name {
            if name.is_empty() {
                return Err(crate::error::TabletBridgeError::Config(
                    toml::de::Error::custom("events device_name cannot be empty"),
                ));
            }
        }

        Ok(())
    }
}
