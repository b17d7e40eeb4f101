//! # Registry Module
//!
//! Process-wide registry of supported tablets and their active sessions.
//!
//! This module handles:
//! - The supported-device table (vendor/product ids and display names)
//! - Attaching a session when a supported tablet appears on the bus
//! - Reaping sessions whose device vanished, and full-shutdown teardown
//!
//! The registry is an explicit object created at startup and passed where
//! it is needed; there is no module-level state.

use std::collections::HashMap;
use std::time::Duration;

use hidapi::HidApi;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Result, TabletBridgeError};
use crate::events::uinput::UinputSink;
use crate::session::Session;
use crate::transport::{find_pen_interface, HidReportSource, PenInterface};

/// Huion vendor id
pub const HUION_VENDOR_ID: u16 = 0x256c;

/// One entry of the supported-device table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupportedDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: &'static str,
}

/// Tablets this bridge knows how to drive.
pub const SUPPORTED_DEVICES: &[SupportedDevice] = &[SupportedDevice {
    vendor_id: HUION_VENDOR_ID,
    product_id: 0x006d,
    name: "Huion H610 Pro V2",
}];

/// Look up a device in the supported table.
pub fn supported_device(vendor_id: u16, product_id: u16) -> Option<&'static SupportedDevice> {
    SUPPORTED_DEVICES
        .iter()
        .find(|d| d.vendor_id == vendor_id && d.product_id == product_id)
}

/// A (vendor, product, display name) triple the registry scans for.
#[derive(Debug, Clone)]
struct ScanTarget {
    vendor_id: u16,
    product_id: u16,
    name: String,
}

/// Active sessions keyed by physical path.
///
/// Created once at startup and torn down with [`Registry::shutdown`]. Each
/// physically attached device maps to exactly one session; reattaching a
/// device after unplug produces a fresh session with no carried-over state.
pub struct Registry {
    sessions: HashMap<String, Session>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    /// Refresh the bus view: reap dead sessions, attach new devices.
    ///
    /// Unsupported or absent devices are not errors; a failed attach of a
    /// present device is logged and retried on the next rescan.
    ///
    /// # Errors
    ///
    /// Returns `Transport` only if the bus itself cannot be enumerated.
    pub fn rescan(&mut self, api: &mut HidApi, config: &Config) -> Result<()> {
        api.refresh_devices()?;
        self.reap_stopped();

        for target in scan_targets(config) {
            match find_pen_interface(api, target.vendor_id, target.product_id) {
                Ok(interface) => {
                    if self.sessions.contains_key(&interface.phys) {
                        continue;
                    }
                    if let Err(e) = self.attach(api, &interface, &target.name, config) {
                        warn!("attach failed for {}: {}", interface.phys, e);
                    }
                }
                Err(TabletBridgeError::DeviceNotFound) => {}
                Err(e) => debug!(
                    "skipping {:04x}:{:04x}: {}",
                    target.vendor_id, target.product_id, e
                ),
            }
        }

        Ok(())
    }

    /// Attach one located tablet: open its transport, register the logical
    /// input device, start streaming.
    ///
    /// # Errors
    ///
    /// Any step failing aborts the whole attach; resources acquired by
    /// earlier steps are released on the way out and nothing is registered.
    pub fn attach(
        &mut self,
        api: &HidApi,
        interface: &PenInterface,
        name: &str,
        config: &Config,
    ) -> Result<()> {
        let source = HidReportSource::open(api, interface, config.transport.poll_timeout_ms)?;

        let device_name = config.events.device_name.as_deref().unwrap_or(name);
        let sink = UinputSink::create(device_name, interface.vendor_id, interface.product_id)?;

        let mut session = Session::new(
            interface.phys.clone(),
            interface.product.clone(),
            Box::new(source),
            Box::new(sink),
            Duration::from_millis(config.transport.fault_backoff_ms),
        );
        session.open()?;

        info!("attached {} at {}", name, interface.phys);
        self.sessions.insert(interface.phys.clone(), session);
        Ok(())
    }

    /// Detach the session at the given physical path, if any.
    ///
    /// Blocks until its read loop has stopped, then releases the transport
    /// handle and unregisters the input device. Idempotent for unknown or
    /// already-detached paths.
    pub fn detach(&mut self, phys: &str) {
        if let Some(mut session) = self.sessions.remove(phys) {
            session.close();
            info!("detached {} ({})", session.product(), session.phys());
        }
    }

    /// Detach every session. Called once on shutdown.
    pub fn shutdown(&mut self) {
        let paths: Vec<String> = self.sessions.keys().cloned().collect();
        for phys in paths {
            self.detach(&phys);
        }
    }

    /// Number of currently attached sessions.
    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions whose reader stopped on its own (device gone).
    fn reap_stopped(&mut self) {
        let gone: Vec<String> = self
            .sessions
            .iter()
            .filter(|(_, session)| !session.is_active())
            .map(|(phys, _)| phys.clone())
            .collect();
        for phys in gone {
            self.detach(&phys);
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Devices to look for: the configured override, or the built-in table.
fn scan_targets(config: &Config) -> Vec<ScanTarget> {
    match (config.device.vendor_id, config.device.product_id) {
        (Some(vendor_id), Some(product_id)) => vec![ScanTarget {
            vendor_id,
            product_id,
            name: config
                .device
                .name
                .clone()
                .unwrap_or_else(|| format!("Tablet {:04x}:{:04x}", vendor_id, product_id)),
        }],
        _ => SUPPORTED_DEVICES
            .iter()
            .map(|d| ScanTarget {
                vendor_id: d.vendor_id,
                product_id: d.product_id,
                name: d.name.to_string(),
            })
            .collect(),
    }
}
