//! # Transport Module
//!
//! HID transport to the tablet's interrupt endpoint.
//!
//! This module handles:
//! - Locating the vendor pen interface of a connected tablet
//! - Opening the hidraw node and streaming interrupt reports from it
//! - Classifying read failures into benign termination vs. transient faults

pub mod source;

use std::ffi::CString;

use hidapi::{HidApi, HidDevice, HidError};
use tracing::debug;

use crate::error::{Result, TabletBridgeError};
use self::source::{Completion, ReportSource};

/// Usage page of the digitizer interface carrying pen reports.
pub const PEN_USAGE_PAGE: u16 = 0x000D;

/// Default poll window for one read, in milliseconds. Short enough that a
/// stop request is observed promptly while the pen is idle.
pub const DEFAULT_POLL_TIMEOUT_MS: i32 = 5;

/// Default pause after a transient read fault before the next submission.
pub const DEFAULT_FAULT_BACKOFF_MS: u64 = 100;

/// Identity of the pen interface of one attached tablet.
#[derive(Debug, Clone)]
pub struct PenInterface {
    /// Platform path used to open the hidraw node.
    pub path: CString,
    /// Physical path string advertised alongside the logical device.
    pub phys: String,
    pub vendor_id: u16,
    pub product_id: u16,
    /// Product string reported by the device, if any.
    pub product: String,
}

/// Locate the pen interface of a device identified by vendor/product id.
///
/// The tablet exposes several HID interfaces (mouse and keyboard emulation
/// next to the digitizer). A supported device carries exactly one digitizer
/// interface; anything else is rejected as unsupported rather than opened
/// speculatively.
///
/// # Errors
///
/// - `DeviceNotFound` if no interface matches the ids
/// - `Unsupported` if the matching device has no pen interface, or more
///   than one
pub fn find_pen_interface(api: &HidApi, vendor_id: u16, product_id: u16) -> Result<PenInterface> {
    let mut present = false;
    let mut pens = Vec::new();

    for info in api.device_list() {
        if info.vendor_id() != vendor_id || info.product_id() != product_id {
            continue;
        }
        present = true;
        debug!(
            "candidate interface {} (usage page 0x{:04x}) at {:?}",
            info.interface_number(),
            info.usage_page(),
            info.path()
        );
        if info.usage_page() == PEN_USAGE_PAGE {
            pens.push(info);
        }
    }

    if !present {
        return Err(TabletBridgeError::DeviceNotFound);
    }

    match pens.as_slice() {
        [info] => {
            let path = info.path().to_owned();
            Ok(PenInterface {
                phys: format!("{}/input0", path.to_string_lossy()),
                path,
                vendor_id,
                product_id,
                product: info.product_string().unwrap_or("unknown tablet").to_string(),
            })
        }
        [] => Err(TabletBridgeError::Unsupported(format!(
            "{:04x}:{:04x} exposes no pen interface",
            vendor_id, product_id
        ))),
        several => Err(TabletBridgeError::Unsupported(format!(
            "{:04x}:{:04x} exposes {} pen interfaces, expected exactly one",
            vendor_id,
            product_id,
            several.len()
        ))),
    }
}

/// Classify a HID read failure into a completion status.
///
/// hidapi surfaces the underlying cause only as text, so classification
/// matches on the platform error strings for a detached device.
pub fn classify_read_error(error: &HidError) -> Completion {
    let message = error.to_string();
    let lower = message.to_lowercase();

    if lower.contains("no such device") || lower.contains("disconnect") {
        Completion::Gone
    } else if lower.contains("reset") {
        Completion::Reset
    } else {
        Completion::Fault(message)
    }
}

/// [`ReportSource`] implementation over a hidraw device handle.
pub struct HidReportSource {
    device: HidDevice,
    poll_timeout_ms: i32,
}

impl HidReportSource {
    /// Open the pen interface for streaming.
    ///
    /// # Arguments
    ///
    /// * `api` - Shared hidapi context
    /// * `interface` - Pen interface located by [`find_pen_interface`]
    /// * `poll_timeout_ms` - Poll window for each read
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the hidraw node cannot be opened (typically a
    /// permission problem on `/dev/hidraw*`).
    pub fn open(api: &HidApi, interface: &PenInterface, poll_timeout_ms: i32) -> Result<Self> {
        let device = api.open_path(&interface.path)?;
        Ok(Self {
            device,
            poll_timeout_ms,
        })
    }
}

impl std::fmt::Debug for HidReportSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HidReportSource")
            .field("poll_timeout_ms", &self.poll_timeout_ms)
            .finish_non_exhaustive()
    }
}

impl ReportSource for HidReportSource {
    fn arm(&mut self) -> Result<()> {
        // Blocking mode pairs with the per-read timeout below; failure here
        // means the handle is already unusable.
        self.device.set_blocking_mode(true)?;
        Ok(())
    }

    fn next_completion(&mut self, buf: &mut [u8]) -> Completion {
        match self.device.read_timeout(buf, self.poll_timeout_ms) {
            Ok(0) => Completion::Empty,
            Ok(len) => Completion::Report(len),
            Err(e) => classify_read_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hid_error(message: &str) -> HidError {
        HidError::HidApiError {
            message: message.to_string(),
        }
    }

    #[test]
    fn test_classify_device_gone() {
        assert_eq!(
            classify_read_error(&hid_error("hid_read: No such device")),
            Completion::Gone
        );
        assert_eq!(
            classify_read_error(&hid_error("device disconnected")),
            Completion::Gone
        );
    }

    #[test]
    fn test_classify_connection_reset() {
        assert_eq!(
            classify_read_error(&hid_error("Connection reset by peer")),
            Completion::Reset
        );
    }

    #[test]
    fn test_classify_other_faults() {
        let completion = classify_read_error(&hid_error("Input/output error"));
        match completion {
            Completion::Fault(message) => assert!(message.contains("Input/output")),
            other => panic!("expected fault, got {:?}", other),
        }
    }

    #[test]
    fn test_pen_usage_page_is_digitizer() {
        // HID usage table: 0x0D = Digitizers.
        assert_eq!(PEN_USAGE_PAGE, 0x000D);
    }

    #[test]
    fn test_default_poll_window() {
        assert_eq!(DEFAULT_POLL_TIMEOUT_MS, 5);
        assert_eq!(DEFAULT_FAULT_BACKOFF_MS, 100);
    }
}
