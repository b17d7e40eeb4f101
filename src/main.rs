//! # Tablet Bridge
//!
//! Userspace driver bridging Huion graphics tablets to virtual Linux input devices.
//!
//! This application watches the bus for supported tablets, attaches a session
//! to each one and streams its pen reports into a uinput device until the
//! tablet is unplugged or the bridge is stopped.

use anyhow::Result;
use hidapi::HidApi;
use tokio::time::{interval, Duration};
use tracing::{info, warn};
use tracing_subscriber;

use tablet_bridge::config::Config;
use tablet_bridge::registry::Registry;

/// Main entry point for Tablet Bridge
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up logging with tracing subscriber
///    - Load configuration (optional path as first argument)
///    - Create the HID context and the session registry
///
/// 2. **Main Loop**
///    - Rescan the bus on the configured interval: attach newly connected
///      supported tablets, detach sessions whose device is gone
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Graceful Shutdown**
///    - Detach every session (each detach waits for its read loop to stop)
///    - Clean exit
///
/// # Errors
///
/// Returns error if the configuration is invalid or the HID context cannot
/// be created. Per-device failures never end the process; they are logged
/// and retried on the next rescan.
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Tablet Bridge v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let mut api = HidApi::new()?;
    let mut registry = Registry::new();

    if let Err(e) = registry.rescan(&mut api, &config) {
        warn!("initial scan failed: {}", e);
    }
    if registry.active_count() == 0 {
        info!("no supported tablet connected, waiting for hotplug");
    }

    let mut rescan_interval = interval(Duration::from_millis(config.transport.rescan_interval_ms));
    info!("Press Ctrl+C to exit");

    // Main supervision loop
    loop {
        tokio::select! {
            // Watch the bus for attach/detach on a regular interval
            _ = rescan_interval.tick() => {
                if let Err(e) = registry.rescan(&mut api, &config) {
                    warn!("bus rescan failed: {}", e);
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    registry.shutdown();
    info!("all sessions detached");

    Ok(())
}
