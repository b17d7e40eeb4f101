//! # Session Module
//!
//! Per-device session: owns the transport handle, the registered input
//! device and the continuous read loop between them.
//!
//! This module handles:
//! - The reader thread that keeps one read perpetually in flight
//! - Classifying completions into forward / resubmit / stop decisions
//! - The open/close lifecycle and the teardown handshake with the reader
//!
//! ## Teardown
//!
//! The reader thread may be inside a completion at the moment a detach is
//! requested from another thread. [`ReadLoop::stop`] sets the shutdown flag
//! and then joins the thread, so by the time it returns no completion
//! handler is running and no read is in flight. The report buffer lives on
//! the reader thread's stack and cannot outlive that guarantee.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};

use crate::error::{Result, TabletBridgeError};
use crate::events::{emit_state, EventSink};
use crate::report::decoder::{decode, DecodeResult};
use crate::report::protocol::PACKET_MAX;
use crate::transport::source::{Completion, ReportSource};

/// Transport source and event sink, owned by the reader thread while the
/// loop runs and handed back to the session when it stops.
type LoopParts = (Box<dyn ReportSource>, Box<dyn EventSink>);

/// Continuous read loop handle.
///
/// At most one reader thread exists per loop. The thread owns the report
/// buffer, the transport source and the event sink for as long as it runs.
pub struct ReadLoop {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<LoopParts>>,
    fault_backoff: Duration,
}

impl ReadLoop {
    pub fn new(fault_backoff: Duration) -> Self {
        Self {
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
            fault_backoff,
        }
    }

    /// Spawn the reader thread over an armed source.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the thread cannot be spawned.
    pub fn start(
        &mut self,
        mut source: Box<dyn ReportSource>,
        mut sink: Box<dyn EventSink>,
        name: &str,
    ) -> Result<()> {
        self.shutdown.store(false, Ordering::SeqCst);
        let shutdown = self.shutdown.clone();
        let fault_backoff = self.fault_backoff;

        let handle = thread::Builder::new()
            .name(format!("{}-reader", name))
            .spawn(move || {
                let mut buf = [0u8; PACKET_MAX];
                run_read_loop(
                    source.as_mut(),
                    sink.as_mut(),
                    &mut buf,
                    &shutdown,
                    fault_backoff,
                );
                (source, sink)
            })?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Request shutdown and block until the reader thread has finished.
    ///
    /// When this returns, no completion handler is running and no further
    /// read will be submitted. Safe to call when the loop never started or
    /// already ended.
    pub fn stop(&mut self) -> Option<LoopParts> {
        self.shutdown.store(true, Ordering::SeqCst);
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(parts) => Some(parts),
            Err(_) => {
                error!("reader thread panicked during shutdown");
                None
            }
        }
    }

    /// Whether the reader thread is currently running.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

/// Body of the reader thread.
///
/// Per completion:
/// - a report is decoded and, if it carries pen state, forwarded as one
///   input frame, then the read is resubmitted
/// - an elapsed poll window resubmits silently
/// - a reset or gone status ends the loop silently; the device is being
///   detached and this is the expected path out
/// - any other fault is logged and the read resubmitted after a short
///   pause; the session stays registered
fn run_read_loop(
    source: &mut dyn ReportSource,
    sink: &mut dyn EventSink,
    buf: &mut [u8],
    shutdown: &AtomicBool,
    fault_backoff: Duration,
) {
    while !shutdown.load(Ordering::Relaxed) {
        match source.next_completion(buf) {
            Completion::Report(len) => {
                trace!("report: {:02x?}", &buf[..len.min(12)]);
                match decode(&buf[..len]) {
                    DecodeResult::Decoded(state) => {
                        if let Err(e) = emit_state(&state, sink) {
                            warn!("failed to forward pen frame: {}", e);
                        }
                    }
                    DecodeResult::Ignored => {}
                }
            }
            Completion::Empty => {}
            Completion::Reset | Completion::Gone => {
                debug!("endpoint closed, reader stopping");
                break;
            }
            Completion::Fault(reason) => {
                warn!("transport fault, retrying read: {}", reason);
                thread::sleep(fault_backoff);
            }
        }
    }
}

/// One attached tablet: device identity plus the resources bridged between
/// transport and input subsystem.
///
/// Exactly one session exists per physically attached device. Dropping the
/// session after [`Session::close`] releases the transport handle and
/// unregisters the input device.
pub struct Session {
    phys: String,
    product: String,
    reader: ReadLoop,
    /// Source and sink while no reader thread owns them.
    idle: Option<LoopParts>,
}

impl Session {
    /// Wire an opened transport source and a registered sink into a session.
    ///
    /// The session starts inactive; events flow after [`Session::open`].
    pub fn new(
        phys: String,
        product: String,
        source: Box<dyn ReportSource>,
        sink: Box<dyn EventSink>,
        fault_backoff: Duration,
    ) -> Self {
        Self {
            phys,
            product,
            reader: ReadLoop::new(fault_backoff),
            idle: Some((source, sink)),
        }
    }

    /// Start streaming: submit the first read and hand the resources to the
    /// reader thread. No-op when already active.
    ///
    /// # Errors
    ///
    /// A submission failure surfaces as `Transport` and leaves the session
    /// inactive but intact; a thread spawn failure surfaces as `Io`.
    pub fn open(&mut self) -> Result<()> {
        if self.reader.is_running() {
            return Ok(());
        }

        let (mut source, sink) = self.idle.take().ok_or_else(|| {
            TabletBridgeError::Transport("session resources unavailable".to_string())
        })?;

        if let Err(e) = source.arm() {
            self.idle = Some((source, sink));
            return Err(e);
        }

        self.reader.start(source, sink, &self.phys)?;
        info!("session open for {} ({})", self.product, self.phys);
        Ok(())
    }

    /// Stop streaming and reclaim the resources from the reader thread.
    ///
    /// Blocks until any in-flight completion has finished. Idempotent.
    pub fn close(&mut self) {
        if let Some(parts) = self.reader.stop() {
            self.idle = Some(parts);
            debug!("session closed for {}", self.phys);
        }
    }

    /// Whether the reader thread is alive. Turns false on its own once the
    /// device disappears from the bus.
    pub fn is_active(&self) -> bool {
        self.reader.is_running()
    }

    pub fn phys(&self) -> &str {
        &self.phys
    }

    pub fn product(&self) -> &str {
        &self.product
    }
}
