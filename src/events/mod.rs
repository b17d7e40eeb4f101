//! # Input Event Module
//!
//! Forwards decoded pen state to the host input subsystem.
//!
//! This module handles:
//! - The [`EventSink`] abstraction over the registered input device
//! - Translating a [`TabletState`] into an ordered key/axis event frame
//! - Applying the lower-bound coordinate clamp on the way out

pub mod uinput;

use std::io;

use crate::report::protocol::{TabletState, X_AXIS, Y_AXIS};

/// Key capabilities the logical pen device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenKey {
    /// Pen tool presence/contact.
    ToolPen,
    /// Barrel button. Advertised as a capability; no report field is wired
    /// to it yet.
    Stylus,
}

/// Absolute axes the logical pen device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PenAxis {
    X,
    Y,
    Pressure,
    TiltX,
    TiltY,
}

/// Trait for the consumer-facing input device.
///
/// A frame is a run of `key`/`abs` calls terminated by exactly one `sync`.
/// Implementations may buffer events until `sync`, but must deliver the
/// frame as one atomic batch; a frame without its sync marker must never
/// reach the consumer.
pub trait EventSink: Send {
    /// Report a key state change.
    fn key(&mut self, key: PenKey, pressed: bool) -> io::Result<()>;

    /// Report an absolute axis value.
    fn abs(&mut self, axis: PenAxis, value: i32) -> io::Result<()>;

    /// Terminate the current frame and deliver it to the consumer.
    fn sync(&mut self) -> io::Result<()>;
}

/// Forward one decoded pen snapshot as a single input frame.
///
/// Event order is a contract with the consumer: pen contact key, X, Y,
/// pressure, tilt X, tilt Y, sync. X and Y are raised to their declared
/// minimum on the way out; pressure and tilt pass through as decoded.
///
/// # Errors
///
/// Propagates the first sink failure. The frame is abandoned at that point;
/// the caller decides whether the session survives.
pub fn emit_state(state: &TabletState, sink: &mut dyn EventSink) -> io::Result<()> {
    sink.key(PenKey::ToolPen, state.pen_contact)?;
    sink.abs(PenAxis::X, X_AXIS.clamp_floor(state.x))?;
    sink.abs(PenAxis::Y, Y_AXIS.clamp_floor(state.y))?;
    sink.abs(PenAxis::Pressure, state.pressure)?;
    sink.abs(PenAxis::TiltX, state.tilt_x)?;
    sink.abs(PenAxis::TiltY, state.tilt_y)?;
    sink.sync()
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// One recorded sink call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum SinkCall {
        Key(PenKey, bool),
        Abs(PenAxis, i32),
        Sync,
    }

    /// Mock sink recording every call for assertions.
    #[derive(Clone, Default)]
    pub struct RecordingSink {
        pub calls: Arc<Mutex<Vec<SinkCall>>>,
        pub fail_kind: Arc<Mutex<Option<io::ErrorKind>>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<SinkCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn frames(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, SinkCall::Sync))
                .count()
        }

        pub fn set_fail(&self, kind: io::ErrorKind) {
            *self.fail_kind.lock().unwrap() = Some(kind);
        }

        fn record(&self, call: SinkCall) -> io::Result<()> {
            if let Some(kind) = *self.fail_kind.lock().unwrap() {
                return Err(io::Error::new(kind, "mock sink error"));
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    impl EventSink for RecordingSink {
        fn key(&mut self, key: PenKey, pressed: bool) -> io::Result<()> {
            self.record(SinkCall::Key(key, pressed))
        }

        fn abs(&mut self, axis: PenAxis, value: i32) -> io::Result<()> {
            self.record(SinkCall::Abs(axis, value))
        }

        fn sync(&mut self) -> io::Result<()> {
            self.record(SinkCall::Sync)
        }
    }
}
