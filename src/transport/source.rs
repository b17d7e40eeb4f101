//! Trait abstraction for the interrupt report stream to enable testing

use crate::error::Result;

/// Outcome of one completed read against the report buffer.
///
/// `Reset` and `Gone` are benign termination statuses: they are the expected
/// way a read loop learns the device is being detached and are never treated
/// as faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// The device delivered a report of the given length into the buffer.
    Report(usize),
    /// The poll window elapsed without a report. Not an event; the read is
    /// simply resubmitted.
    Empty,
    /// The endpoint connection was reset.
    Reset,
    /// The device is gone from the bus.
    Gone,
    /// Any other transport failure, carrying its description. Transient;
    /// the loop logs it and keeps reading.
    Fault(String),
}

/// Trait for the device-side report stream
///
/// Exactly one read is in flight at a time: `next_completion` arms a read
/// against `buf` and blocks until it completes. The buffer is written only
/// while that call runs and read only after it returns.
pub trait ReportSource: Send {
    /// Prepare the endpoint for streaming reads.
    ///
    /// Called once before the first read. A failure here is fatal to
    /// session start.
    fn arm(&mut self) -> Result<()>;

    /// Arm the next read against `buf` and block until it completes or the
    /// poll window elapses.
    fn next_completion(&mut self, buf: &mut [u8]) -> Completion;
}
