//! Bus diagnostics
//!
//! Conditions the engine notices but does not act on. None of them abort
//! the operation in progress; they are handed to a [`DiagnosticSink`] so
//! the application can log or count them.

/// Protocol step during which a condition was observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Condition {
    /// Start or repeated start
    Start,
    /// Stop
    Stop,
    /// Data bit written by the master (includes ack/nack sent on reads)
    WriteBit,
    /// Data bit read from a device (includes the ack slot after a write)
    ReadBit,
}

/// Non-fatal bus event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    /// SDA read low while the master had it released
    ///
    /// Another device is driving the bus. The engine keeps going.
    ArbitrationLost(Condition),
    /// SCL stayed low for the whole clock-stretch budget
    ///
    /// The engine proceeds as if the clock had been released, which
    /// desynchronizes the transfer if the device is still stretching.
    ClockStretchExpired(Condition),
    /// `stop()` called with no open session; nothing was put on the wire
    StopWhileIdle,
}

impl Diagnostic {
    /// Protocol step the event belongs to, if any
    pub fn condition(&self) -> Option<Condition> {
        match self {
            Diagnostic::ArbitrationLost(c) | Diagnostic::ClockStretchExpired(c) => Some(*c),
            Diagnostic::StopWhileIdle => None,
        }
    }
}

/// Receiver for bus diagnostics
///
/// Called synchronously from inside bus operations, so implementations
/// should be quick: bumping a counter or queueing a log line.
pub trait DiagnosticSink {
    /// Handle one event
    fn report(&mut self, event: Diagnostic);
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _event: Diagnostic) {}
}

impl<F: FnMut(Diagnostic)> DiagnosticSink for F {
    fn report(&mut self, event: Diagnostic) {
        self(event)
    }
}
