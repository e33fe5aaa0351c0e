//! Bus diagnostics sink
//!
//! Logs engine diagnostics through defmt and keeps running counts so the
//! sensor task can print a summary.

use bitwire_core::{Diagnostic, DiagnosticSink};
use defmt::*;

/// Diagnostic sink that logs through defmt
#[derive(Default)]
pub struct DefmtSink {
    /// Arbitration losses seen since boot
    pub arbitration_lost: u32,
    /// Clock stretches that ran out of retries since boot
    pub stretch_expired: u32,
}

impl DefmtSink {
    pub const fn new() -> Self {
        Self {
            arbitration_lost: 0,
            stretch_expired: 0,
        }
    }
}

impl DiagnosticSink for DefmtSink {
    fn report(&mut self, event: Diagnostic) {
        match event {
            Diagnostic::ArbitrationLost(condition) => {
                self.arbitration_lost = self.arbitration_lost.wrapping_add(1);
                warn!("I2C arbitration lost during {:?}", condition);
            }
            Diagnostic::ClockStretchExpired(condition) => {
                self.stretch_expired = self.stretch_expired.wrapping_add(1);
                debug!("I2C clock stretch timed out during {:?}", condition);
            }
            Diagnostic::StopWhileIdle => {
                trace!("I2C stop without start ignored");
            }
        }
    }
}
