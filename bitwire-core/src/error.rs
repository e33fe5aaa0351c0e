//! Transaction errors
//!
//! Only a missing acknowledgement is reported to the caller. Arbitration
//! loss and clock-stretch timeouts are diagnostics, see [`crate::diag`].

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// Errors from a register-level transaction
///
/// When one of these is returned the bus has already been stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransactionError {
    /// No device acknowledged the address byte
    AddressNack,
    /// The device refused a payload byte
    DataNack {
        /// Position of the refused byte in the payload
        index: usize,
    },
}

impl embedded_hal::i2c::Error for TransactionError {
    fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::AddressNack => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)
            }
            TransactionError::DataNack { .. } => {
                ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
            }
        }
    }
}
