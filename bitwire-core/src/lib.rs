//! Board-agnostic software I2C master
//!
//! Emulates an I2C controller on two GPIO lines. The engine is layered
//! bottom to top:
//!
//! - Line driver: open-drain release/drive-low with settle delays
//! - Bit-level protocol: start, repeated start, stop, bit read/write,
//!   clock-stretch waiting, arbitration-loss detection
//! - Byte-level transactions: byte framing with ack/nack and the
//!   register read/write helpers device drivers use
//!
//! All state lives in one [`SoftI2c`] value owned by the caller, so
//! several independent buses can coexist. Non-fatal bus conditions are
//! delivered to a [`DiagnosticSink`] instead of being logged here.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod bus;
pub mod config;
pub mod diag;
pub mod error;
pub mod hal_i2c;
pub mod line;
pub mod transaction;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

pub use bus::SoftI2c;
pub use config::BusConfig;
pub use diag::{Condition, Diagnostic, DiagnosticSink, NullSink};
pub use error::TransactionError;
pub use line::Line;
pub use transaction::Ack;
