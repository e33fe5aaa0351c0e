//! bitwire Hardware Abstraction Layer
//!
//! This crate defines the small capability set the software I2C engine
//! needs from the hardware, plus the register-transaction trait that
//! device drivers are written against. Chip-specific crates implement
//! the line trait; `bitwire-core` implements the bus trait.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Device drivers (bitwire-drivers)       │
//! └─────────────────────────────────────────┘
//!                     │  I2cBus
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  Software I2C engine (bitwire-core)     │
//! └─────────────────────────────────────────┘
//!                     │  OpenDrainLine
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ bitwire-hal-  │       │   PinLine     │
//! │    rp2040     │       │ (embedded-hal)│
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OpenDrainLine`] - One wire of an open-drain bus
//! - [`i2c::I2cBus`] - Register-oriented I2C transactions

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod i2c;

// Re-export key traits at crate root for convenience
pub use gpio::{OpenDrainLine, PinLine};
pub use i2c::{Direction, I2cBus};
