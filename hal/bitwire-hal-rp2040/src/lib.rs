//! RP2040-specific HAL for the bitwire software I2C master
//!
//! Implements the shared `bitwire-hal` line trait on RP2040 GPIO:
//!
//! - Open-drain emulation on any GPIO via direction switching

#![no_std]

pub mod gpio;

pub use gpio::FlexLine;

// Re-export shared traits from bitwire-hal for convenience
pub use bitwire_hal::OpenDrainLine;
