//! Board configuration
//!
//! Wiring and timing for the accelerometer bus. Pin numbers are fixed in
//! `main.rs` where the peripherals are taken; they are listed here for
//! reference.

use bitwire_core::BusConfig;
use bitwire_drivers::sensor::adxl345;

/// SCL on GPIO5
pub const SCL_GPIO: u8 = 5;

/// SDA on GPIO4
pub const SDA_GPIO: u8 = 4;

/// Accelerometer address (ALT ADDRESS tied low)
pub const ACCEL_ADDRESS: u8 = adxl345::DEFAULT_ADDRESS;

/// Sample period in milliseconds
pub const POLL_INTERVAL_MS: u64 = 1000;

/// Wait before retrying a failed sensor init, in milliseconds
pub const INIT_RETRY_MS: u64 = 500;

/// Log a diagnostics summary every this many samples
pub const STATS_EVERY: u32 = 60;

/// Bus timing: 1 µs half period, short clock-stretch budget
pub const BUS_CONFIG: BusConfig = BusConfig::STANDARD;
