//! Device drivers
//!
//! Drivers are generic over [`bitwire_hal::I2cBus`], so they run on the
//! software bus from `bitwire-core` or on any other implementation:
//!
//! - Accelerometers (ADXL345)

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
