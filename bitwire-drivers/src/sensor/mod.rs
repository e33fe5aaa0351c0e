//! Sensor drivers

pub mod adxl345;

pub use adxl345::{Acceleration, Adxl345, Adxl345Error};
