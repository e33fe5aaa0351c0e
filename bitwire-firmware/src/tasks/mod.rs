//! Embassy async tasks
//!
//! The accelerometer task owns the software I2C bus; nothing else
//! touches the two lines.

pub mod accel;

pub use accel::{accel_task, AccelBus};
