//! Accelerometer polling task
//!
//! Brings the ADXL345 into measurement mode, then samples X/Y/Z once per
//! poll interval. Bus failures are logged and the loop carries on; the
//! next sample is a fresh transaction.

use bitwire_core::SoftI2c;
use bitwire_drivers::sensor::{Adxl345, Adxl345Error};
use bitwire_hal_rp2040::FlexLine;
use defmt::*;
use embassy_time::{Delay, Duration, Ticker, Timer};

use crate::config::{INIT_RETRY_MS, POLL_INTERVAL_MS, STATS_EVERY};
use crate::diagnostics::DefmtSink;

/// Concrete bus type on the board
pub type AccelBus = SoftI2c<FlexLine<'static>, FlexLine<'static>, Delay, DefmtSink>;

/// Accelerometer task - owns the bus for the life of the firmware
#[embassy_executor::task]
pub async fn accel_task(mut accel: Adxl345<AccelBus>) {
    info!("Accelerometer task started (address 0x{:02x})", accel.address());

    bring_up(&mut accel).await;

    let mut ticker = Ticker::every(Duration::from_millis(POLL_INTERVAL_MS));
    let mut samples: u32 = 0;

    loop {
        ticker.next().await;

        match accel.read_acceleration() {
            Ok(sample) => {
                let (x_mg, y_mg, z_mg) = sample.to_milli_g();
                info!(
                    "X={} Y={} Z={} ({} {} {} mg)",
                    sample.x, sample.y, sample.z, x_mg, y_mg, z_mg
                );
            }
            Err(e) => {
                error!("Accelerometer read failed: {:?}", e);
            }
        }

        samples = samples.wrapping_add(1);
        if samples % STATS_EVERY == 0 {
            let sink = accel.bus().sink();
            info!(
                "Bus stats: {} samples, {} arbitration lost, {} stretch timeouts",
                samples, sink.arbitration_lost, sink.stretch_expired
            );
        }
    }
}

/// Configure the sensor, retrying until it answers
async fn bring_up(accel: &mut Adxl345<AccelBus>) {
    loop {
        match accel.init() {
            Ok(()) => break,
            Err(e) => {
                warn!("Accelerometer init failed: {:?}, retrying", e);
                Timer::after_millis(INIT_RETRY_MS).await;
            }
        }
    }

    match accel.verify() {
        Ok(()) => info!("ADXL345 detected"),
        Err(Adxl345Error::WrongDevice(id)) => {
            warn!("Unexpected device ID 0x{:02x}, sampling anyway", id);
        }
        Err(Adxl345Error::Bus(e)) => {
            warn!("Device ID read failed: {:?}", e);
        }
    }
}
