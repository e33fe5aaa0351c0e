//! Bitwire - ADXL345 over bit-banged I2C
//!
//! Firmware for RP2040 boards that drives a software I2C bus on two
//! GPIOs and logs accelerometer samples over RTT once a second.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Delay;
use {defmt_rtt as _, panic_probe as _};

use bitwire_core::SoftI2c;
use bitwire_drivers::sensor::Adxl345;
use bitwire_hal_rp2040::FlexLine;

use crate::diagnostics::DefmtSink;

mod config;
mod diagnostics;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Bitwire firmware starting...");

    let p = embassy_rp::init(Default::default());

    info!(
        "Software I2C on SCL=GPIO{} SDA=GPIO{}, {} us half period",
        config::SCL_GPIO,
        config::SDA_GPIO,
        config::BUS_CONFIG.half_period_us
    );
    let scl = FlexLine::new(p.PIN_5);
    let sda = FlexLine::new(p.PIN_4);
    let bus = SoftI2c::with_sink(scl, sda, Delay, config::BUS_CONFIG, DefmtSink::new());

    let accel = Adxl345::with_address(bus, config::ACCEL_ADDRESS);

    spawner.spawn(unwrap!(tasks::accel_task(accel)));

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}
