//! Open-drain line abstraction
//!
//! A bus line shared by several devices can only ever be pulled low. A
//! high level comes from the pull-up resistor once every device has let
//! go, so there is no "drive high" operation.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// One wire of an open-drain bus
///
/// Implementations must never actively assert the line high: `release`
/// means "stop sinking current and let the pull-up win". Clock-stretch
/// and arbitration-loss detection both depend on it.
pub trait OpenDrainLine {
    /// Configure the pin as pulled-up and bidirectional
    ///
    /// The line must stay readable while released.
    fn configure(&mut self);

    /// Stop driving the line and let it float to the pull-up level
    fn release(&mut self);

    /// Actively pull the line to logic 0
    fn drive_low(&mut self);

    /// Sample the current level on the wire
    ///
    /// Reads the wire, not the output latch, so a low level caused by
    /// another device is visible.
    fn is_high(&mut self) -> bool;

    /// Sample the line, inverted
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Adapter for `embedded-hal` open-drain pins
///
/// Wraps a pin already configured by its HAL as an open-drain output
/// with input buffer enabled, where `set_high` releases the line.
/// Pins with fallible I/O are not accepted: a bus line that can fail to
/// toggle has no meaningful recovery at this layer.
pub struct PinLine<P> {
    pin: P,
}

impl<P> PinLine<P> {
    /// Wrap an open-drain pin
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Give back the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OpenDrainLine for PinLine<P>
where
    P: InputPin + OutputPin + ErrorType<Error = Infallible>,
{
    fn configure(&mut self) {
        // Pull-up and open-drain mode are fixed by the HAL when the pin
        // is created; all that is left is to start released.
        self.release();
    }

    fn release(&mut self) {
        match self.pin.set_high() {
            Ok(()) => {}
            Err(e) => match e {},
        }
    }

    fn drive_low(&mut self) {
        match self.pin.set_low() {
            Ok(()) => {}
            Err(e) => match e {},
        }
    }

    fn is_high(&mut self) -> bool {
        match InputPin::is_high(&mut self.pin) {
            Ok(level) => level,
            Err(e) => match e {},
        }
    }
}
