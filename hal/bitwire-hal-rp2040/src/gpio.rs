//! Open-drain lines on RP2040 GPIO
//!
//! The RP2040 pads have no open-drain mode. It is emulated by keeping the
//! output latch at 0 and toggling the pad direction: output means "drive
//! low", input means "released". The internal pull-up is enabled so a
//! bus without external resistors still idles high, though external
//! 2.2k-4.7k pull-ups are needed for anything beyond a few centimetres.

use bitwire_hal::OpenDrainLine;
use embassy_rp::gpio::{Flex, Pin, Pull};
use embassy_rp::Peri;

/// One bus wire on a GPIO
pub struct FlexLine<'d> {
    pin: Flex<'d>,
}

impl<'d> FlexLine<'d> {
    /// Take a GPIO for bus use
    ///
    /// The pad starts released; call [`OpenDrainLine::configure`] (the
    /// engine does this on init) before the first transfer.
    pub fn new(pin: Peri<'d, impl Pin>) -> Self {
        let mut pin = Flex::new(pin);
        pin.set_as_input();
        Self { pin }
    }
}

impl OpenDrainLine for FlexLine<'_> {
    fn configure(&mut self) {
        self.pin.set_pull(Pull::Up);
        // Latch stays 0; only the direction changes from here on
        self.pin.set_low();
        self.pin.set_as_input();
    }

    fn release(&mut self) {
        self.pin.set_as_input();
    }

    fn drive_low(&mut self) {
        self.pin.set_as_output();
    }

    fn is_high(&mut self) -> bool {
        self.pin.is_high()
    }
}
