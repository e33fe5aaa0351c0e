//! Line driver
//!
//! Owns the two bus wires and the delay source. Lines are only ever
//! released or driven low; sampling a line always releases it first.

use bitwire_hal::OpenDrainLine;
use embedded_hal::delay::DelayNs;

use crate::config::BusConfig;

/// Bus line selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Line {
    /// SCL
    Clock,
    /// SDA
    Data,
}

/// The two bus wires plus timing
pub struct LineDriver<SCL, SDA, D> {
    scl: SCL,
    sda: SDA,
    delay: D,
    config: BusConfig,
}

impl<SCL, SDA, D> LineDriver<SCL, SDA, D>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    /// Bind the lines and configure them for bus use
    pub fn new(scl: SCL, sda: SDA, delay: D, config: BusConfig) -> Self {
        let mut driver = Self {
            scl,
            sda,
            delay,
            config,
        };
        driver.init();
        driver
    }

    /// Configure both lines pulled-up/bidirectional and leave them idle-high
    pub fn init(&mut self) {
        self.scl.configure();
        self.sda.configure();
        self.scl.release();
        self.sda.release();
    }

    /// Stop driving `line`, then sample it
    ///
    /// SDA is sampled after a half-period settle. SCL is sampled right
    /// away; clock-stretch polling supplies its own spacing.
    pub fn release(&mut self, line: Line) -> bool {
        match line {
            Line::Clock => {
                self.scl.release();
                self.scl.is_high()
            }
            Line::Data => {
                self.sda.release();
                self.delay_half_period();
                self.sda.is_high()
            }
        }
    }

    /// Actively pull `line` low
    pub fn drive_low(&mut self, line: Line) {
        match line {
            Line::Clock => self.scl.drive_low(),
            Line::Data => self.sda.drive_low(),
        }
    }

    /// Wait one half clock period
    pub fn delay_half_period(&mut self) {
        self.delay.delay_us(self.config.half_period_us);
    }

    /// Wait between two SCL polls during a clock stretch
    pub fn delay_stretch_poll(&mut self) {
        self.delay.delay_us(self.config.stretch_poll_us);
    }

    /// Active timing
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Replace the timing; takes effect on the next transition
    pub fn set_config(&mut self, config: BusConfig) {
        self.config = config;
    }

    /// Give back the lines and the delay source
    pub fn release_parts(self) -> (SCL, SDA, D) {
        (self.scl, self.sda, self.delay)
    }
}
