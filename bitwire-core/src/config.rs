//! Bus timing configuration
//!
//! The engine runs on a fixed half-period delay model: every signal
//! transition is followed by one half-period wait. There is no notion
//! of a target frequency beyond that.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Timing parameters for a software I2C bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BusConfig {
    /// Delay between signal transitions in microseconds
    ///
    /// Must be at least the slowest device's setup/hold time. With
    /// call overhead, 1 µs lands near 100 kbit/s on a 240 MHz core.
    pub half_period_us: u32,
    /// Extra polls of SCL allowed while a device stretches the clock
    ///
    /// After this many retries the engine assumes the clock is released
    /// and carries on.
    pub clock_stretch_retries: u32,
    /// Delay between two SCL polls during a clock stretch, in microseconds
    pub stretch_poll_us: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl BusConfig {
    /// Shortest timing, for devices that rarely stretch the clock
    pub const STANDARD: Self = Self {
        half_period_us: 1,
        clock_stretch_retries: 10,
        stretch_poll_us: 1,
    };

    /// Slow timing for long wires or devices that stretch for a while
    /// (EEPROM write cycles, sensors converting on demand)
    pub const RELAXED: Self = Self {
        half_period_us: 5,
        clock_stretch_retries: 1_000,
        stretch_poll_us: 10,
    };

    /// Same timing with a different clock-stretch budget
    pub const fn with_stretch_retries(self, retries: u32) -> Self {
        Self {
            clock_stretch_retries: retries,
            ..self
        }
    }

    /// Worst-case time spent waiting on one clock stretch, in microseconds
    pub fn max_stretch_us(&self) -> u64 {
        self.clock_stretch_retries as u64 * self.stretch_poll_us as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_standard() {
        assert_eq!(BusConfig::default(), BusConfig::STANDARD);
        assert_eq!(BusConfig::default().clock_stretch_retries, 10);
    }

    #[test]
    fn test_with_stretch_retries() {
        let config = BusConfig::RELAXED.with_stretch_retries(3);
        assert_eq!(config.clock_stretch_retries, 3);
        assert_eq!(config.half_period_us, BusConfig::RELAXED.half_period_us);
        assert_eq!(config.max_stretch_us(), 30);
    }
}
