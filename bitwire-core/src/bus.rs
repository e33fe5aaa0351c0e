//! Bit-level protocol engine
//!
//! Two states: Idle (no open session) and Started. `start` moves to
//! Started, or issues a repeated start if already there; `stop` goes back
//! to Idle. Every bit slot ends with SCL driven low by the master.
//!
//! Clock-stretch waits are bounded by [`BusConfig::clock_stretch_retries`].
//! Running out of retries is not fatal: the engine reports
//! [`Diagnostic::ClockStretchExpired`] and carries on as if the clock had
//! been released. Unexpected lows on SDA are reported as
//! [`Diagnostic::ArbitrationLost`] and do not abort either.

use bitwire_hal::OpenDrainLine;
use embedded_hal::delay::DelayNs;

use crate::config::BusConfig;
use crate::diag::{Condition, Diagnostic, DiagnosticSink, NullSink};
use crate::line::{Line, LineDriver};

/// Software I2C master on two open-drain lines
///
/// Holds the lines, the delay source, the diagnostic sink and the
/// session flag. Not reentrant: every operation takes `&mut self`, and
/// one transaction must finish before the next begins.
pub struct SoftI2c<SCL, SDA, D, S = NullSink> {
    lines: LineDriver<SCL, SDA, D>,
    sink: S,
    started: bool,
}

impl<SCL, SDA, D> SoftI2c<SCL, SDA, D, NullSink>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
{
    /// Create a bus that discards diagnostics
    pub fn new(scl: SCL, sda: SDA, delay: D, config: BusConfig) -> Self {
        Self::with_sink(scl, sda, delay, config, NullSink)
    }
}

impl<SCL, SDA, D, S> SoftI2c<SCL, SDA, D, S>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
    S: DiagnosticSink,
{
    /// Create a bus reporting diagnostics to `sink`
    ///
    /// Configures both lines and leaves the bus idle.
    pub fn with_sink(scl: SCL, sda: SDA, delay: D, config: BusConfig, sink: S) -> Self {
        Self {
            lines: LineDriver::new(scl, sda, delay, config),
            sink,
            started: false,
        }
    }

    /// Reconfigure the lines, release them and forget any open session
    pub fn init(&mut self) {
        self.lines.init();
        self.started = false;
    }

    /// Whether a start condition is currently open
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Active timing
    pub fn config(&self) -> &BusConfig {
        self.lines.config()
    }

    /// Change timing between transactions
    pub fn set_config(&mut self, config: BusConfig) {
        self.lines.set_config(config);
    }

    /// Diagnostic sink
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Diagnostic sink, mutably
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Tear down the bus and give back its parts
    pub fn free(self) -> (SCL, SDA, D, S) {
        let (scl, sda, delay) = self.lines.release_parts();
        (scl, sda, delay, self.sink)
    }

    /// Issue a start condition, or a repeated start inside a session
    ///
    /// SDA falls while SCL is high, then SCL is pulled low ready for the
    /// first bit.
    pub fn start(&mut self) {
        // Inside a session SCL is low here: raise SDA first so it can
        // fall again once the clock is up.
        self.lines.release(Line::Data);
        self.lines.delay_half_period();
        self.wait_for_clock(Condition::Start);
        // Repeated start setup time
        self.lines.delay_half_period();
        if !self.lines.release(Line::Data) {
            self.sink.report(Diagnostic::ArbitrationLost(Condition::Start));
        }
        self.lines.drive_low(Line::Data);
        self.lines.delay_half_period();
        self.lines.drive_low(Line::Clock);
        self.started = true;
    }

    /// Issue a stop condition and close the session
    ///
    /// Without an open session this is a no-op on the wire and reports
    /// [`Diagnostic::StopWhileIdle`].
    pub fn stop(&mut self) {
        if !self.started {
            self.sink.report(Diagnostic::StopWhileIdle);
            return;
        }
        self.lines.drive_low(Line::Data);
        self.lines.delay_half_period();
        self.wait_for_clock(Condition::Stop);
        // Stop setup time
        self.lines.delay_half_period();
        // SCL is high: SDA rising now is the stop condition
        if !self.lines.release(Line::Data) {
            self.sink.report(Diagnostic::ArbitrationLost(Condition::Stop));
        }
        self.lines.delay_half_period();
        self.started = false;
    }

    /// Clock one bit out onto the bus
    ///
    /// A 1 is sent by releasing SDA. If SDA still reads low while SCL is
    /// high, another device is driving it; that is reported and the bit
    /// slot completes anyway.
    pub fn write_bit(&mut self, bit: bool) {
        if bit {
            self.lines.release(Line::Data);
        } else {
            self.lines.drive_low(Line::Data);
        }
        self.lines.delay_half_period();
        self.wait_for_clock(Condition::WriteBit);
        // SCL is high, the device samples SDA now
        if bit && !self.lines.release(Line::Data) {
            self.sink.report(Diagnostic::ArbitrationLost(Condition::WriteBit));
        }
        self.lines.delay_half_period();
        self.lines.drive_low(Line::Clock);
    }

    /// Clock one bit in from the bus
    pub fn read_bit(&mut self) -> bool {
        // Let the device drive SDA
        self.lines.release(Line::Data);
        self.lines.delay_half_period();
        self.wait_for_clock(Condition::ReadBit);
        let bit = self.lines.release(Line::Data);
        self.lines.delay_half_period();
        self.lines.drive_low(Line::Clock);
        bit
    }

    /// Release SCL and wait for it to rise, within the retry budget
    fn wait_for_clock(&mut self, condition: Condition) {
        let mut retries = self.lines.config().clock_stretch_retries;
        while !self.lines.release(Line::Clock) {
            if retries == 0 {
                self.sink.report(Diagnostic::ClockStretchExpired(condition));
                return;
            }
            retries -= 1;
            self.lines.delay_stretch_poll();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{BusEvent, NoDelay, RecordingSink, SimBus};

    #[test]
    fn test_new_configures_lines() {
        let bus = SimBus::new();
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        assert!(bus.is_configured());
        assert!(!i2c.is_started());
        assert!(bus.scl_level());
        assert!(bus.sda_level());
    }

    #[test]
    fn test_start_stop_balance() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        i2c.start();
        assert!(i2c.is_started());
        assert!(!bus.scl_level());
        assert!(!bus.sda_level());

        i2c.stop();
        assert!(!i2c.is_started());
        assert!(bus.scl_level());
        assert!(bus.sda_level());

        assert_eq!(bus.events().as_slice(), &[BusEvent::Start, BusEvent::Stop]);
    }

    #[test]
    fn test_repeated_start_keeps_session_open() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        i2c.start();
        i2c.write_bit(true);
        assert!(i2c.is_started());

        i2c.start();
        assert!(i2c.is_started());

        i2c.start();
        assert!(i2c.is_started());

        i2c.stop();
        assert!(!i2c.is_started());
        assert_eq!(bus.count(BusEvent::Start), 3);
        assert_eq!(bus.count(BusEvent::Stop), 1);
    }

    #[test]
    fn test_repeated_start_after_low_bit() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        // SDA left low by the last bit must be raised before the restart
        i2c.start();
        i2c.write_bit(false);
        i2c.start();

        assert_eq!(bus.count(BusEvent::Start), 2);
        assert_eq!(bus.count(BusEvent::Stop), 0);
    }

    #[test]
    fn test_second_stop_is_noop() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::with_sink(
            bus.scl(),
            bus.sda(),
            NoDelay,
            BusConfig::default(),
            RecordingSink::new(),
        );

        i2c.start();
        i2c.stop();
        let pulses = bus.scl_pulses();

        i2c.stop();
        assert!(!i2c.is_started());
        assert_eq!(bus.scl_pulses(), pulses);
        assert_eq!(bus.count(BusEvent::Stop), 1);
        assert_eq!(i2c.sink().events.as_slice(), &[Diagnostic::StopWhileIdle]);

        // The bus still works normally afterwards
        i2c.start();
        assert!(i2c.is_started());
        i2c.stop();
        assert!(!i2c.is_started());
    }

    #[test]
    fn test_write_bits_clock_out() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        i2c.start();
        let before = bus.scl_pulses();
        i2c.write_bit(true);
        i2c.write_bit(false);
        assert_eq!(bus.scl_pulses(), before + 2);
        assert!(!bus.scl_level());
    }

    #[test]
    fn test_read_bit_floating_reads_one() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        i2c.start();
        assert!(i2c.read_bit());

        bus.set_contender(true);
        assert!(!i2c.read_bit());
    }

    #[test]
    fn test_arbitration_lost_in_start() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::with_sink(
            bus.scl(),
            bus.sda(),
            NoDelay,
            BusConfig::default(),
            RecordingSink::new(),
        );

        bus.set_contender(true);
        i2c.start();

        // Reported, but the session still opens
        assert!(i2c.is_started());
        assert_eq!(
            i2c.sink().count(Diagnostic::ArbitrationLost(Condition::Start)),
            1
        );
    }

    #[test]
    fn test_arbitration_lost_in_stop() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::with_sink(
            bus.scl(),
            bus.sda(),
            NoDelay,
            BusConfig::default(),
            RecordingSink::new(),
        );

        i2c.start();
        bus.set_contender(true);
        i2c.stop();

        assert!(!i2c.is_started());
        assert_eq!(
            i2c.sink().events.as_slice(),
            &[Diagnostic::ArbitrationLost(Condition::Stop)]
        );
    }

    #[test]
    fn test_arbitration_lost_in_write_bit() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::with_sink(
            bus.scl(),
            bus.sda(),
            NoDelay,
            BusConfig::default(),
            RecordingSink::new(),
        );

        i2c.start();
        bus.set_contender(true);
        i2c.write_bit(false);
        assert!(i2c.sink().events.is_empty());

        i2c.write_bit(true);
        assert_eq!(
            i2c.sink().events.as_slice(),
            &[Diagnostic::ArbitrationLost(Condition::WriteBit)]
        );
        // Bit slot still completed
        assert!(!bus.scl_level());
    }

    #[test]
    fn test_clock_stretch_within_budget() {
        let bus = SimBus::new();
        let config = BusConfig::default().with_stretch_retries(10);
        let mut i2c =
            SoftI2c::with_sink(bus.scl(), bus.sda(), NoDelay, config, RecordingSink::new());

        i2c.start();
        bus.stretch_clock(10);
        let before = bus.scl_pulses();
        i2c.write_bit(true);

        assert!(i2c.sink().events.is_empty());
        assert_eq!(bus.scl_pulses(), before + 1);
    }

    #[test]
    fn test_clock_stretch_expired_proceeds() {
        let bus = SimBus::new();
        let config = BusConfig::default().with_stretch_retries(10);
        let mut i2c =
            SoftI2c::with_sink(bus.scl(), bus.sda(), NoDelay, config, RecordingSink::new());

        i2c.start();
        bus.stretch_clock(11);
        i2c.write_bit(false);

        assert_eq!(
            i2c.sink().events.as_slice(),
            &[Diagnostic::ClockStretchExpired(Condition::WriteBit)]
        );
        assert!(i2c.is_started());
    }

    #[test]
    fn test_init_resets_session() {
        let bus = SimBus::new();
        let mut i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());

        i2c.start();
        i2c.init();
        assert!(!i2c.is_started());
        assert!(bus.scl_level());
        assert!(bus.sda_level());
    }
}
