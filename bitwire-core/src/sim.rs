//! Simulated two-wire bus for host tests
//!
//! Models the wired-AND behaviour of an open-drain bus: a line reads high
//! only when the master, the simulated target and an optional contender
//! have all released it. The target is a register-file device (the shape
//! of most I2C sensors) that decodes START/STOP, addresses, register
//! writes and register reads bit by bit from the line edges, so the
//! engine under test is exercised exactly as on hardware.
//!
//! No real time passes: clock stretching is counted in SCL samples.

use core::cell::RefCell;

use bitwire_hal::OpenDrainLine;
use embedded_hal::delay::DelayNs;
use heapless::Vec;

use crate::diag::{Diagnostic, DiagnosticSink};
use crate::line::Line;

/// Maximum number of bus events kept; later events are dropped
pub const EVENT_CAPACITY: usize = 64;

/// Maximum number of diagnostics a [`RecordingSink`] keeps
pub const DIAGNOSTIC_CAPACITY: usize = 32;

/// Something observed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// SDA fell while SCL was high
    Start,
    /// SDA rose while SCL was high
    Stop,
    /// The target matched an address byte and acknowledged it
    Address {
        /// 7-bit address
        address: u8,
        /// R/W bit was set
        read: bool,
    },
    /// The target received a payload byte
    Written {
        /// Byte value
        byte: u8,
        /// Whether the target acknowledged it
        acked: bool,
    },
    /// The target sent a byte
    Sent(u8),
    /// The master acknowledged a byte sent by the target
    MasterAck,
    /// The master refused a byte sent by the target
    MasterNack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Address,
    Write,
    Read,
    ReadDone,
}

/// Register-file I2C target
///
/// The first byte written after the address sets the register pointer;
/// following bytes are stored at the pointer, which auto-increments.
/// Reads start at the pointer and auto-increment as well.
pub struct SimTarget {
    address: u8,
    registers: [u8; 256],
    pointer: u8,
    nack_data_at: Option<usize>,
    mode: Mode,
    pending: Mode,
    shift: u8,
    bits: u8,
    tx: u8,
    write_index: usize,
    refused: bool,
    master_nacked: bool,
    sda_low: bool,
}

impl SimTarget {
    /// Target answering at `address`, all registers zero
    pub fn new(address: u8) -> Self {
        Self {
            address,
            registers: [0; 256],
            pointer: 0,
            nack_data_at: None,
            mode: Mode::Idle,
            pending: Mode::Idle,
            shift: 0,
            bits: 0,
            tx: 0,
            write_index: 0,
            refused: false,
            master_nacked: false,
            sda_low: false,
        }
    }

    fn on_start(&mut self) {
        self.mode = Mode::Address;
        self.shift = 0;
        self.bits = 0;
        self.sda_low = false;
    }

    fn on_stop(&mut self) {
        self.mode = Mode::Idle;
        self.sda_low = false;
    }

    fn on_scl_rise(&mut self, sda: bool, events: &mut Vec<BusEvent, EVENT_CAPACITY>) {
        match self.mode {
            Mode::Idle | Mode::ReadDone => {}
            Mode::Address | Mode::Write => {
                if self.bits < 8 {
                    self.shift = (self.shift << 1) | sda as u8;
                    self.bits += 1;
                } else if self.bits == 8 {
                    self.bits = 9;
                }
            }
            Mode::Read => {
                if self.bits < 8 {
                    self.bits += 1;
                } else if self.bits == 8 {
                    self.master_nacked = sda;
                    let event = if sda {
                        BusEvent::MasterNack
                    } else {
                        BusEvent::MasterAck
                    };
                    let _ = events.push(event);
                    self.bits = 9;
                }
            }
        }
    }

    fn on_scl_fall(&mut self, events: &mut Vec<BusEvent, EVENT_CAPACITY>) {
        match self.mode {
            Mode::Idle | Mode::ReadDone => {}
            Mode::Address => {
                if self.bits == 8 {
                    let address = self.shift >> 1;
                    let read = self.shift & 1 == 1;
                    if address == self.address {
                        let _ = events.push(BusEvent::Address { address, read });
                        self.sda_low = true;
                        self.pending = if read { Mode::Read } else { Mode::Write };
                        self.write_index = 0;
                    } else {
                        // Not for us: stay off the bus until the next START
                        self.mode = Mode::Idle;
                    }
                } else if self.bits == 9 {
                    self.end_of_byte();
                    self.mode = self.pending;
                    if self.mode == Mode::Read {
                        self.load_next(events);
                    }
                }
            }
            Mode::Write => {
                if self.bits == 8 {
                    let byte = self.shift;
                    let acked = self.nack_data_at != Some(self.write_index);
                    if acked {
                        if self.write_index == 0 {
                            self.pointer = byte;
                        } else {
                            self.registers[self.pointer as usize] = byte;
                            self.pointer = self.pointer.wrapping_add(1);
                        }
                        self.sda_low = true;
                    } else {
                        self.refused = true;
                    }
                    let _ = events.push(BusEvent::Written { byte, acked });
                    self.write_index += 1;
                } else if self.bits == 9 {
                    self.end_of_byte();
                    if self.refused {
                        self.refused = false;
                        self.mode = Mode::Idle;
                    }
                }
            }
            Mode::Read => {
                if self.bits == 8 {
                    // Hand SDA to the master for its ack bit
                    self.sda_low = false;
                } else if self.bits == 9 {
                    self.end_of_byte();
                    if self.master_nacked {
                        self.mode = Mode::ReadDone;
                    } else {
                        self.load_next(events);
                    }
                } else if self.bits > 0 {
                    self.drive_bit(self.bits);
                }
            }
        }
    }

    fn end_of_byte(&mut self) {
        self.sda_low = false;
        self.bits = 0;
        self.shift = 0;
    }

    fn load_next(&mut self, events: &mut Vec<BusEvent, EVENT_CAPACITY>) {
        self.tx = self.registers[self.pointer as usize];
        let _ = events.push(BusEvent::Sent(self.tx));
        self.pointer = self.pointer.wrapping_add(1);
        self.master_nacked = false;
        self.drive_bit(0);
    }

    fn drive_bit(&mut self, index: u8) {
        self.sda_low = self.tx & (0x80 >> index) == 0;
    }
}

struct Wire {
    master_scl_low: bool,
    master_sda_low: bool,
    target_scl_low: bool,
    contender_sda_low: bool,
    last_scl: bool,
    last_sda: bool,
    stretch_armed: u32,
    stretch_hold: u32,
    scl_pulses: u32,
    configured: [bool; 2],
    target: Option<SimTarget>,
    events: Vec<BusEvent, EVENT_CAPACITY>,
}

impl Wire {
    fn scl_level(&self) -> bool {
        !(self.master_scl_low || self.target_scl_low)
    }

    fn sda_level(&self) -> bool {
        let target_low = self.target.as_ref().is_some_and(|t| t.sda_low);
        !(self.master_sda_low || target_low || self.contender_sda_low)
    }

    /// Propagate level changes to the target until the wire is stable
    fn settle(&mut self) {
        loop {
            let scl = self.scl_level();
            let sda = self.sda_level();
            if scl == self.last_scl && sda == self.last_sda {
                break;
            }
            let scl_changed = scl != self.last_scl;
            self.last_scl = scl;
            self.last_sda = sda;

            if scl_changed {
                if scl {
                    self.scl_pulses += 1;
                    if let Some(target) = self.target.as_mut() {
                        target.on_scl_rise(sda, &mut self.events);
                    }
                } else if let Some(target) = self.target.as_mut() {
                    target.on_scl_fall(&mut self.events);
                }
            } else if scl {
                if sda {
                    let _ = self.events.push(BusEvent::Stop);
                    if let Some(target) = self.target.as_mut() {
                        target.on_stop();
                    }
                } else {
                    let _ = self.events.push(BusEvent::Start);
                    if let Some(target) = self.target.as_mut() {
                        target.on_start();
                    }
                }
            }
        }
    }

    fn release(&mut self, line: Line) {
        match line {
            Line::Clock => {
                if self.master_scl_low && self.stretch_armed > 0 {
                    self.stretch_hold = self.stretch_armed;
                    self.stretch_armed = 0;
                    self.target_scl_low = true;
                }
                self.master_scl_low = false;
            }
            Line::Data => self.master_sda_low = false,
        }
        self.settle();
    }

    fn drive_low(&mut self, line: Line) {
        match line {
            Line::Clock => self.master_scl_low = true,
            Line::Data => self.master_sda_low = true,
        }
        self.settle();
    }

    fn sample(&mut self, line: Line) -> bool {
        match line {
            Line::Clock => {
                if self.stretch_hold > 0 {
                    self.stretch_hold -= 1;
                    if self.stretch_hold == 0 {
                        self.target_scl_low = false;
                        self.settle();
                    }
                    return false;
                }
                self.scl_level()
            }
            Line::Data => self.sda_level(),
        }
    }
}

/// A simulated bus with at most one target
pub struct SimBus {
    wire: RefCell<Wire>,
}

impl Default for SimBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SimBus {
    /// Bus with pull-ups and nothing attached
    pub fn new() -> Self {
        Self {
            wire: RefCell::new(Wire {
                master_scl_low: false,
                master_sda_low: false,
                target_scl_low: false,
                contender_sda_low: false,
                last_scl: true,
                last_sda: true,
                stretch_armed: 0,
                stretch_hold: 0,
                scl_pulses: 0,
                configured: [false; 2],
                target: None,
                events: Vec::new(),
            }),
        }
    }

    /// Bus with a register-file target at `address`
    pub fn with_target(address: u8) -> Self {
        let bus = Self::new();
        bus.wire.borrow_mut().target = Some(SimTarget::new(address));
        bus
    }

    /// Handle for the master's SCL
    pub fn scl(&self) -> SimLine<'_> {
        SimLine {
            bus: self,
            line: Line::Clock,
        }
    }

    /// Handle for the master's SDA
    pub fn sda(&self) -> SimLine<'_> {
        SimLine {
            bus: self,
            line: Line::Data,
        }
    }

    /// Current SCL level on the wire
    pub fn scl_level(&self) -> bool {
        self.wire.borrow().scl_level()
    }

    /// Current SDA level on the wire
    pub fn sda_level(&self) -> bool {
        self.wire.borrow().sda_level()
    }

    /// Whether both lines went through `configure`
    pub fn is_configured(&self) -> bool {
        self.wire.borrow().configured == [true, true]
    }

    /// Have a third device hold SDA low (or let go)
    pub fn set_contender(&self, holding_low: bool) {
        let mut wire = self.wire.borrow_mut();
        wire.contender_sda_low = holding_low;
        wire.settle();
    }

    /// Stretch the clock the next time the master releases SCL
    ///
    /// SCL then reads low for exactly `samples` master samples.
    pub fn stretch_clock(&self, samples: u32) {
        self.wire.borrow_mut().stretch_armed = samples;
    }

    /// Number of SCL rising edges so far
    pub fn scl_pulses(&self) -> u32 {
        self.wire.borrow().scl_pulses
    }

    /// Events recorded so far
    pub fn events(&self) -> Vec<BusEvent, EVENT_CAPACITY> {
        self.wire.borrow().events.clone()
    }

    /// Forget recorded events
    pub fn clear_events(&self) {
        self.wire.borrow_mut().events.clear();
    }

    /// Number of recorded events equal to `event`
    pub fn count(&self, event: BusEvent) -> usize {
        self.wire
            .borrow()
            .events
            .iter()
            .filter(|e| **e == event)
            .count()
    }

    /// Read a target register directly
    pub fn register(&self, register: u8) -> u8 {
        self.wire
            .borrow()
            .target
            .as_ref()
            .map_or(0, |t| t.registers[register as usize])
    }

    /// Preload target registers starting at `register`
    pub fn set_registers(&self, register: u8, values: &[u8]) {
        let mut wire = self.wire.borrow_mut();
        if let Some(target) = wire.target.as_mut() {
            for (i, value) in values.iter().enumerate() {
                let slot = register.wrapping_add(i as u8) as usize;
                target.registers[slot] = *value;
            }
        }
    }

    /// Make the target refuse the payload byte at `index` (0 = register byte)
    pub fn nack_data_at(&self, index: Option<usize>) {
        if let Some(target) = self.wire.borrow_mut().target.as_mut() {
            target.nack_data_at = index;
        }
    }
}

/// One master line of a [`SimBus`]
pub struct SimLine<'a> {
    bus: &'a SimBus,
    line: Line,
}

impl OpenDrainLine for SimLine<'_> {
    fn configure(&mut self) {
        let index = match self.line {
            Line::Clock => 0,
            Line::Data => 1,
        };
        self.bus.wire.borrow_mut().configured[index] = true;
    }

    fn release(&mut self) {
        self.bus.wire.borrow_mut().release(self.line);
    }

    fn drive_low(&mut self) {
        self.bus.wire.borrow_mut().drive_low(self.line);
    }

    fn is_high(&mut self) -> bool {
        self.bus.wire.borrow_mut().sample(self.line)
    }
}

/// Delay source that returns immediately
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Sink that keeps the diagnostics it receives
#[derive(Debug, Default)]
pub struct RecordingSink {
    /// Events in arrival order
    pub events: Vec<Diagnostic, DIAGNOSTIC_CAPACITY>,
}

impl RecordingSink {
    /// Empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded events equal to `event`
    pub fn count(&self, event: Diagnostic) -> usize {
        self.events.iter().filter(|e| **e == event).count()
    }
}

impl DiagnosticSink for RecordingSink {
    fn report(&mut self, event: Diagnostic) {
        let _ = self.events.push(event);
    }
}
