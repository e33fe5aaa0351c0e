//! Byte-level transactions
//!
//! Bytes go out most significant bit first, each followed by an ack slot
//! driven by the receiver: 0 means acknowledged. The register helpers
//! always leave the bus stopped, whatever happened on the way.

use bitwire_hal::i2c::Direction;
use bitwire_hal::{I2cBus, OpenDrainLine};
use embedded_hal::delay::DelayNs;

use crate::bus::SoftI2c;
use crate::diag::DiagnosticSink;
use crate::error::TransactionError;

/// Acknowledge bit sent by the master after reading a byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ack {
    /// Pull SDA low: send the next byte
    Ack,
    /// Leave SDA high: that was the last byte
    Nack,
}

impl Ack {
    /// Ack for all bytes but the last of a read of `len` bytes
    pub fn for_position(index: usize, len: usize) -> Self {
        if index + 1 == len {
            Ack::Nack
        } else {
            Ack::Ack
        }
    }

    fn bit(self) -> bool {
        matches!(self, Ack::Nack)
    }
}

impl<SCL, SDA, D, S> SoftI2c<SCL, SDA, D, S>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
    S: DiagnosticSink,
{
    /// Write one byte, returning whether the receiver acknowledged it
    ///
    /// A receiver that leaves SDA floating counts as a nack.
    pub fn write_byte(&mut self, byte: u8) -> bool {
        for bit in (0..8).rev() {
            self.write_bit(byte & (1 << bit) != 0);
        }
        let nack = self.read_bit();
        !nack
    }

    /// Read one byte, then send `ack`
    ///
    /// Send [`Ack::Nack`] after the last byte of a read so the device
    /// lets go of SDA before the stop.
    pub fn read_byte(&mut self, ack: Ack) -> u8 {
        let mut byte = 0u8;
        for _ in 0..8 {
            byte = (byte << 1) | self.read_bit() as u8;
        }
        self.write_bit(ack.bit());
        byte
    }

    /// Write `data` to the device at `address`
    ///
    /// Stops sending at the first refused byte. The bus is stopped before
    /// returning in every case.
    pub fn slave_write(&mut self, address: u8, data: &[u8]) -> Result<(), TransactionError> {
        self.start();
        let result = self.write_payload(address, data);
        self.stop();
        result
    }

    /// Write `value` to `register` on the device at `address`
    pub fn slave_write_with_register(
        &mut self,
        address: u8,
        register: u8,
        value: u8,
    ) -> Result<(), TransactionError> {
        self.slave_write(address, &[register, value])
    }

    /// Read `buf.len()` bytes from the device at `address`, starting at
    /// `register`
    ///
    /// Two transactions: the register pointer is written and stopped,
    /// then a fresh start reads the data back. The ack on the register
    /// byte is not checked; a device that refuses it will show up as a
    /// nack on the read address. The bus ends stopped either way.
    ///
    /// With an empty `buf` only the register pointer is written: a device
    /// addressed for reading would start driving SDA, and no stop could
    /// follow without clocking a byte out of it.
    pub fn slave_read(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransactionError> {
        let result = self.read_phases(address, register, buf);
        if self.is_started() {
            self.stop();
        }
        result
    }

    fn write_payload(&mut self, address: u8, data: &[u8]) -> Result<(), TransactionError> {
        if !self.write_byte(Direction::Write.address_byte(address)) {
            return Err(TransactionError::AddressNack);
        }
        for (index, byte) in data.iter().enumerate() {
            if !self.write_byte(*byte) {
                return Err(TransactionError::DataNack { index });
            }
        }
        Ok(())
    }

    fn read_phases(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), TransactionError> {
        self.start();
        if !self.write_byte(Direction::Write.address_byte(address)) {
            return Err(TransactionError::AddressNack);
        }
        self.write_byte(register);
        self.stop();
        if buf.is_empty() {
            return Ok(());
        }

        self.start();
        if !self.write_byte(Direction::Read.address_byte(address)) {
            return Err(TransactionError::AddressNack);
        }
        let len = buf.len();
        for (index, slot) in buf.iter_mut().enumerate() {
            *slot = self.read_byte(Ack::for_position(index, len));
        }
        Ok(())
    }
}

impl<SCL, SDA, D, S> I2cBus for SoftI2c<SCL, SDA, D, S>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
    S: DiagnosticSink,
{
    type Error = TransactionError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.slave_write(address, data)
    }

    fn write_register(&mut self, address: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.slave_write_with_register(address, register, value)
    }

    fn read_registers(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        self.slave_read(address, register, buf)
    }
}
