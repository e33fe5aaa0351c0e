//! `embedded-hal` I2C implementation
//!
//! Lets any driver written against `embedded_hal::i2c::I2c` run on the
//! software bus. Follows the trait's transaction contract: consecutive
//! operations of the same kind share one address phase, a change of
//! direction issues a repeated start, and the last byte read before a
//! direction change or the stop is nacked. Empty reads are skipped
//! without addressing the device, since a target addressed for reading
//! drives SDA until a byte is clocked out of it.

use bitwire_hal::i2c::Direction;
use bitwire_hal::OpenDrainLine;
use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use crate::bus::SoftI2c;
use crate::diag::DiagnosticSink;
use crate::error::TransactionError;
use crate::transaction::Ack;

impl<SCL, SDA, D, S> ErrorType for SoftI2c<SCL, SDA, D, S> {
    type Error = TransactionError;
}

impl<SCL, SDA, D, S> I2c<SevenBitAddress> for SoftI2c<SCL, SDA, D, S>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
    S: DiagnosticSink,
{
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let result = self.run_operations(address, operations);
        if self.is_started() {
            self.stop();
        }
        result
    }
}

impl<SCL, SDA, D, S> SoftI2c<SCL, SDA, D, S>
where
    SCL: OpenDrainLine,
    SDA: OpenDrainLine,
    D: DelayNs,
    S: DiagnosticSink,
{
    fn run_operations(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), TransactionError> {
        let mut previous: Option<Direction> = None;

        for i in 0..operations.len() {
            // Bytes still to come in this run of reads decide the final nack
            let more_reads = operations[i + 1..]
                .iter()
                .take_while(|op| matches!(op, Operation::Read(_)))
                .any(|op| matches!(op, Operation::Read(buf) if !buf.is_empty()));

            match &mut operations[i] {
                Operation::Write(bytes) => {
                    if previous != Some(Direction::Write) {
                        self.address(address, Direction::Write)?;
                    }
                    for (index, byte) in bytes.iter().enumerate() {
                        if !self.write_byte(*byte) {
                            return Err(TransactionError::DataNack { index });
                        }
                    }
                    previous = Some(Direction::Write);
                }
                Operation::Read(buf) if buf.is_empty() => {}
                Operation::Read(buf) => {
                    if previous != Some(Direction::Read) {
                        self.address(address, Direction::Read)?;
                    }
                    let len = buf.len();
                    for (index, slot) in buf.iter_mut().enumerate() {
                        let ack = if more_reads {
                            Ack::Ack
                        } else {
                            Ack::for_position(index, len)
                        };
                        *slot = self.read_byte(ack);
                    }
                    previous = Some(Direction::Read);
                }
            }
        }
        Ok(())
    }

    /// (Repeated) start followed by the address byte
    fn address(&mut self, address: u8, direction: Direction) -> Result<(), TransactionError> {
        self.start();
        if self.write_byte(direction.address_byte(address)) {
            Ok(())
        } else {
            Err(TransactionError::AddressNack)
        }
    }
}
