//! I2C bus abstractions
//!
//! Register-oriented transactions, the shape almost every sensor and
//! configuration chip speaks. Device drivers are generic over this trait
//! so they run on the software engine, a hardware controller, or a test
//! double alike.

/// I2C bus master
///
/// Every method runs a complete transaction and leaves the bus stopped,
/// whether it succeeds or not.
pub trait I2cBus {
    /// Error type for I2C operations
    type Error;

    /// Write data to a device at the given address
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `data` - Bytes to write
    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error>;

    /// Write a single register
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - Register address on the device
    /// * `value` - Value to store
    fn write_register(&mut self, address: u8, register: u8, value: u8)
        -> Result<(), Self::Error>;

    /// Read consecutive registers starting at `register`
    ///
    /// The register pointer is set in one transaction, then `buf.len()`
    /// bytes are read in a second one.
    ///
    /// # Arguments
    /// * `address` - 7-bit I2C address
    /// * `register` - First register to read
    /// * `buf` - Buffer to read into
    fn read_registers(&mut self, address: u8, register: u8, buf: &mut [u8])
        -> Result<(), Self::Error>;

    /// Read a single register
    fn read_register(&mut self, address: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_registers(address, register, &mut buf)?;
        Ok(buf[0])
    }
}

/// Data direction, encoded in the low bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Master writes to the device (R/W bit 0)
    Write,
    /// Master reads from the device (R/W bit 1)
    Read,
}

impl Direction {
    /// Build the on-wire address byte for a 7-bit address
    pub fn address_byte(self, address: u8) -> u8 {
        let rw = match self {
            Direction::Write => 0,
            Direction::Read => 1,
        };
        (address << 1) | rw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_byte() {
        assert_eq!(Direction::Write.address_byte(0x53), 0xA6);
        assert_eq!(Direction::Read.address_byte(0x53), 0xA7);
        assert_eq!(Direction::Write.address_byte(0x1D), 0x3A);
    }

    /// Bus double that records the last register write and serves reads
    /// from a small register file
    struct RegisterFile {
        regs: [u8; 4],
    }

    impl I2cBus for RegisterFile {
        type Error = ();

        fn write(&mut self, _address: u8, data: &[u8]) -> Result<(), ()> {
            match data {
                [reg, value] => self.write_register(0, *reg, *value),
                _ => Err(()),
            }
        }

        fn write_register(&mut self, _address: u8, register: u8, value: u8) -> Result<(), ()> {
            let slot = self.regs.get_mut(register as usize).ok_or(())?;
            *slot = value;
            Ok(())
        }

        fn read_registers(&mut self, _address: u8, register: u8, buf: &mut [u8]) -> Result<(), ()> {
            let start = register as usize;
            let src = self.regs.get(start..start + buf.len()).ok_or(())?;
            buf.copy_from_slice(src);
            Ok(())
        }
    }

    #[test]
    fn test_read_register_default() {
        let mut bus = RegisterFile { regs: [0; 4] };
        bus.write(0x10, &[2, 0x5A]).unwrap();
        assert_eq!(bus.read_register(0x10, 2), Ok(0x5A));
        assert_eq!(bus.read_register(0x10, 9), Err(()));
    }
}
