//! ADXL345 3-axis accelerometer (I2C mode)
//!
//! Analog Devices digital accelerometer with 13-bit resolution at ±16 g.
//!
//! # Bus protocol
//!
//! Register access over I2C at 0x53 (ALT ADDRESS pin low) or 0x1D (pin
//! high). Multi-byte reads auto-increment the register pointer, so all
//! six axis registers come back in one read starting at DATAX0.
//!
//! # Configuration used
//!
//! - Measurement mode (POWER_CTL.Measure)
//! - Full resolution, ±16 g range (DATA_FORMAT = 0x0B): 3.9 mg/LSB
//! - 50 Hz output data rate (BW_RATE = 0x09)

use bitwire_hal::I2cBus;

/// Address with ALT ADDRESS tied low
pub const DEFAULT_ADDRESS: u8 = 0x53;

/// Address with ALT ADDRESS tied high
pub const ALT_ADDRESS: u8 = 0x1D;

/// Fixed value of the DEVID register
pub const DEVICE_ID: u8 = 0xE5;

/// ADXL345 register addresses
pub mod reg {
    /// Device ID (reads 0xE5)
    pub const DEVID: u8 = 0x00;
    /// Data rate and power mode control
    pub const BW_RATE: u8 = 0x2C;
    /// Power-saving features control
    pub const POWER_CTL: u8 = 0x2D;
    /// Data format control
    pub const DATA_FORMAT: u8 = 0x31;
    /// X-axis data 0 (first of six data registers)
    pub const DATAX0: u8 = 0x32;
}

/// POWER_CTL: leave standby and start measuring
const POWER_CTL_MEASURE: u8 = 1 << 3;

/// DATA_FORMAT: FULL_RES with range bits = ±16 g
const DATA_FORMAT_FULL_RES_16G: u8 = 0x0B;

/// BW_RATE: 50 Hz output data rate, normal power
const BW_RATE_50HZ: u8 = 0x09;

/// Number of bytes in one X/Y/Z sample
const SAMPLE_LEN: usize = 6;

/// Scale in full-resolution mode, in tenths of a milli-g per LSB
const SCALE_MG_X10: i32 = 39;

/// Errors from the ADXL345 driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Adxl345Error<E> {
    /// Bus transaction failed
    Bus(E),
    /// DEVID did not read 0xE5
    WrongDevice(u8),
}

impl<E> From<E> for Adxl345Error<E> {
    fn from(e: E) -> Self {
        Adxl345Error::Bus(e)
    }
}

/// One acceleration sample in raw counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Acceleration {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl Acceleration {
    /// Decode the six data registers (little-endian, two's complement)
    pub fn from_registers(buf: &[u8; SAMPLE_LEN]) -> Self {
        Self {
            x: i16::from_le_bytes([buf[0], buf[1]]),
            y: i16::from_le_bytes([buf[2], buf[3]]),
            z: i16::from_le_bytes([buf[4], buf[5]]),
        }
    }

    /// Convert to milli-g, assuming full-resolution mode
    pub fn to_milli_g(&self) -> (i32, i32, i32) {
        let scale = |raw: i16| raw as i32 * SCALE_MG_X10 / 10;
        (scale(self.x), scale(self.y), scale(self.z))
    }
}

/// ADXL345 driver
pub struct Adxl345<B> {
    bus: B,
    address: u8,
}

impl<B: I2cBus> Adxl345<B> {
    /// Create a driver at the default address (0x53)
    pub fn new(bus: B) -> Self {
        Self::with_address(bus, DEFAULT_ADDRESS)
    }

    /// Create a driver at a specific address
    pub fn with_address(bus: B, address: u8) -> Self {
        Self { bus, address }
    }

    /// Device address in use
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Put the sensor in measurement mode
    ///
    /// Writes POWER_CTL, DATA_FORMAT and BW_RATE in that order. Every
    /// write is attempted even if an earlier one failed; the first error
    /// is returned.
    pub fn init(&mut self) -> Result<(), Adxl345Error<B::Error>> {
        let writes = [
            (reg::POWER_CTL, POWER_CTL_MEASURE),
            (reg::DATA_FORMAT, DATA_FORMAT_FULL_RES_16G),
            (reg::BW_RATE, BW_RATE_50HZ),
        ];
        let mut result = Ok(());
        for (register, value) in writes {
            if let Err(e) = self.bus.write_register(self.address, register, value) {
                if result.is_ok() {
                    result = Err(Adxl345Error::Bus(e));
                }
            }
        }
        result
    }

    /// Read the DEVID register
    pub fn device_id(&mut self) -> Result<u8, Adxl345Error<B::Error>> {
        Ok(self.bus.read_register(self.address, reg::DEVID)?)
    }

    /// Check that an ADXL345 answers at the configured address
    pub fn verify(&mut self) -> Result<(), Adxl345Error<B::Error>> {
        match self.device_id()? {
            DEVICE_ID => Ok(()),
            other => Err(Adxl345Error::WrongDevice(other)),
        }
    }

    /// Read one X/Y/Z sample
    pub fn read_acceleration(&mut self) -> Result<Acceleration, Adxl345Error<B::Error>> {
        let mut buf = [0u8; SAMPLE_LEN];
        self.bus
            .read_registers(self.address, reg::DATAX0, &mut buf)?;
        Ok(Acceleration::from_registers(&buf))
    }

    /// Borrow the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Give back the bus
    pub fn release(self) -> B {
        self.bus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitwire_core::sim::{BusEvent, NoDelay, SimBus};
    use bitwire_core::{BusConfig, SoftI2c, TransactionError};

    #[test]
    fn test_decode_sample() {
        let sample = Acceleration::from_registers(&[0x10, 0x00, 0xF0, 0xFF, 0x00, 0x01]);
        assert_eq!(sample, Acceleration { x: 16, y: -16, z: 256 });
    }

    #[test]
    fn test_to_milli_g() {
        // 256 LSB ≈ 1 g in full resolution
        let sample = Acceleration { x: 0, y: -10, z: 256 };
        assert_eq!(sample.to_milli_g(), (0, -39, 998));
    }

    #[test]
    fn test_init_writes_configuration() {
        let bus = SimBus::with_target(DEFAULT_ADDRESS);
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        accel.init().unwrap();

        assert_eq!(bus.register(reg::POWER_CTL), 0x08);
        assert_eq!(bus.register(reg::DATA_FORMAT), 0x0B);
        assert_eq!(bus.register(reg::BW_RATE), 0x09);
        assert_eq!(bus.count(BusEvent::Stop), 3);
    }

    #[test]
    fn test_init_without_device() {
        let bus = SimBus::new();
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        assert_eq!(
            accel.init(),
            Err(Adxl345Error::Bus(TransactionError::AddressNack))
        );
        // Each write was tried and each left the bus stopped
        assert_eq!(bus.count(BusEvent::Start), 3);
        assert_eq!(bus.count(BusEvent::Stop), 3);
    }

    #[test]
    fn test_init_continues_past_refused_write() {
        let bus = SimBus::with_target(DEFAULT_ADDRESS);
        // Refuse the value byte of every write
        bus.nack_data_at(Some(1));
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        assert_eq!(
            accel.init(),
            Err(Adxl345Error::Bus(TransactionError::DataNack { index: 1 }))
        );
        assert_eq!(
            bus.count(BusEvent::Written {
                byte: reg::BW_RATE,
                acked: true
            }),
            1
        );
        assert_eq!(bus.count(BusEvent::Stop), 3);
    }

    #[test]
    fn test_verify() {
        let bus = SimBus::with_target(DEFAULT_ADDRESS);
        bus.set_registers(reg::DEVID, &[DEVICE_ID]);
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        assert_eq!(accel.device_id(), Ok(DEVICE_ID));
        assert_eq!(accel.verify(), Ok(()));
    }

    #[test]
    fn test_verify_wrong_device() {
        let bus = SimBus::with_target(ALT_ADDRESS);
        bus.set_registers(reg::DEVID, &[0x42]);
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::with_address(i2c, ALT_ADDRESS);

        assert_eq!(accel.address(), ALT_ADDRESS);
        assert_eq!(accel.verify(), Err(Adxl345Error::WrongDevice(0x42)));
    }

    #[test]
    fn test_read_acceleration() {
        let bus = SimBus::with_target(DEFAULT_ADDRESS);
        bus.set_registers(reg::DATAX0, &[0x05, 0x00, 0xFB, 0xFF, 0x00, 0x01]);
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        let sample = accel.read_acceleration().unwrap();
        assert_eq!(sample, Acceleration { x: 5, y: -5, z: 256 });

        // Six bytes: ack after the first five, nack after the sixth
        assert_eq!(bus.count(BusEvent::MasterAck), 5);
        assert_eq!(bus.count(BusEvent::MasterNack), 1);

        let i2c = accel.release();
        assert!(!i2c.is_started());
    }

    #[test]
    fn test_read_acceleration_without_device() {
        let bus = SimBus::new();
        let i2c = SoftI2c::new(bus.scl(), bus.sda(), NoDelay, BusConfig::default());
        let mut accel = Adxl345::new(i2c);

        assert_eq!(
            accel.read_acceleration(),
            Err(Adxl345Error::Bus(TransactionError::AddressNack))
        );
    }
}
