//! SX127x Register Protocol
//!
//! This module provides the register-level transaction protocol for SX127x series radios.
//! Every access is exactly one SPI transaction: an address byte followed by the data
//! bytes. Bit 7 of the address byte selects the direction:
//! - `0` = read, the device replies with the register contents
//! - `1` = write, the byte(s) after the address are stored
//!
//! The interface is built around the `Device<SPI>` struct which wraps an SPI device and
//! provides methods for:
//! - Reading and writing single registers, raw or typed
//! - Moving blocks of bytes through the FIFO in one uninterrupted transaction
//!
//! Chip select framing and bus exclusivity are owned by the `SpiDevice` implementation.
//! Nothing in this module logs, since it is also driven from interrupt context.
//!
//! # Example
//! ```no_run
//! use sx127x::{Device, registers::Version};
//!
//! fn probe<SPI: embedded_hal::spi::SpiDevice>(spi: SPI) -> Result<u8, sx127x::RegisterError> {
//!     let mut device = Device::new(spi);
//!     let version: Version = device.read_register()?;
//!     Ok(version.revision)
//! }
//! ```

use core::convert::Infallible;

use embedded_hal::spi::Operation;
use regiface::{errors::Error as RegifaceError, ByteArray, ReadableRegister, WritableRegister};

/// Address bit that turns a register access into a write.
pub const WRITE_FLAG: u8 = 0x80;

/// Mask selecting the 7-bit register address.
pub const ADDRESS_MASK: u8 = 0x7F;

/// Register-level interface for the SX127x radio.
///
/// This struct wraps an SPI device and provides the register transactions used by the
/// radio state machine.
pub struct Device<SPI> {
    spi: SPI,
}

impl<SPI> Device<SPI> {
    /// Creates a new Device instance wrapping the provided SPI device.
    ///
    /// # Arguments
    /// * `spi` - An SPI device implementing the embedded-hal `SpiDevice` trait
    pub fn new(spi: SPI) -> Self {
        Self { spi }
    }

    /// Releases the underlying SPI device.
    pub fn release(self) -> SPI {
        self.spi
    }
}

impl<SPI> Device<SPI>
where
    SPI: embedded_hal::spi::SpiDevice,
{
    /// Reads one register.
    ///
    /// The address and a dummy byte are clocked out in place; the byte clocked in
    /// alongside the dummy is the register value.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn read(&mut self, address: u8) -> Result<u8, RegifaceError> {
        let mut frame = [address & ADDRESS_MASK, 0x00];

        self.spi
            .transaction(&mut [Operation::TransferInPlace(&mut frame)])
            .map_err(|_| RegifaceError::BusError)?;

        Ok(frame[1])
    }

    /// Writes one register.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), RegifaceError> {
        let mut frame = [address | WRITE_FLAG, value];

        self.spi
            .transaction(&mut [Operation::TransferInPlace(&mut frame)])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Exchanges a block of bytes with a register in a single transaction.
    ///
    /// The address byte (with bit 7 already set for a write) is followed by
    /// `buffer.len()` bytes. Every byte clocked out is paired with one clocked in, so on
    /// return `buffer` holds the device's reply. For a FIFO read that is the payload;
    /// for a FIFO write the reply is meaningless and the caller should pass a scratch
    /// copy of its data.
    ///
    /// Splitting this into several transactions drops bytes at FIFO speeds.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn transfer_block(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), RegifaceError> {
        self.spi
            .transaction(&mut [
                Operation::Write(&[address]),
                Operation::TransferInPlace(buffer),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Reads the raw byte of a typed register, keeping bits the type does not model.
    pub fn read_byte<R>(&mut self) -> Result<u8, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        self.read(R::id())
    }

    /// Writes a raw byte to a typed register's address.
    pub fn write_byte<R>(&mut self, value: u8) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8>,
    {
        self.write(R::id(), value)
    }

    /// Reads a typed register value from the device.
    ///
    /// # Type Parameters
    /// * `R` - Register type implementing ReadableRegister with u8 ID
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    /// * `RegifaceError::DeserializationError` - Failed to parse register value
    pub fn read_register<R>(&mut self) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8>,
    {
        let mut raw_value = R::Array::new();

        self.spi
            .transaction(&mut [
                Operation::Write(&[R::id() & ADDRESS_MASK]),
                Operation::Read(raw_value.as_mut()),
            ])
            .map_err(|_| RegifaceError::BusError)?;

        R::from_bytes(raw_value).map_err(|_| RegifaceError::DeserializationError)
    }

    /// Writes a typed value to a device register.
    ///
    /// # Errors
    /// * `RegifaceError::BusError` - SPI communication failed
    pub fn write_register<R>(&mut self, register: R) -> Result<(), RegifaceError>
    where
        R: WritableRegister<IdType = u8, Error = Infallible>,
    {
        let raw_value = match register.to_bytes() {
            Ok(raw) => raw,
            Err(never) => match never {},
        };

        self.spi
            .transaction(&mut [
                Operation::Write(&[R::id() | WRITE_FLAG]),
                Operation::Write(raw_value.as_ref()),
            ])
            .map_err(|_| RegifaceError::BusError)
    }

    /// Reads a typed register, lets `f` modify it and writes it back.
    ///
    /// This is two transactions; callers that race with the interrupt handler on the
    /// same register must serialize externally.
    pub fn modify_register<R, F>(&mut self, f: F) -> Result<R, RegifaceError>
    where
        R: ReadableRegister<IdType = u8> + WritableRegister<IdType = u8, Error = Infallible> + Copy,
        F: FnOnce(R) -> R,
    {
        let current: R = self.read_register()?;
        let updated = f(current);
        self.write_register(updated)?;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::SimulatedChip;
    use crate::registers::{ModemConfig2, SyncWord, Version};

    #[test]
    fn raw_read_clears_write_bit() {
        let chip = SimulatedChip::sx1276();
        let mut device = Device::new(chip.spi());

        assert_eq!(device.read(0x42 | WRITE_FLAG).unwrap(), 0x12);
        assert_eq!(chip.frames().last().unwrap().as_slice(), &[0x42, 0x00]);
    }

    #[test]
    fn raw_write_sets_write_bit() {
        let chip = SimulatedChip::sx1276();
        let mut device = Device::new(chip.spi());

        device.write(0x39, 0x34).unwrap();
        assert_eq!(chip.frames().last().unwrap().as_slice(), &[0xB9, 0x34]);
        assert_eq!(chip.register(0x39), 0x34);
    }

    #[test]
    fn each_access_is_one_transaction() {
        let chip = SimulatedChip::sx1276();
        let mut device = Device::new(chip.spi());

        device.read(0x01).unwrap();
        device.write(0x01, 0x81).unwrap();
        let mut block = [1, 2, 3, 4, 5];
        device.transfer_block(WRITE_FLAG, &mut block).unwrap();

        assert_eq!(chip.transaction_count(), 3);
    }

    #[test]
    fn block_write_then_read_through_fifo() {
        let chip = SimulatedChip::sx1276();
        let mut device = Device::new(chip.spi());

        let mut outgoing = *b"hello";
        device.transfer_block(WRITE_FLAG, &mut outgoing).unwrap();
        device.write(0x0D, 0x00).unwrap();

        let mut incoming = [0u8; 5];
        device.transfer_block(0x00, &mut incoming).unwrap();
        assert_eq!(&incoming, b"hello");
    }

    #[test]
    fn typed_registers() {
        let chip = SimulatedChip::sx1276();
        let mut device = Device::new(chip.spi());

        let version: Version = device.read_register().unwrap();
        assert_eq!(version.revision, 0x12);

        device.write_register(SyncWord { value: 0x34 }).unwrap();
        assert_eq!(chip.register(0x39), 0x34);

        device
            .modify_register(|reg: ModemConfig2| reg.with_sx1276_crc(true))
            .unwrap();
        assert_eq!(chip.register(0x1E) & 0x04, 0x04);
    }
}
