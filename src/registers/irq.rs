//! Interrupt registers
//!
//! This module contains the interrupt flag, mask and DIO mapping registers.
//!
//! Flags in [`IrqFlags`] are cleared by writing a 1 to them, so a read followed by
//! writing back the value just read clears exactly the events that were observed.
//! DIO0 is the only line this driver wires to the host; its function is selected by
//! [`DioMapping1`].

use bitflags::bitflags;
use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

bitflags! {
    /// LoRa interrupt sources
    ///
    /// Shared bit layout of RegIrqFlags and RegIrqFlagsMask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Irq: u8 {
        /// Receive timeout (single receive mode)
        const RX_TIMEOUT = 0x80;
        /// Packet reception complete
        const RX_DONE = 0x40;
        /// Payload CRC error
        const PAYLOAD_CRC_ERROR = 0x20;
        /// Valid header received in explicit header mode
        const VALID_HEADER = 0x10;
        /// FIFO payload transmission complete
        const TX_DONE = 0x08;
        /// Channel activity detection finished
        const CAD_DONE = 0x04;
        /// Frequency hopping channel change
        const FHSS_CHANGE_CHANNEL = 0x02;
        /// Channel activity detected
        const CAD_DETECTED = 0x01;
    }
}

impl Irq {
    /// Flags that spoil an otherwise completed reception
    pub const RX_FAILURE: Self = Self::PAYLOAD_CRC_ERROR.union(Self::RX_TIMEOUT);
}

/// Interrupt flags register (address: 0x12)
///
/// # Important Notes
/// - Writing 1 to a bit clears it; writing 0 leaves it unchanged
/// - Flags stay set until cleared, even when masked from DIO mapping
#[register(0x12u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct IrqFlags {
    /// Active interrupt sources
    pub irq: Irq,
}

/// Interrupt mask register (address: 0x11)
///
/// A set bit masks the corresponding source in [`IrqFlags`].
#[register(0x11u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct IrqFlagsMask {
    /// Masked interrupt sources
    pub masked: Irq,
}

/// DIO0 function, RegDioMapping1\[7:6\]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dio0Mapping {
    /// DIO0 rises on RxDone
    RxDone = 0b00,
    /// DIO0 rises on TxDone
    TxDone = 0b01,
    /// DIO0 rises on CadDone
    CadDone = 0b10,
}

/// DIO mapping register 1 (address: 0x40)
///
/// Routes interrupt sources to DIO0..DIO3. Only DIO0 is exposed here; the
/// remaining fields are written as zero.
#[register(0x40u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct DioMapping1 {
    /// DIO0 function
    pub dio0: Dio0Mapping,
}

impl FromByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            irq: Irq::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlags {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.irq.bits()])
    }
}

impl FromByteArray for IrqFlagsMask {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            masked: Irq::from_bits_retain(bytes[0]),
        })
    }
}

impl ToByteArray for IrqFlagsMask {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.masked.bits()])
    }
}

impl FromByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        let dio0 = match bytes[0] >> 6 {
            0b00 => Dio0Mapping::RxDone,
            0b01 => Dio0Mapping::TxDone,
            _ => Dio0Mapping::CadDone,
        };
        Ok(Self { dio0 })
    }
}

impl ToByteArray for DioMapping1 {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([(self.dio0 as u8) << 6])
    }
}
