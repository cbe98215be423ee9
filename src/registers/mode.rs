//! Operating mode and identification registers
//!
//! This module contains the registers that select the modem (LoRa or FSK/OOK), the
//! transceiver mode, and identify the silicon revision.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Transceiver mode bits, RegOpMode\[2:0\]
///
/// The same encoding is used by the LoRa and FSK modems, with LoRa reusing 5 for
/// continuous receive and 7 for channel activity detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ModeBits {
    /// Lowest power, register contents retained
    Sleep = 0x00,
    /// Crystal running, configuration mode
    Standby = 0x01,
    /// Frequency synthesis locked at the TX frequency
    SynthesizerTx = 0x02,
    /// Transmit
    Transmit = 0x03,
    /// Frequency synthesis locked at the RX frequency
    SynthesizerRx = 0x04,
    /// Continuous receive (LoRa) / receiver on (FSK)
    ReceiveContinuous = 0x05,
    /// Single receive (LoRa only, not available on every variant)
    ReceiveSingle = 0x06,
    /// Channel activity detection (LoRa only)
    ChannelActivityDetection = 0x07,
}

impl ModeBits {
    /// Decodes the three mode bits. Higher bits are ignored.
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0x00 => Self::Sleep,
            0x01 => Self::Standby,
            0x02 => Self::SynthesizerTx,
            0x03 => Self::Transmit,
            0x04 => Self::SynthesizerRx,
            0x05 => Self::ReceiveContinuous,
            0x06 => Self::ReceiveSingle,
            _ => Self::ChannelActivityDetection,
        }
    }
}

/// Operating mode register (address: 0x01)
///
/// Selects the modem and the transceiver mode.
///
/// # Important Notes
/// - `long_range_mode` can only be changed while in sleep mode
/// - Every transition between modes is a single write of this register
/// - The FIFO is only accessible in standby, transmit and receive modes
#[register(0x01u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct OpMode {
    /// true = LoRa modem, false = FSK/OOK modem
    pub long_range_mode: bool,
    /// Transceiver mode
    pub mode: ModeBits,
}

impl OpMode {
    /// Long range (LoRa) modem select bit
    pub const LONG_RANGE_MODE: u8 = 0x80;

    /// A LoRa-modem operating mode.
    pub const fn lora(mode: ModeBits) -> Self {
        Self {
            long_range_mode: true,
            mode,
        }
    }

    /// An FSK-modem operating mode, used while calibrating.
    pub const fn fsk(mode: ModeBits) -> Self {
        Self {
            long_range_mode: false,
            mode,
        }
    }

    /// Decodes a raw register value.
    pub fn from_byte(value: u8) -> Self {
        Self {
            long_range_mode: value & Self::LONG_RANGE_MODE != 0,
            mode: ModeBits::from_bits(value),
        }
    }

    /// Encodes the register value.
    pub fn to_byte(self) -> u8 {
        let lora = if self.long_range_mode {
            Self::LONG_RANGE_MODE
        } else {
            0x00
        };
        lora | self.mode as u8
    }
}

/// Silicon version register (address: 0x42)
///
/// Read-only. Used at start-up to confirm a chip is present and which family
/// member it is:
/// - 0x12 = SX1276/77/78/79 (and HopeRF RFM95/96/98)
/// - 0x22 = SX1272/73
///
/// A missing or unpowered chip reads back as 0x00 or 0xFF.
#[register(0x42u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct Version {
    /// Full revision byte, metal mask in the low nibble
    pub revision: u8,
}

/// SX127x family member, identified by [`Version`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Chip {
    /// SX1276/77/78/79, HopeRF RFM95/96/98
    Sx1276,
    /// SX1272/73
    Sx1272,
}

impl Chip {
    /// Version byte reported by the SX1276 family
    pub const SX1276_VERSION: u8 = 0x12;
    /// Version byte reported by the SX1272 family
    pub const SX1272_VERSION: u8 = 0x22;

    /// Identifies the chip from its version register, if it is a known revision.
    pub fn from_version(version: Version) -> Option<Self> {
        match version.revision {
            Self::SX1276_VERSION => Some(Self::Sx1276),
            Self::SX1272_VERSION => Some(Self::Sx1272),
            _ => None,
        }
    }

    /// Lowest and highest carrier frequency the synthesizer covers, in Hz.
    pub fn frequency_range_hz(self) -> (u64, u64) {
        match self {
            Self::Sx1276 => (137_000_000, 1_020_000_000),
            Self::Sx1272 => (860_000_000, 1_020_000_000),
        }
    }
}

impl FromByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self::from_byte(bytes[0]))
    }
}

impl ToByteArray for OpMode {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([self.to_byte()])
    }
}

impl FromByteArray for Version {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self { revision: bytes[0] })
    }
}
