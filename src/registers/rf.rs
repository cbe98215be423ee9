//! RF-related registers
//!
//! This module contains registers related to RF configuration including:
//! - Carrier frequency
//! - Power amplifier selection and output level
//! - High power DAC
//! - Over-current protection
//! - LNA gain and boost

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Crystal oscillator frequency in Hz
pub const FXOSC_HZ: u64 = 32_000_000;

/// Frequency synthesizer step is FXOSC / 2^19 (about 61.035 Hz)
pub const FSTEP_SHIFT: u32 = 19;

/// Carrier frequency, most significant byte (address: 0x06)
///
/// Frf = Fcarrier / Fstep, a 24-bit value spread over three registers. The new
/// frequency takes effect when the LSB is written.
#[register(0x06u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FrfMsb {
    /// Frf\[23:16\]
    pub value: u8,
}

/// Carrier frequency, middle byte (address: 0x07)
#[register(0x07u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FrfMid {
    /// Frf\[15:8\]
    pub value: u8,
}

/// Carrier frequency, least significant byte (address: 0x08)
#[register(0x08u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FrfLsb {
    /// Frf\[7:0\]
    pub value: u8,
}

/// Converts a carrier frequency to the 24-bit synthesizer step count.
///
/// Integer form of `frequency / 61.03515625`, truncated. Saturates at the
/// largest 24-bit value.
pub fn frf_from_hz(frequency_hz: u64) -> u32 {
    let steps = (u128::from(frequency_hz) << FSTEP_SHIFT) / u128::from(FXOSC_HZ);
    steps.min(0x00FF_FFFF) as u32
}

/// Converts a 24-bit synthesizer step count back to Hz, truncated.
pub fn hz_from_frf(frf: u32) -> u64 {
    (u64::from(frf) * FXOSC_HZ) >> FSTEP_SHIFT
}

/// Power amplifier configuration register (address: 0x09)
///
/// # Output Power
/// - RFO pin: Pout = Pmax - (15 - output_power), Pmax = 10.8 + 0.6 * max_power
/// - PA_BOOST pin: Pout = 17 - (15 - output_power), or +3 dB with the high power DAC
///
/// `max_power` is ignored on the PA_BOOST path.
#[register(0x09u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PaConfig {
    /// true = PA_BOOST pin, false = RFO pin
    pub pa_boost: bool,
    /// Pmax selection, 3 bits
    pub max_power: u8,
    /// Output power, 4 bits
    pub output_power: u8,
}

impl PaConfig {
    /// PA_BOOST select bit
    pub const PA_BOOST: u8 = 0x80;
}

/// Over-current protection register (address: 0x0B)
///
/// # Current Limit
/// - trim <= 15: Imax = 45 + 5 * trim mA
/// - trim <= 27: Imax = -30 + 10 * trim mA
/// - otherwise 240 mA
#[register(0x0Bu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Ocp {
    /// Protection enabled
    pub enabled: bool,
    /// Current limit trim, 5 bits
    pub trim: u8,
}

impl Ocp {
    /// Protection off, trim 11 (100 mA if re-enabled), used on the +17 dBm PA_BOOST path
    pub const LIMIT_100MA: Self = Self {
        enabled: false,
        trim: 11,
    };

    /// 150 mA, required for +20 dBm operation
    pub const LIMIT_150MA: Self = Self {
        enabled: true,
        trim: 18,
    };
}

/// LNA settings register (address: 0x0C)
///
/// # Important Notes
/// - `boost_hf` = 0b11 gives 150% LNA current for the HF port (default 0b00)
/// - Gain is only used when AGC is disabled
#[register(0x0Cu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct Lna {
    /// LNA gain setting, 3 bits (1 = max gain)
    pub gain: u8,
    /// Low frequency LNA current adjustment, 2 bits
    pub boost_lf: u8,
    /// High frequency LNA current adjustment, 2 bits
    pub boost_hf: u8,
}

impl Lna {
    /// Boost on, 150% LNA current
    pub const BOOST_ON: u8 = 0x03;
}

/// High power DAC register on the SX1276 (address: 0x4D)
///
/// Low bits 0x07 enable +20 dBm on PA_BOOST, 0x04 is the default.
/// The upper bits are reserved and must be preserved.
#[register(0x4Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct PaDac {
    /// Raw register value
    pub value: u8,
}

/// High power DAC register on the SX1272 (address: 0x5A)
///
/// Same layout as [`PaDac`] at a different address.
#[register(0x5Au8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct Sx1272PaDac {
    /// Raw register value
    pub value: u8,
}

/// Selects the high power DAC mode while keeping the reserved upper bits.
pub fn pa_dac_bits(current: u8, high_power: bool) -> u8 {
    if high_power {
        current | 0x07
    } else {
        (current & !0x07) | 0x04
    }
}

single_byte_value!(FrfMsb, FrfMid, FrfLsb, PaDac, Sx1272PaDac);

impl FromByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            pa_boost: bytes[0] & Self::PA_BOOST != 0,
            max_power: (bytes[0] >> 4) & 0x07,
            output_power: bytes[0] & 0x0F,
        })
    }
}

impl ToByteArray for PaConfig {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        let boost = if self.pa_boost { Self::PA_BOOST } else { 0x00 };
        Ok([boost | ((self.max_power & 0x07) << 4) | (self.output_power & 0x0F)])
    }
}

impl FromByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            enabled: bytes[0] & 0x20 != 0,
            trim: bytes[0] & 0x1F,
        })
    }
}

impl ToByteArray for Ocp {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.enabled as u8) << 5) | (self.trim & 0x1F)])
    }
}

impl FromByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
        Ok(Self {
            gain: (bytes[0] >> 5) & 0x07,
            boost_lf: (bytes[0] >> 3) & 0x03,
            boost_hf: bytes[0] & 0x03,
        })
    }
}

impl ToByteArray for Lna {
    type Error = Infallible;
    type Array = [u8; 1];

    fn to_bytes(self) -> Result<Self::Array, Self::Error> {
        Ok([((self.gain & 0x07) << 5) | ((self.boost_lf & 0x03) << 3) | (self.boost_hf & 0x03)])
    }
}
