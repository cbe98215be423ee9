//! LoRa modem registers
//!
//! This module contains the modulation and packet format registers:
//! - Bandwidth, coding rate and header mode (ModemConfig1)
//! - Spreading factor and CRC (ModemConfig2)
//! - Low data rate optimisation and AGC (ModemConfig3, SX1276 only)
//! - Preamble length and sync word
//! - Spreading factor 6 detection settings
//! - Last packet SNR and RSSI
//!
//! The SX1272 packs bandwidth, coding rate, header mode, CRC and low data rate
//! optimisation into ModemConfig1, while the SX1276 spreads them over three registers.
//! The config registers therefore keep their raw byte, and the bit-level helpers take
//! the [`Chip`] they are editing for.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

use super::Chip;

/// Supported signal bandwidths in Hz, indexed by the SX1276 bandwidth field
///
/// The SX1272 only supports the last three entries (125, 250 and 500 kHz).
pub const BANDWIDTHS_HZ: [u32; 10] = [
    7_800, 10_400, 15_600, 20_800, 31_250, 41_700, 62_500, 125_000, 250_000, 500_000,
];

/// Index of the first bandwidth the SX1272 supports (125 kHz)
pub const SX1272_MIN_BANDWIDTH_INDEX: usize = 7;

/// Returns the index of the narrowest supported bandwidth that is at least `hz`.
///
/// Requests above 500 kHz clamp to 500 kHz.
pub fn bandwidth_index(hz: u32) -> usize {
    BANDWIDTHS_HZ
        .iter()
        .position(|&bin| hz <= bin)
        .unwrap_or(BANDWIDTHS_HZ.len() - 1)
}

/// Modem PHY config 1 (address: 0x1D)
///
/// | Bits | SX1276                 | SX1272                   |
/// |------|------------------------|--------------------------|
/// | 7:4  | Bandwidth              | 7:6 Bandwidth            |
/// | 3:1  | Coding rate            | 5:3 Coding rate          |
/// | 0    | Implicit header        | 2 Implicit header        |
/// |      |                        | 1 RX payload CRC on      |
/// |      |                        | 0 Low data rate optimise |
#[register(0x1Du8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig1 {
    /// Raw register value
    pub value: u8,
}

impl ModemConfig1 {
    /// Sets the bandwidth field from an index into [`BANDWIDTHS_HZ`].
    ///
    /// On the SX1272 indices below 125 kHz are raised to 125 kHz.
    pub fn with_bandwidth(self, chip: Chip, index: usize) -> Self {
        let value = match chip {
            Chip::Sx1276 => (self.value & 0x0F) | ((index as u8 & 0x0F) << 4),
            Chip::Sx1272 => {
                let field = index.max(SX1272_MIN_BANDWIDTH_INDEX) - SX1272_MIN_BANDWIDTH_INDEX;
                (self.value & 0x3F) | ((field as u8 & 0x03) << 6)
            }
        };
        Self { value }
    }

    /// Sets the coding rate field; `cr` is the denominator minus four (1..=4).
    pub fn with_coding_rate(self, chip: Chip, cr: u8) -> Self {
        let value = match chip {
            Chip::Sx1276 => (self.value & 0xF1) | ((cr & 0x07) << 1),
            Chip::Sx1272 => (self.value & 0xC7) | ((cr & 0x07) << 3),
        };
        Self { value }
    }

    /// Sets or clears implicit header mode.
    pub fn with_implicit_header(self, chip: Chip, implicit: bool) -> Self {
        let bit = match chip {
            Chip::Sx1276 => 0x01,
            Chip::Sx1272 => 0x04,
        };
        Self {
            value: set_bit(self.value, bit, implicit),
        }
    }

    /// Sets or clears payload CRC generation/checking (SX1272 layout).
    pub fn with_sx1272_crc(self, enable: bool) -> Self {
        Self {
            value: set_bit(self.value, 0x02, enable),
        }
    }

    /// Sets or clears low data rate optimisation (SX1272 layout).
    pub fn with_sx1272_low_data_rate(self, enable: bool) -> Self {
        Self {
            value: set_bit(self.value, 0x01, enable),
        }
    }
}

/// Modem PHY config 2 (address: 0x1E)
///
/// - Bits 7:4: spreading factor (6..=12)
/// - Bit 3: TX continuous mode
/// - Bit 2: RX payload CRC on (SX1276 only; AGC auto on for the SX1272)
/// - Bits 1:0: RX timeout MSB
#[register(0x1Eu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig2 {
    /// Raw register value
    pub value: u8,
}

impl ModemConfig2 {
    /// Sets the spreading factor field.
    pub fn with_spreading_factor(self, sf: u8) -> Self {
        Self {
            value: (self.value & 0x0F) | ((sf << 4) & 0xF0),
        }
    }

    /// Sets or clears payload CRC generation/checking (SX1276 layout).
    pub fn with_sx1276_crc(self, enable: bool) -> Self {
        Self {
            value: set_bit(self.value, 0x04, enable),
        }
    }
}

/// Modem PHY config 3 (address: 0x26), SX1276 only
///
/// - Bit 3: low data rate optimise, mandatory when the symbol time exceeds 16 ms
/// - Bit 2: AGC auto on, LNA gain set by the AGC loop
#[register(0x26u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ModemConfig3 {
    /// Raw register value
    pub value: u8,
}

impl ModemConfig3 {
    /// Low data rate optimise bit
    pub const LOW_DATA_RATE_OPTIMIZE: u8 = 0x08;
    /// AGC auto on bit
    pub const AGC_AUTO_ON: u8 = 0x04;

    /// Sets or clears low data rate optimisation.
    pub fn with_low_data_rate(self, enable: bool) -> Self {
        Self {
            value: set_bit(self.value, Self::LOW_DATA_RATE_OPTIMIZE, enable),
        }
    }
}

/// Preamble length, most significant byte (address: 0x20)
///
/// The transmitted preamble is `length + 4.25` symbols.
#[register(0x20u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PreambleMsb {
    /// Length\[15:8\]
    pub value: u8,
}

/// Preamble length, least significant byte (address: 0x21)
#[register(0x21u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PreambleLsb {
    /// Length\[7:0\]
    pub value: u8,
}

/// LoRa detection optimise (address: 0x31)
///
/// 0xC5 for spreading factor 6, 0xC3 for 7..=12.
#[register(0x31u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct DetectionOptimize {
    /// Raw register value
    pub value: u8,
}

impl DetectionOptimize {
    /// Value for the given spreading factor.
    pub fn for_spreading_factor(sf: u8) -> Self {
        Self {
            value: if sf == 6 { 0xC5 } else { 0xC3 },
        }
    }
}

/// LoRa detection threshold (address: 0x37)
///
/// 0x0C for spreading factor 6, 0x0A for 7..=12.
#[register(0x37u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct DetectionThreshold {
    /// Raw register value
    pub value: u8,
}

impl DetectionThreshold {
    /// Value for the given spreading factor.
    pub fn for_spreading_factor(sf: u8) -> Self {
        Self {
            value: if sf == 6 { 0x0C } else { 0x0A },
        }
    }
}

/// LoRa sync word (address: 0x39)
///
/// 0x34 is reserved for LoRaWAN networks; 0x12 is the private default.
#[register(0x39u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct SyncWord {
    /// Sync word
    pub value: u8,
}

/// SNR of the last packet (address: 0x19)
///
/// Two's complement, in quarters of a dB. Read-only.
#[register(0x19u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct PktSnrValue {
    /// Raw register value
    pub value: u8,
}

/// RSSI of the last packet (address: 0x1A)
///
/// Uncorrected; see the datasheet section 5.5.5 for the band-dependent offsets.
/// Read-only.
#[register(0x1Au8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct PktRssiValue {
    /// Raw register value
    pub value: u8,
}

fn set_bit(value: u8, bit: u8, on: bool) -> u8 {
    if on {
        value | bit
    } else {
        value & !bit
    }
}

single_byte_value!(
    ModemConfig1,
    ModemConfig2,
    ModemConfig3,
    PreambleMsb,
    PreambleLsb,
    DetectionOptimize,
    DetectionThreshold,
    SyncWord,
    PktSnrValue,
    PktRssiValue
);
