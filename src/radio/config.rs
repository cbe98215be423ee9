//! Radio configuration
//!
//! [`RadioConfig`] is resolved once by [`Sx127x::init`](crate::Sx127x::init). Out of
//! range values are clamped to the nearest value the chip supports rather than
//! rejected.

/// Power amplifier output pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PaOutput {
    /// RFO pin, 0 to +14 dBm
    Rfo,
    /// PA_BOOST pin, +2 to +20 dBm
    PaBoost,
}

/// Transceiver mode last written by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioMode {
    /// Sleep, lowest power
    Sleep,
    /// Standby, ready for configuration and FIFO access
    Standby,
    /// Transmitting the staged packet
    Transmit,
    /// Receiving continuously
    ReceiveContinuous,
}

/// LoRa modem configuration.
///
/// # Example
/// ```
/// use sx127x::RadioConfig;
///
/// let config = RadioConfig {
///     frequency_mhz: 868,
///     spreading_factor: 9,
///     ..RadioConfig::default()
/// };
/// assert_eq!(config.frequency_hz(), 868_000_000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Carrier frequency, whole MHz part
    pub frequency_mhz: u32,
    /// Carrier frequency, sub-MHz remainder in Hz (0..=999_999)
    pub frequency_low_hz: u32,
    /// Crystal error compensation added to every programmed frequency, in Hz
    pub frequency_offset_hz: i32,
    /// Output power in dBm
    pub tx_power_level: i8,
    /// Output pin the antenna is wired to
    pub power_pin: PaOutput,
    /// Signal bandwidth in Hz, rounded up to the next supported value
    pub signal_bandwidth: u32,
    /// Spreading factor, 6..=12
    pub spreading_factor: u8,
    /// Coding rate denominator of 4/x, 5..=8
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// Fixed length packets without the chip-level header
    pub implicit_header: bool,
    /// Sync word
    pub sync_word: u8,
    /// Payload CRC generation and checking
    pub enable_crc: bool,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 915,
            frequency_low_hz: 0,
            frequency_offset_hz: 0,
            tx_power_level: 2,
            power_pin: PaOutput::PaBoost,
            signal_bandwidth: 125_000,
            spreading_factor: 7,
            coding_rate: 5,
            preamble_length: 8,
            implicit_header: false,
            sync_word: 0x12,
            enable_crc: false,
        }
    }
}

impl RadioConfig {
    /// Defaults used by [`LoraLink`](crate::LoraLink): +5 dBm with payload CRC on.
    pub fn link_defaults() -> Self {
        Self {
            tx_power_level: 5,
            enable_crc: true,
            ..Self::default()
        }
    }

    /// Carrier frequency in Hz. A remainder above 999_999 Hz counts as 999_999.
    pub fn frequency_hz(&self) -> u64 {
        let low_hz = self.frequency_low_hz.min(999_999);
        u64::from(self.frequency_mhz) * 1_000_000 + u64::from(low_hz)
    }
}
