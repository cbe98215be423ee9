//! Link quality and timing maths
//!
//! Pure functions over raw register values, kept apart from the bus so the correction
//! formulas can be checked without hardware. RSSI correction follows the SX1276
//! datasheet section 5.5.5, with the high frequency port constant applied from
//! 868 MHz upwards.

/// Frequency at and above which the high frequency port RSSI offset applies.
pub const HF_PORT_THRESHOLD_HZ: u64 = 868_000_000;

/// RSSI offset for the low frequency port (below 868 MHz).
pub const RSSI_OFFSET_LF: i16 = 164;

/// RSSI offset for the high frequency port.
pub const RSSI_OFFSET_HF: i16 = 157;

/// Symbol time above which low data rate optimisation is mandatory, in ms.
pub const LOW_DATA_RATE_SYMBOL_MS: u32 = 16;

/// Signal quality of the last received packet.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SignalQuality {
    /// Corrected packet RSSI in dBm
    pub rssi: i16,
    /// Packet SNR in dB
    pub snr: f32,
}

/// SNR in dB from RegPktSnrValue (two's complement, quarter dB steps).
pub fn snr_from_raw(raw: u8) -> f32 {
    f32::from(raw as i8) * 0.25
}

/// Packet RSSI in dBm from RegPktRssiValue, the packet SNR and the carrier frequency.
///
/// - Below 868 MHz: `raw - 164`, lowered further by a negative SNR
/// - Otherwise, negative SNR: `raw + snr - 157`
/// - Otherwise: `raw * 16 / 15 - 157`
///
/// Fractional SNR contributions are truncated toward zero.
pub fn corrected_rssi(raw: u8, snr: f32, frequency_hz: u64) -> i16 {
    let raw = i16::from(raw);

    if frequency_hz < HF_PORT_THRESHOLD_HZ {
        let rssi = raw - RSSI_OFFSET_LF;
        if snr < 0.0 {
            (f32::from(rssi) + snr) as i16
        } else {
            rssi
        }
    } else if snr < 0.0 {
        (f32::from(raw) + snr - f32::from(RSSI_OFFSET_HF)) as i16
    } else {
        raw * 16 / 15 - RSSI_OFFSET_HF
    }
}

/// Symbol duration in whole milliseconds for a bandwidth and spreading factor.
///
/// `1000 / (bandwidth / 2^sf)` in integer arithmetic.
pub fn symbol_duration_ms(bandwidth_hz: u32, spreading_factor: u8) -> u32 {
    let symbol_rate = bandwidth_hz >> spreading_factor.min(31);
    if symbol_rate == 0 {
        return u32::MAX;
    }
    1000 / symbol_rate
}

/// Whether low data rate optimisation is required for this modulation.
pub fn needs_low_data_rate(bandwidth_hz: u32, spreading_factor: u8) -> bool {
    symbol_duration_ms(bandwidth_hz, spreading_factor) > LOW_DATA_RATE_SYMBOL_MS
}
