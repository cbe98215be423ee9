//! Calibration registers
//!
//! These live in the FSK/OOK register page and are only reachable while the modem
//! is in FSK mode (`OpMode::long_range_mode == false`). The SX1272 has no image
//! calibration block.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// Image calibration control (address: 0x3B)
///
/// # Important Notes
/// - Image calibration must be run after changing to a frequency far from the
///   factory calibration frequency, and whenever the temperature drifts
/// - The temperature monitor bit is active low
#[register(0x3Bu8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ReadableRegister, WritableRegister)]
pub struct ImageCal {
    /// Raw register value
    pub value: u8,
}

impl ImageCal {
    /// Automatic image calibration on temperature change
    pub const AUTO_IMAGE_CAL_ON: u8 = 0x80;
    /// Writing 1 starts an image calibration
    pub const IMAGE_CAL_START: u8 = 0x40;
    /// Set while an image calibration is running
    pub const IMAGE_CAL_RUNNING: u8 = 0x20;
    /// Set to stop the temperature monitor
    pub const TEMP_MONITOR_OFF: u8 = 0x01;

    /// Whether an image calibration is still in progress.
    pub fn running(self) -> bool {
        self.value & Self::IMAGE_CAL_RUNNING != 0
    }

    /// Same register with the temperature monitor switched on or off.
    pub fn with_temp_monitor(self, on: bool) -> Self {
        let base = self.value & !Self::TEMP_MONITOR_OFF;
        Self {
            value: if on { base } else { base | Self::TEMP_MONITOR_OFF },
        }
    }

    /// Same register with the image calibration start bit set.
    pub fn with_start(self) -> Self {
        Self {
            value: (self.value & !Self::IMAGE_CAL_START) | Self::IMAGE_CAL_START,
        }
    }
}

/// Temperature sensor reading (address: 0x3C)
///
/// Two's complement, one count per degree, uncalibrated offset. Only updated
/// while the temperature monitor is running in FSK synthesizer or receive mode.
#[register(0x3Cu8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct Temp {
    /// Raw register value
    pub value: u8,
}

single_byte_value!(ImageCal, Temp);
