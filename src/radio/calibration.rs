//! Image calibration and temperature reading
//!
//! The SX1276 image rejection is calibrated at the factory frequency. After moving to
//! another band, or as the die temperature drifts, the calibration should be re-run.
//! Both the calibration block and the temperature sensor live in the FSK register
//! page, so the sequence drops out of LoRa mode and restores it afterwards.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use super::{Error, LoraReceiver, Sx127x};
use crate::registers::{Chip, ImageCal, ModeBits, OpMode, Temp};
use crate::switch::RfSwitch;

/// Upper bound on the wait for an image calibration to finish, in 1 ms steps.
pub const CALIBRATION_TIMEOUT_MS: u32 = 100;

impl<SPI, D, R, SW> Sx127x<SPI, D, R, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    R: LoraReceiver,
    SW: RfSwitch,
{
    /// Runs an image calibration and returns the raw die temperature reading.
    ///
    /// The temperature is uncalibrated (one count per degree, chip-specific offset).
    /// The operating mode in force before the call is restored on return. The SX1272
    /// has no image calibration block; this returns `Ok(0)` without touching it.
    ///
    /// # Important Notes
    /// - Call after the carrier frequency is programmed
    /// - Takes the chip out of LoRa mode for a few ms; any reception in progress is lost
    pub fn calibrate(&mut self) -> Result<i8, Error> {
        if self.layout() == Chip::Sx1272 {
            log::debug!("sx127x::calibrate skipped, no image calibration on the sx1272");
            return Ok(0);
        }

        // Raw byte, so bits OpMode does not model come back unchanged.
        let previous = self.device.read_byte::<OpMode>()?;
        let was_lora = OpMode::from_byte(previous).long_range_mode;
        if was_lora {
            self.device.write_register(OpMode::lora(ModeBits::Sleep))?;
        }

        self.device.write_register(OpMode::fsk(ModeBits::Sleep))?;
        self.device
            .write_register(OpMode::fsk(ModeBits::SynthesizerRx))?;

        let image_cal: ImageCal = self.device.read_register()?;
        self.device.write_register(image_cal.with_temp_monitor(true))?;
        self.delay.delay_ms(1);
        self.device.write_register(image_cal.with_temp_monitor(false))?;

        self.device.write_register(OpMode::fsk(ModeBits::Sleep))?;
        let temp: Temp = self.device.read_register()?;
        let temperature = temp.value as i8;

        self.device.write_register(OpMode::fsk(ModeBits::Standby))?;
        self.device.write_register(image_cal.with_start())?;

        let mut waited_ms = 0;
        loop {
            let status: ImageCal = self.device.read_register()?;
            if !status.running() {
                break;
            }
            if waited_ms >= CALIBRATION_TIMEOUT_MS {
                log::warn!("sx127x::calibrate still running after {waited_ms} ms, giving up");
                break;
            }
            self.delay.delay_ms(1);
            waited_ms += 1;
        }
        log::debug!("sx127x::calibrate waited {waited_ms} ms, raw temperature {temperature}");

        self.device.write_register(OpMode::fsk(ModeBits::Sleep))?;
        if was_lora {
            self.device.write_register(OpMode::lora(ModeBits::Sleep))?;
        }
        self.device.write_byte::<OpMode>(previous)?;

        Ok(temperature)
    }
}
