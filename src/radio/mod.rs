//! SX127x Radio State Machine
//!
//! [`Sx127x`] owns the register interface and drives the chip through
//! sleep/standby/transmit/receive, with transmit and receive completion delivered by
//! the DIO0 interrupt to an optional [`LoraReceiver`].
//!
//! # Lifecycle
//! 1. [`Sx127x::init`] identifies the chip and applies a [`RadioConfig`]
//! 2. Optionally [`Sx127x::calibrate`] once the frequency is set
//! 3. Attach a receiver and call [`Sx127x::receive`] to listen
//! 4. [`Sx127x::begin_packet`], [`Sx127x::write_fifo`], [`Sx127x::end_packet`] to send
//!
//! Completion is reported either through the receiver callbacks (interrupt driven,
//! see [`Sx127x::handle_interrupt`]) or by polling [`Sx127x::is_tx_done`] and
//! [`Sx127x::received_packet`] when no receiver is attached. The two models must not
//! be mixed: both clear the same interrupt flags.
//!
//! # Important Notes
//! - Configuration changes should be made in sleep or standby
//! - Only one transmit may be in flight; a second `begin_packet` is rejected
//! - Nothing reachable from the interrupt handler logs or delays

mod calibration;
mod config;
mod error;
mod interrupt;
mod quality;

pub use config::{PaOutput, RadioConfig, RadioMode};
pub use error::{Error, RadioFault};
pub use interrupt::{LoraReceiver, NoReceiver};
pub use quality::{
    corrected_rssi, needs_low_data_rate, snr_from_raw, symbol_duration_ms, SignalQuality,
};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::device::{Device, WRITE_FLAG};
use crate::lock::IrqFlagLock;
use crate::registers::{
    bandwidth_index, frf_from_hz, pa_dac_bits, Chip, DetectionOptimize, DetectionThreshold,
    Dio0Mapping, DioMapping1, FifoAddrPtr, FifoRxBaseAddr, FifoRxCurrentAddr, FifoTxBaseAddr,
    FrfLsb, FrfMid, FrfMsb, Lna, ModeBits, ModemConfig1, ModemConfig2, ModemConfig3, Ocp, OpMode,
    PaConfig, PaDac, PayloadLength, PktRssiValue, PktSnrValue, PreambleLsb, PreambleMsb,
    RxNbBytes, Sx1272PaDac, SyncWord, Version, BANDWIDTHS_HZ, FIFO_SIZE, MAX_PACKET_LENGTH,
    REG_FIFO, SX1272_MIN_BANDWIDTH_INDEX,
};
use crate::switch::{NoRfSwitch, RfSwitch};

use interrupt::IrqAction;

/// FIFO address where transmit payloads are staged.
pub const FIFO_TX_BASE_ADDR: u8 = 0x00;

/// FIFO address where received payloads land.
pub const FIFO_RX_BASE_ADDR: u8 = 0x00;

/// Number of registers in the address space.
pub const REGISTER_COUNT: usize = 128;

/// Resets the chip through its NRESET line: high, 10 ms, low, 10 ms, high.
pub fn hardware_reset<P, D>(reset: &mut P, delay: &mut D) -> Result<(), Error>
where
    P: OutputPin,
    D: DelayNs,
{
    reset.set_high().map_err(|_| Error::Pin)?;
    delay.delay_ms(10);
    reset.set_low().map_err(|_| Error::Pin)?;
    delay.delay_ms(10);
    reset.set_high().map_err(|_| Error::Pin)
}

/// Progress of the current outgoing packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransmitState {
    Idle,
    /// Between `begin_packet` and `end_packet`
    Staging,
    /// Handed to the modem, waiting for TxDone
    InFlight,
}

/// Interrupt-driven SX1272/SX1276 LoRa radio.
///
/// # Type Parameters
/// * `SPI` - SPI device the chip sits on
/// * `D` - delay provider, used only from mainline calls
/// * `R` - completion callbacks, see [`LoraReceiver`]
/// * `SW` - antenna switch, see [`RfSwitch`]
pub struct Sx127x<SPI, D, R = NoReceiver, SW = NoRfSwitch> {
    device: Device<SPI>,
    delay: D,
    switch: SW,
    receiver: Option<R>,
    action: IrqAction,
    transmit: TransmitState,
    lock: IrqFlagLock,
    rx_buffer: [u8; FIFO_SIZE],
    rx_length: usize,
    fault: Option<RadioFault>,
    chip: Option<Chip>,
    mode: RadioMode,
    frequency_hz: Option<u64>,
    frequency_offset_hz: i32,
    bandwidth_hz: u32,
    spreading_factor: u8,
    implicit_header: bool,
    low_data_rate: bool,
}

impl<SPI, D> Sx127x<SPI, D> {
    /// Creates a radio without an antenna switch. Nothing is sent to the chip until
    /// [`init`](Self::init).
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_switch(spi, delay, NoRfSwitch)
    }
}

impl<SPI, D, R, SW> Sx127x<SPI, D, R, SW> {
    /// Creates a radio driving an antenna switch.
    pub fn with_switch(spi: SPI, delay: D, switch: SW) -> Self {
        Self {
            device: Device::new(spi),
            delay,
            switch,
            receiver: None,
            action: IrqAction::None,
            transmit: TransmitState::Idle,
            lock: IrqFlagLock::new(),
            rx_buffer: [0u8; FIFO_SIZE],
            rx_length: 0,
            fault: None,
            chip: None,
            mode: RadioMode::Sleep,
            frequency_hz: None,
            frequency_offset_hz: 0,
            bandwidth_hz: BANDWIDTHS_HZ[SX1272_MIN_BANDWIDTH_INDEX],
            spreading_factor: 7,
            implicit_header: false,
            low_data_rate: false,
        }
    }

    /// Attaches the completion callbacks, returning the previous receiver.
    ///
    /// Takes effect at the next [`receive`](Self::receive) or
    /// [`end_packet`](Self::end_packet).
    pub fn set_receiver(&mut self, receiver: R) -> Option<R> {
        self.receiver.replace(receiver)
    }

    /// Detaches the completion callbacks and disarms the interrupt.
    pub fn take_receiver(&mut self) -> Option<R> {
        self.action = IrqAction::None;
        self.receiver.take()
    }

    /// The attached receiver.
    pub fn receiver(&self) -> Option<&R> {
        self.receiver.as_ref()
    }

    /// The attached receiver, mutably.
    pub fn receiver_mut(&mut self) -> Option<&mut R> {
        self.receiver.as_mut()
    }

    /// The last recorded fault, if any.
    pub fn last_error(&self) -> Option<RadioFault> {
        self.fault
    }

    /// Forgets the last recorded fault.
    pub fn clear_last_error(&mut self) {
        self.fault = None;
    }

    /// The chip identified by [`init`](Self::init).
    pub fn chip(&self) -> Option<Chip> {
        self.chip
    }

    /// The transceiver mode last written.
    pub fn mode(&self) -> RadioMode {
        self.mode
    }

    /// Centre frequency in Hz, excluding the offset.
    pub fn frequency(&self) -> Option<u64> {
        self.frequency_hz
    }

    /// Crystal error compensation in Hz.
    pub fn frequency_offset(&self) -> i32 {
        self.frequency_offset_hz
    }

    /// Programmed signal bandwidth in Hz.
    pub fn signal_bandwidth(&self) -> u32 {
        self.bandwidth_hz
    }

    /// Programmed spreading factor.
    pub fn spreading_factor(&self) -> u8 {
        self.spreading_factor
    }

    /// Whether low data rate optimisation is currently enabled.
    pub fn low_data_rate(&self) -> bool {
        self.low_data_rate
    }

    /// Whether a packet has been handed to the modem and TxDone has not been seen.
    pub fn is_transmitting(&self) -> bool {
        self.transmit == TransmitState::InFlight
    }

    /// The interrupt flags lock shared with the interrupt handler.
    pub fn irq_lock(&self) -> &IrqFlagLock {
        &self.lock
    }

    /// The delay provider, for settling time between mainline calls.
    pub fn delay_mut(&mut self) -> &mut D {
        &mut self.delay
    }

    /// Releases the SPI device, delay and switch.
    pub fn release(self) -> (SPI, D, SW) {
        (self.device.release(), self.delay, self.switch)
    }

    fn layout(&self) -> Chip {
        self.chip.unwrap_or(Chip::Sx1276)
    }
}

impl<SPI, D, R, SW> Sx127x<SPI, D, R, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    R: LoraReceiver,
    SW: RfSwitch,
{
    /// Identifies the chip and applies `config`, leaving the radio in standby.
    ///
    /// # Errors
    /// * `Error::UnsupportedVersion` - the version register is neither 0x12 nor 0x22;
    ///   nothing else is written
    /// * `Error::Register` - SPI communication failed
    pub fn init(&mut self, config: &RadioConfig) -> Result<Chip, Error> {
        log::trace!("sx127x::init reading version");
        let version: Version = self.device.read_register()?;
        let Some(chip) = Chip::from_version(version) else {
            log::warn!(
                "sx127x::init detected incorrect version: {:#04x}",
                version.revision
            );
            return Err(Error::UnsupportedVersion(version.revision));
        };
        self.chip = Some(chip);
        log::trace!("sx127x::init found {chip:?}");

        self.sleep()?;
        log::trace!("sx127x::init sleeping");

        self.set_frequency_offset(config.frequency_offset_hz)?;
        self.set_frequency(config.frequency_hz())?;
        log::trace!(
            "sx127x::init frequency {} Hz, offset {} Hz",
            self.frequency_hz.unwrap_or(0),
            config.frequency_offset_hz
        );

        // AGC shares ModemConfig3 with the low data rate flag, so it goes first.
        if chip == Chip::Sx1276 {
            self.device.write_register(ModemConfig3 {
                value: ModemConfig3::AGC_AUTO_ON,
            })?;
            log::trace!("sx127x::init AGC auto on");
        }

        self.set_signal_bandwidth(config.signal_bandwidth)?;
        log::trace!("sx127x::init bandwidth {} Hz", self.bandwidth_hz);
        self.set_lna_boost()?;
        log::trace!("sx127x::init LNA boost on");
        self.set_tx_power(config.tx_power_level, config.power_pin)?;
        log::trace!(
            "sx127x::init tx power {} dBm on {:?}",
            config.tx_power_level,
            config.power_pin
        );
        self.set_implicit_header(config.implicit_header)?;
        log::trace!("sx127x::init implicit header {}", config.implicit_header);
        self.set_spreading_factor(config.spreading_factor)?;
        log::trace!("sx127x::init spreading factor {}", self.spreading_factor);
        self.set_coding_rate(config.coding_rate)?;
        log::trace!("sx127x::init coding rate 4/{}", config.coding_rate.clamp(5, 8));
        self.set_preamble_length(config.preamble_length)?;
        log::trace!("sx127x::init preamble {} symbols", config.preamble_length);
        self.set_sync_word(config.sync_word)?;
        log::trace!("sx127x::init sync word {:#04x}", config.sync_word);
        self.enable_crc(config.enable_crc)?;
        log::trace!("sx127x::init crc {}", config.enable_crc);

        self.device.write_register(FifoTxBaseAddr {
            value: FIFO_TX_BASE_ADDR,
        })?;
        self.device.write_register(FifoRxBaseAddr {
            value: FIFO_RX_BASE_ADDR,
        })?;
        log::trace!(
            "sx127x::init fifo base tx {:#04x}, rx {:#04x}",
            FIFO_TX_BASE_ADDR,
            FIFO_RX_BASE_ADDR
        );

        self.standby()?;
        log::debug!(
            "sx127x::init done: {chip:?}, bw {} Hz, sf {}, ldr {}",
            self.bandwidth_hz,
            self.spreading_factor,
            self.low_data_rate
        );
        Ok(chip)
    }

    /// Reads the silicon version register.
    pub fn version(&mut self) -> Result<u8, Error> {
        let version: Version = self.device.read_register()?;
        Ok(version.revision)
    }

    /// Enters standby, aborting any in-flight transmit.
    pub fn standby(&mut self) -> Result<(), Error> {
        self.transmit = TransmitState::Idle;
        self.set_mode(ModeBits::Standby, RadioMode::Standby)
    }

    /// Enters sleep, aborting any in-flight transmit.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.transmit = TransmitState::Idle;
        self.set_mode(ModeBits::Sleep, RadioMode::Sleep)
    }

    fn set_mode(&mut self, bits: ModeBits, mode: RadioMode) -> Result<(), Error> {
        self.device.write_register(OpMode::lora(bits))?;
        self.mode = mode;
        Ok(())
    }

    /// Sets the centre frequency and programs the synthesizer with the offset applied.
    ///
    /// The centre frequency and the programmed frequency are each clamped to the band
    /// the chip covers: 137-1020 MHz on the SX1276, 860-1020 MHz on the SX1272.
    pub fn set_frequency(&mut self, frequency_hz: u64) -> Result<(), Error> {
        let (low, high) = self.layout().frequency_range_hz();
        let frequency_hz = frequency_hz.clamp(low, high);
        self.frequency_hz = Some(frequency_hz);
        self.program_frequency(frequency_hz)
    }

    /// Sets the crystal error compensation, reprogramming the synthesizer if a centre
    /// frequency is already set.
    pub fn set_frequency_offset(&mut self, offset_hz: i32) -> Result<(), Error> {
        self.frequency_offset_hz = offset_hz;
        match self.frequency_hz {
            Some(frequency_hz) => self.program_frequency(frequency_hz),
            None => Ok(()),
        }
    }

    fn program_frequency(&mut self, frequency_hz: u64) -> Result<(), Error> {
        let (low, high) = self.layout().frequency_range_hz();
        let target = frequency_hz
            .saturating_add_signed(i64::from(self.frequency_offset_hz))
            .clamp(low, high);
        let frf = frf_from_hz(target);

        self.device.write_register(FrfMsb {
            value: (frf >> 16) as u8,
        })?;
        self.device.write_register(FrfMid {
            value: (frf >> 8) as u8,
        })?;
        self.device.write_register(FrfLsb { value: frf as u8 })?;
        Ok(())
    }

    /// Sets the output power and pin.
    ///
    /// # Power Ranges
    /// - `PaOutput::Rfo`: clamped to 0..=14 dBm
    /// - `PaOutput::PaBoost`: clamped to 2..=20 dBm; above 17 dBm the high power DAC is
    ///   enabled and the current limit raised to 150 mA
    pub fn set_tx_power(&mut self, level: i8, output: PaOutput) -> Result<(), Error> {
        let config = match output {
            PaOutput::Rfo => PaConfig {
                pa_boost: false,
                max_power: 7,
                output_power: level.clamp(0, 14) as u8,
            },
            PaOutput::PaBoost => {
                let level = level.clamp(2, 20) as u8;
                let high_power = level > 17;
                self.set_pa_dac(high_power)?;
                let (ocp, output_power) = if high_power {
                    (Ocp::LIMIT_150MA, level - 5)
                } else {
                    (Ocp::LIMIT_100MA, level - 2)
                };
                self.device.write_register(ocp)?;
                PaConfig {
                    pa_boost: true,
                    max_power: 0,
                    output_power,
                }
            }
        };
        self.device.write_register(config)?;
        Ok(())
    }

    fn set_pa_dac(&mut self, high_power: bool) -> Result<(), Error> {
        match self.layout() {
            Chip::Sx1276 => {
                self.device.modify_register(|dac: PaDac| PaDac {
                    value: pa_dac_bits(dac.value, high_power),
                })?;
            }
            Chip::Sx1272 => {
                self.device.modify_register(|dac: Sx1272PaDac| Sx1272PaDac {
                    value: pa_dac_bits(dac.value, high_power),
                })?;
            }
        }
        Ok(())
    }

    fn set_lna_boost(&mut self) -> Result<(), Error> {
        self.device.modify_register(|lna: Lna| Lna {
            boost_hf: Lna::BOOST_ON,
            ..lna
        })?;
        Ok(())
    }

    /// Sets the signal bandwidth, rounded up to the next supported value.
    ///
    /// The SX1272 supports 125, 250 and 500 kHz only; narrower requests become 125 kHz.
    pub fn set_signal_bandwidth(&mut self, bandwidth_hz: u32) -> Result<(), Error> {
        let chip = self.layout();
        let mut index = bandwidth_index(bandwidth_hz);
        if chip == Chip::Sx1272 {
            index = index.max(SX1272_MIN_BANDWIDTH_INDEX);
        }

        self.device
            .modify_register(|reg: ModemConfig1| reg.with_bandwidth(chip, index))?;
        self.bandwidth_hz = BANDWIDTHS_HZ[index];
        self.update_low_data_rate()
    }

    /// Sets the spreading factor, clamped to 6..=12.
    pub fn set_spreading_factor(&mut self, spreading_factor: u8) -> Result<(), Error> {
        let sf = spreading_factor.clamp(6, 12);

        self.device
            .write_register(DetectionOptimize::for_spreading_factor(sf))?;
        self.device
            .write_register(DetectionThreshold::for_spreading_factor(sf))?;
        self.device
            .modify_register(|reg: ModemConfig2| reg.with_spreading_factor(sf))?;
        self.spreading_factor = sf;
        self.update_low_data_rate()
    }

    fn update_low_data_rate(&mut self) -> Result<(), Error> {
        let enable = needs_low_data_rate(self.bandwidth_hz, self.spreading_factor);
        match self.layout() {
            Chip::Sx1276 => {
                self.device
                    .modify_register(|reg: ModemConfig3| reg.with_low_data_rate(enable))?;
            }
            Chip::Sx1272 => {
                self.device
                    .modify_register(|reg: ModemConfig1| reg.with_sx1272_low_data_rate(enable))?;
            }
        }
        self.low_data_rate = enable;
        Ok(())
    }

    /// Sets the coding rate 4/`denominator`, clamped to 4/5..=4/8.
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<(), Error> {
        let chip = self.layout();
        let cr = denominator.clamp(5, 8) - 4;
        self.device
            .modify_register(|reg: ModemConfig1| reg.with_coding_rate(chip, cr))?;
        Ok(())
    }

    /// Sets the preamble length in symbols.
    pub fn set_preamble_length(&mut self, length: u16) -> Result<(), Error> {
        self.device.write_register(PreambleMsb {
            value: (length >> 8) as u8,
        })?;
        self.device.write_register(PreambleLsb {
            value: length as u8,
        })?;
        Ok(())
    }

    /// Sets the sync word.
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<(), Error> {
        self.device.write_register(SyncWord { value: sync_word })?;
        Ok(())
    }

    /// Enables or disables payload CRC generation and checking.
    pub fn enable_crc(&mut self, enable: bool) -> Result<(), Error> {
        match self.layout() {
            Chip::Sx1276 => {
                self.device
                    .modify_register(|reg: ModemConfig2| reg.with_sx1276_crc(enable))?;
            }
            Chip::Sx1272 => {
                self.device
                    .modify_register(|reg: ModemConfig1| reg.with_sx1272_crc(enable))?;
            }
        }
        Ok(())
    }

    /// Selects implicit (fixed length, no chip-level header) or explicit header mode.
    pub fn set_implicit_header(&mut self, implicit: bool) -> Result<(), Error> {
        let chip = self.layout();
        self.device
            .modify_register(|reg: ModemConfig1| reg.with_implicit_header(chip, implicit))?;
        self.implicit_header = implicit;
        Ok(())
    }

    /// Starts listening continuously.
    ///
    /// `expected_size > 0` selects implicit header mode with that payload length. With a
    /// receiver attached, DIO0 is routed to RxDone and the interrupt handler delivers
    /// packets to it. Entering receive abandons any in-flight transmit.
    pub fn receive(&mut self, expected_size: u8) -> Result<(), Error> {
        self.switch.set_receive()?;
        self.set_implicit_header(expected_size > 0)?;
        if expected_size > 0 {
            self.device.write_register(PayloadLength {
                value: expected_size,
            })?;
        }

        if self.receiver.is_some() {
            self.action = IrqAction::ReceivePending;
            self.device.write_register(DioMapping1 {
                dio0: Dio0Mapping::RxDone,
            })?;
        } else {
            self.action = IrqAction::None;
        }

        self.transmit = TransmitState::Idle;
        // The last packet always starts at FifoRxCurrentAddr, so the pointer stays.
        self.set_mode(ModeBits::ReceiveContinuous, RadioMode::ReceiveContinuous)
    }

    /// Prepares the FIFO for a new outgoing packet and enters standby.
    ///
    /// # Errors
    /// * `Error::TransmitInFlight` - the previous packet has not completed; call
    ///   [`standby`](Self::standby) to abandon it
    pub fn begin_packet(&mut self, implicit_header: bool) -> Result<(), Error> {
        if self.is_transmitting() {
            return Err(Error::TransmitInFlight);
        }

        self.switch.set_transmit()?;
        self.action = IrqAction::None;
        self.standby()?;
        self.set_implicit_header(implicit_header)?;

        self.device.write_register(FifoAddrPtr {
            value: FIFO_TX_BASE_ADDR,
        })?;
        self.device.write_register(PayloadLength { value: 0 })?;
        self.transmit = TransmitState::Staging;
        Ok(())
    }

    /// Appends bytes to the staged packet in a single FIFO transfer.
    ///
    /// Returns the number of bytes accepted. Bytes beyond the 255-byte packet limit are
    /// dropped silently.
    pub fn write_fifo(&mut self, bytes: &[u8]) -> Result<usize, Error> {
        let current: PayloadLength = self.device.read_register()?;
        let room = MAX_PACKET_LENGTH
            .saturating_sub(usize::from(FIFO_TX_BASE_ADDR) + usize::from(current.value));
        let size = bytes.len().min(room);
        if size == 0 {
            return Ok(0);
        }

        // The transfer clocks the device's reply back into the buffer.
        let mut scratch = [0u8; MAX_PACKET_LENGTH];
        let block = &mut scratch[..size];
        block.copy_from_slice(&bytes[..size]);
        self.device.transfer_block(REG_FIFO | WRITE_FLAG, block)?;

        self.device.write_register(PayloadLength {
            value: current.value + size as u8,
        })?;
        Ok(size)
    }

    /// Hands the staged packet to the modem. Does not wait for completion.
    ///
    /// With a receiver attached, DIO0 is routed to TxDone and the interrupt handler
    /// reports completion through [`LoraReceiver::on_transmit_done`]; otherwise poll
    /// [`is_tx_done`](Self::is_tx_done).
    pub fn end_packet(&mut self) -> Result<(), Error> {
        if self.receiver.is_some() {
            self.action = IrqAction::TransmitPending;
            self.device.write_register(DioMapping1 {
                dio0: Dio0Mapping::TxDone,
            })?;
        } else {
            self.action = IrqAction::None;
        }

        self.set_mode(ModeBits::Transmit, RadioMode::Transmit)?;
        self.transmit = TransmitState::InFlight;
        Ok(())
    }

    /// SNR of the last received packet in dB.
    pub fn packet_snr(&mut self) -> Result<f32, Error> {
        let raw: PktSnrValue = self.device.read_register()?;
        Ok(snr_from_raw(raw.value))
    }

    /// Corrected RSSI of the last received packet in dBm.
    pub fn packet_rssi(&mut self) -> Result<i16, Error> {
        Ok(self.signal_quality()?.rssi)
    }

    fn signal_quality(&mut self) -> Result<SignalQuality, Error> {
        let snr = self.packet_snr()?;
        let raw: PktRssiValue = self.device.read_register()?;
        Ok(SignalQuality {
            rssi: corrected_rssi(raw.value, snr, self.frequency_hz.unwrap_or(0)),
            snr,
        })
    }

    /// Copies the last received packet out of the FIFO into the internal buffer.
    fn load_payload(&mut self) -> Result<(), Error> {
        let start: FifoRxCurrentAddr = self.device.read_register()?;
        self.device.write_register(FifoAddrPtr { value: start.value })?;

        let length = if self.implicit_header {
            let length: PayloadLength = self.device.read_register()?;
            length.value
        } else {
            let length: RxNbBytes = self.device.read_register()?;
            length.value
        };

        let block = &mut self.rx_buffer[..usize::from(length)];
        block.fill(0);
        self.device.transfer_block(REG_FIFO, block)?;
        self.rx_length = usize::from(length);
        Ok(())
    }

    /// Reads the last received packet out of the FIFO.
    ///
    /// Used with [`received_packet`](Self::received_packet) when no receiver is
    /// attached.
    pub fn read_payload(&mut self) -> Result<&[u8], Error> {
        self.load_payload()?;
        Ok(&self.rx_buffer[..self.rx_length])
    }

    /// Reads every register, address 0x00 to 0x7F.
    ///
    /// Address 0x00 is the FIFO, so this advances the FIFO pointer by one.
    pub fn registers(&mut self) -> Result<[u8; REGISTER_COUNT], Error> {
        let mut registers = [0u8; REGISTER_COUNT];
        for (address, value) in registers.iter_mut().enumerate() {
            *value = self.device.read(address as u8)?;
        }
        Ok(registers)
    }

    /// Logs every register at info level.
    pub fn dump_registers(&mut self) -> Result<(), Error> {
        let registers = self.registers()?;
        for (address, value) in registers.iter().enumerate() {
            log::info!("sx127x register {address:#04x}: {value:#04x}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
