use super::*;
use crate::mock::{NoopDelay, PinLog, SimulatedChip, SimulatedSpi};
use crate::registers::{hz_from_frf, Irq};

const REG_OP_MODE: u8 = 0x01;
const REG_IRQ_FLAGS: u8 = 0x12;
const REG_MODEM_CONFIG_1: u8 = 0x1D;
const REG_MODEM_CONFIG_2: u8 = 0x1E;
const REG_MODEM_CONFIG_3: u8 = 0x26;
const REG_PAYLOAD_LENGTH: u8 = 0x22;
const REG_DIO_MAPPING_1: u8 = 0x40;

#[derive(Default)]
struct Recorder {
    packets: Vec<(Vec<u8>, SignalQuality)>,
    transmits: u32,
}

impl LoraReceiver for Recorder {
    fn on_receive(&mut self, payload: &[u8], quality: SignalQuality) {
        self.packets.push((payload.to_vec(), quality));
    }

    fn on_transmit_done(&mut self) {
        self.transmits += 1;
    }
}

fn polling_radio(chip: &SimulatedChip) -> Sx127x<SimulatedSpi, NoopDelay> {
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());
    radio.init(&RadioConfig::default()).unwrap();
    radio
}

fn callback_radio(chip: &SimulatedChip) -> Sx127x<SimulatedSpi, NoopDelay, Recorder> {
    let mut radio = Sx127x::with_switch(chip.spi(), NoopDelay::default(), NoRfSwitch);
    radio.init(&RadioConfig::default()).unwrap();
    radio.set_receiver(Recorder::default());
    radio
}

fn frequency_register(chip: &SimulatedChip) -> u32 {
    u32::from(chip.register(0x06)) << 16
        | u32::from(chip.register(0x07)) << 8
        | u32::from(chip.register(0x08))
}

#[test]
fn init_programs_default_config() {
    let chip = SimulatedChip::sx1276();
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());

    assert_eq!(radio.init(&RadioConfig::default()).unwrap(), Chip::Sx1276);
    assert_eq!(radio.chip(), Some(Chip::Sx1276));
    assert_eq!(radio.mode(), RadioMode::Standby);

    assert_eq!(chip.register(REG_OP_MODE), 0x81);
    assert_eq!(frequency_register(&chip), 0xE4C000);
    assert_eq!(chip.register(0x09), 0x80);
    assert_eq!(chip.register(0x0B), 0x0B);
    assert_eq!(chip.register(0x0C), 0x23);
    assert_eq!(chip.register(0x0E), 0x00);
    assert_eq!(chip.register(0x0F), 0x00);
    assert_eq!(chip.register(REG_MODEM_CONFIG_1), 0x72);
    assert_eq!(chip.register(REG_MODEM_CONFIG_2), 0x70);
    assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x04);
    assert_eq!(chip.register(0x20), 0x00);
    assert_eq!(chip.register(0x21), 0x08);
    assert_eq!(chip.register(0x31), 0xC3);
    assert_eq!(chip.register(0x37), 0x0A);
    assert_eq!(chip.register(0x39), 0x12);
    assert_eq!(chip.register(0x4D), 0x84);

    let modes = chip.writes_to(REG_OP_MODE);
    assert_eq!(modes.first(), Some(&0x80));
    assert_eq!(modes.last(), Some(&0x81));
}

#[test]
fn init_frequency_within_one_step() {
    for frequency_hz in [433_050_000u64, 868_123_456, 915_999_999] {
        let chip = SimulatedChip::sx1276();
        let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());
        let config = RadioConfig {
            frequency_mhz: (frequency_hz / 1_000_000) as u32,
            frequency_low_hz: (frequency_hz % 1_000_000) as u32,
            ..RadioConfig::default()
        };
        radio.init(&config).unwrap();

        let programmed = hz_from_frf(frequency_register(&chip));
        assert!(programmed <= frequency_hz);
        assert!(frequency_hz - programmed < 62, "{frequency_hz} -> {programmed}");
        assert_eq!(radio.frequency(), Some(frequency_hz));
    }
}

#[test]
fn unknown_version_is_reported_and_nothing_written() {
    let chip = SimulatedChip::with_version(0x00);
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());

    let result = radio.init(&RadioConfig::default());
    assert!(matches!(result, Err(Error::UnsupportedVersion(0x00))));
    assert!(chip.writes().is_empty());
    assert_eq!(radio.chip(), None);
}

#[test]
fn sx1272_register_layout() {
    let chip = SimulatedChip::sx1272();
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());
    let config = RadioConfig {
        signal_bandwidth: 62_500,
        spreading_factor: 9,
        coding_rate: 6,
        enable_crc: true,
        tx_power_level: 20,
        ..RadioConfig::default()
    };

    assert_eq!(radio.init(&config).unwrap(), Chip::Sx1272);
    assert_eq!(radio.signal_bandwidth(), 125_000);
    assert_eq!(chip.register(REG_MODEM_CONFIG_1), 0x12);
    assert_eq!(chip.register(REG_MODEM_CONFIG_2), 0x90);
    assert!(chip.writes_to(REG_MODEM_CONFIG_3).is_empty());
    assert_eq!(chip.register(0x5A), 0x87);
    assert_eq!(chip.register(0x4D), 0x84);
}

#[test]
fn low_data_rate_follows_symbol_time() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.set_signal_bandwidth(7_800).unwrap();
    radio.set_spreading_factor(12).unwrap();
    assert!(radio.low_data_rate());
    assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x0C);

    radio.set_signal_bandwidth(500_000).unwrap();
    radio.set_spreading_factor(6).unwrap();
    assert!(!radio.low_data_rate());
    assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x04);
}

#[test]
fn sx1272_low_data_rate_lives_in_modem_config1() {
    let chip = SimulatedChip::sx1272();
    let mut radio = polling_radio(&chip);

    radio.set_spreading_factor(12).unwrap();
    assert!(radio.low_data_rate());
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) & 0x01, 0x01);

    radio.set_spreading_factor(7).unwrap();
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) & 0x01, 0x00);
}

#[test]
fn modulation_values_are_clamped() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.set_spreading_factor(3).unwrap();
    assert_eq!(radio.spreading_factor(), 6);
    assert_eq!(chip.register(0x31), 0xC5);
    assert_eq!(chip.register(0x37), 0x0C);
    assert_eq!(chip.register(REG_MODEM_CONFIG_2) >> 4, 6);

    radio.set_spreading_factor(15).unwrap();
    assert_eq!(radio.spreading_factor(), 12);
    assert_eq!(chip.register(0x31), 0xC3);

    radio.set_coding_rate(9).unwrap();
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) & 0x0E, 0x08);
    radio.set_coding_rate(1).unwrap();
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) & 0x0E, 0x02);

    radio.set_signal_bandwidth(1_000_000).unwrap();
    assert_eq!(radio.signal_bandwidth(), 500_000);
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) >> 4, 9);
}

#[test]
fn tx_power_selects_dac_and_current_limit() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.set_tx_power(20, PaOutput::PaBoost).unwrap();
    assert_eq!(chip.register(0x09), 0x8F);
    assert_eq!(chip.register(0x4D), 0x87);
    assert_eq!(chip.register(0x0B), 0x32);

    radio.set_tx_power(17, PaOutput::PaBoost).unwrap();
    assert_eq!(chip.register(0x09), 0x8F);
    assert_eq!(chip.register(0x4D), 0x84);
    assert_eq!(chip.register(0x0B), 0x0B);

    radio.set_tx_power(-3, PaOutput::PaBoost).unwrap();
    assert_eq!(chip.register(0x09), 0x80);

    radio.set_tx_power(30, PaOutput::Rfo).unwrap();
    assert_eq!(chip.register(0x09), 0x7E);
}

#[test]
fn frequency_offset_shifts_programmed_frequency() {
    let chip = SimulatedChip::sx1276();
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());

    radio.set_frequency_offset(-5_000).unwrap();
    assert!(chip.writes().is_empty());

    radio.set_frequency(915_000_000).unwrap();
    let programmed = hz_from_frf(frequency_register(&chip));
    assert!(914_995_000 - programmed < 62);

    radio.set_frequency_offset(0).unwrap();
    assert_eq!(frequency_register(&chip), 0xE4C000);
    assert_eq!(radio.frequency(), Some(915_000_000));
}

#[test]
fn frequency_is_clamped_to_the_band() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.set_frequency(1_100_000_000).unwrap();
    assert_eq!(radio.frequency(), Some(1_020_000_000));
    assert_eq!(frequency_register(&chip), 0xFF0000);

    radio.set_frequency(50_000_000).unwrap();
    assert_eq!(radio.frequency(), Some(137_000_000));
    assert_eq!(frequency_register(&chip), 0x224000);

    radio.set_frequency(1_020_000_000).unwrap();
    radio.set_frequency_offset(50_000).unwrap();
    assert_eq!(frequency_register(&chip), 0xFF0000);
}

#[test]
fn sx1272_frequency_band_starts_at_860_mhz() {
    let chip = SimulatedChip::sx1272();
    let mut radio = Sx127x::new(chip.spi(), NoopDelay::default());
    let config = RadioConfig {
        frequency_mhz: 433,
        frequency_low_hz: 2_000_000,
        ..RadioConfig::default()
    };

    radio.init(&config).unwrap();
    assert_eq!(radio.frequency(), Some(860_000_000));
    assert_eq!(frequency_register(&chip), 0xD70000);
}

#[test]
fn polled_transmit_completes_once() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.begin_packet(false).unwrap();
    assert_eq!(radio.write_fifo(b"hello").unwrap(), 5);
    assert_eq!(chip.register(REG_PAYLOAD_LENGTH), 5);
    assert_eq!(chip.fifo(0, 5), b"hello");

    radio.end_packet().unwrap();
    assert_eq!(chip.register(REG_OP_MODE), 0x83);
    assert!(radio.is_transmitting());

    assert!(radio.is_tx_done().unwrap());
    assert!(!radio.is_transmitting());
    assert!(!radio.is_tx_done().unwrap());
}

#[test]
fn oversized_payload_is_truncated() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    radio.begin_packet(false).unwrap();
    assert_eq!(radio.write_fifo(&[0xAA; 4]).unwrap(), 4);
    assert_eq!(radio.write_fifo(&[0x55; 300]).unwrap(), 251);
    assert_eq!(radio.write_fifo(b"x").unwrap(), 0);
    assert_eq!(chip.register(REG_PAYLOAD_LENGTH), 255);
}

#[test]
fn second_begin_packet_is_rejected_until_standby() {
    let chip = SimulatedChip::sx1276();
    chip.set_auto_tx_done(false);
    let mut radio = polling_radio(&chip);

    radio.begin_packet(false).unwrap();
    radio.write_fifo(b"one").unwrap();
    radio.end_packet().unwrap();

    assert!(matches!(radio.begin_packet(false), Err(Error::TransmitInFlight)));
    assert_eq!(chip.register(REG_OP_MODE), 0x83);

    radio.standby().unwrap();
    assert!(radio.begin_packet(false).is_ok());
}

#[test]
fn receive_interrupt_delivers_payload_and_quality() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);

    radio.receive(0).unwrap();
    assert_eq!(chip.register(REG_DIO_MAPPING_1), 0x00);
    assert_eq!(chip.register(REG_OP_MODE), 0x85);
    assert_eq!(radio.mode(), RadioMode::ReceiveContinuous);

    chip.inject_rx(b"ping", 0x28, 100);
    radio.handle_interrupt();

    let recorder = radio.receiver().unwrap();
    assert_eq!(recorder.packets.len(), 1);
    let (payload, quality) = &recorder.packets[0];
    assert_eq!(payload.as_slice(), b"ping");
    assert_eq!(quality.snr, 10.0);
    assert_eq!(quality.rssi, -51);
    assert_eq!(chip.register(REG_IRQ_FLAGS), 0x00);
    assert_eq!(radio.last_error(), None);
}

#[test]
fn implicit_header_receive_uses_expected_length() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);

    radio.receive(6).unwrap();
    assert_eq!(chip.register(REG_MODEM_CONFIG_1) & 0x01, 0x01);
    assert_eq!(chip.register(REG_PAYLOAD_LENGTH), 6);

    chip.inject_rx(b"sixsix", 0x00, 120);
    radio.handle_interrupt();
    assert_eq!(radio.receiver().unwrap().packets[0].0, b"sixsix");
}

#[test]
fn receive_interrupt_faults() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);
    radio.receive(0).unwrap();

    chip.raise_irq(Irq::RX_DONE | Irq::PAYLOAD_CRC_ERROR);
    radio.handle_interrupt();
    assert_eq!(radio.last_error(), Some(RadioFault::RxCrcError));

    chip.raise_irq(Irq::RX_DONE | Irq::RX_TIMEOUT);
    radio.handle_interrupt();
    assert_eq!(radio.last_error(), Some(RadioFault::RxTimeout));

    chip.raise_irq(Irq::VALID_HEADER);
    radio.handle_interrupt();
    assert_eq!(radio.last_error(), Some(RadioFault::NotRxDone));

    assert!(radio.receiver().unwrap().packets.is_empty());
    assert_eq!(chip.register(REG_IRQ_FLAGS), 0x00);

    radio.clear_last_error();
    assert_eq!(radio.last_error(), None);
}

#[test]
fn transmit_interrupt_notifies_and_rearms_receive() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);

    radio.begin_packet(false).unwrap();
    radio.write_fifo(b"data").unwrap();
    radio.end_packet().unwrap();
    assert_eq!(chip.register(REG_DIO_MAPPING_1), 0x40);

    radio.handle_interrupt();
    assert_eq!(radio.receiver().unwrap().transmits, 1);
    assert!(!radio.is_transmitting());
    assert_eq!(radio.mode(), RadioMode::ReceiveContinuous);
    assert_eq!(chip.register(REG_DIO_MAPPING_1), 0x00);
    assert_eq!(chip.register(REG_OP_MODE), 0x85);
}

#[test]
fn transmit_interrupt_without_tx_done() {
    let chip = SimulatedChip::sx1276();
    chip.set_auto_tx_done(false);
    let mut radio = callback_radio(&chip);

    radio.begin_packet(false).unwrap();
    radio.end_packet().unwrap();
    chip.raise_irq(Irq::RX_DONE);
    radio.handle_interrupt();

    assert_eq!(radio.last_error(), Some(RadioFault::TxNotDone(0x40)));
    assert_eq!(radio.receiver().unwrap().transmits, 0);
    assert!(radio.is_transmitting());
}

#[test]
fn polling_is_refused_with_receiver_attached() {
    let chip = SimulatedChip::sx1276();
    chip.set_auto_tx_done(false);
    let mut radio = callback_radio(&chip);

    radio.begin_packet(false).unwrap();
    radio.end_packet().unwrap();
    chip.raise_irq(Irq::TX_DONE);
    let before = chip.transaction_count();

    assert!(!radio.is_tx_done().unwrap());
    assert_eq!(radio.last_error(), Some(RadioFault::SyncWithCallback));
    assert!(!radio.received_packet(0).unwrap());
    assert_eq!(chip.transaction_count(), before);
    assert_eq!(chip.register(REG_IRQ_FLAGS), Irq::TX_DONE.bits());
}

#[test]
fn interrupt_leaves_flags_when_lock_is_held() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);
    radio.receive(0).unwrap();
    chip.inject_rx(b"late", 0x00, 90);

    assert!(radio.irq_lock().try_acquire());
    radio.handle_interrupt();
    assert_eq!(radio.last_error(), Some(RadioFault::IrqLockBusy));
    assert_eq!(chip.register(REG_IRQ_FLAGS), Irq::RX_DONE.bits());
    assert!(radio.receiver().unwrap().packets.is_empty());

    radio.irq_lock().release();
    radio.handle_interrupt();
    assert_eq!(radio.receiver().unwrap().packets.len(), 1);
    assert!(!radio.irq_lock().is_held());
}

#[test]
fn polling_gives_up_on_held_lock() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    assert!(radio.irq_lock().try_acquire());
    assert!(matches!(radio.is_tx_done(), Err(Error::LockTimeout)));

    radio.irq_lock().release();
    assert!(!radio.is_tx_done().unwrap());
}

#[test]
fn bus_failure_in_interrupt_is_recorded() {
    let chip = SimulatedChip::sx1276();
    let mut radio = callback_radio(&chip);
    radio.receive(0).unwrap();

    chip.break_bus();
    radio.handle_interrupt();
    assert_eq!(radio.last_error(), Some(RadioFault::Bus));
    assert!(!radio.irq_lock().is_held());
}

#[test]
fn polled_receive() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    assert!(!radio.received_packet(0).unwrap());
    assert_eq!(chip.register(REG_OP_MODE), 0x85);
    assert_eq!(radio.mode(), RadioMode::ReceiveContinuous);

    chip.inject_rx(b"abc", 0x00, 0x00);
    assert!(radio.received_packet(0).unwrap());
    assert_eq!(radio.read_payload().unwrap(), b"abc");
    assert_eq!(chip.register(REG_IRQ_FLAGS), 0x00);

    chip.clear_history();
    assert!(!radio.received_packet(0).unwrap());
    assert!(chip.writes_to(REG_OP_MODE).is_empty());
}

#[test]
fn calibration_restores_mode_and_reads_temperature() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);
    chip.clear_history();

    assert_eq!(radio.calibrate().unwrap(), -25);
    assert_eq!(
        chip.writes_to(REG_OP_MODE),
        [0x80, 0x00, 0x04, 0x00, 0x01, 0x00, 0x80, 0x81]
    );
    assert_eq!(chip.writes_to(0x3B), [0x82, 0x83, 0xC2]);
    assert_eq!(chip.register(REG_OP_MODE), 0x81);
}

#[test]
fn sx1272_skips_calibration() {
    let chip = SimulatedChip::sx1272();
    let mut radio = polling_radio(&chip);
    chip.clear_history();

    assert_eq!(radio.calibrate().unwrap(), 0);
    assert!(chip.writes().is_empty());
}

#[test]
fn register_snapshot() {
    let chip = SimulatedChip::sx1276();
    let mut radio = polling_radio(&chip);

    let registers = radio.registers().unwrap();
    assert_eq!(registers[0x42], 0x12);
    assert_eq!(registers[0x01], 0x81);
    assert_eq!(radio.version().unwrap(), 0x12);
    radio.dump_registers().unwrap();
}

#[test]
fn reset_pulse() {
    let log = PinLog::new();
    let mut pin = log.pin();
    let mut delay = NoopDelay::default();

    hardware_reset(&mut pin, &mut delay).unwrap();
    assert_eq!(log.history(), [true, false, true]);
    assert_eq!(delay.total_ms(), 20);
}

#[test]
fn rf_switch_follows_direction() {
    let chip = SimulatedChip::sx1272();
    let rx = PinLog::new();
    let tx = PinLog::new();
    let switch = crate::switch::DirectionPins::new(rx.pin(), tx.pin()).unwrap();
    let mut radio: Sx127x<_, _, NoReceiver, _> =
        Sx127x::with_switch(chip.spi(), NoopDelay::default(), switch);
    radio.init(&RadioConfig::default()).unwrap();

    radio.begin_packet(false).unwrap();
    assert!(tx.is_high());
    assert!(!rx.is_high());

    radio.receive(0).unwrap();
    assert!(rx.is_high());
    assert!(!tx.is_high());
}
