//! Host-side stand-ins for the hardware, used by the unit tests.
//!
//! [`SimulatedChip`] models the SX127x register file and FIFO behind an `SpiDevice`.
//! It understands the address byte convention (bit 7 = write), auto-increments the
//! address for burst accesses, walks the FIFO through RegFifoAddrPtr and applies the
//! few register side effects the driver depends on:
//! - RegIrqFlags is write-1-to-clear
//! - Entering LoRa transmit mode raises TxDone (unless disabled)
//! - Starting an image calibration completes immediately

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, OutputPin};
use embedded_hal::spi::{self, ErrorKind, Operation, SpiDevice};

use crate::registers::{Chip, Irq, ImageCal};

const REG_FIFO: u8 = 0x00;
const REG_OP_MODE: u8 = 0x01;
const REG_FIFO_ADDR_PTR: usize = 0x0D;
const REG_FIFO_RX_BASE_ADDR: usize = 0x0F;
const REG_FIFO_RX_CURRENT_ADDR: usize = 0x10;
const REG_IRQ_FLAGS: u8 = 0x12;
const REG_RX_NB_BYTES: usize = 0x13;
const REG_PKT_SNR_VALUE: usize = 0x19;
const REG_PKT_RSSI_VALUE: usize = 0x1A;
const REG_IMAGE_CAL: u8 = 0x3B;
const REG_VERSION: u8 = 0x42;

const READ_ONLY: [u8; 6] = [0x10, 0x13, 0x19, 0x1A, 0x3C, REG_VERSION];

struct ChipState {
    registers: [u8; 128],
    fifo: [u8; 256],
    frames: Vec<Vec<u8>>,
    writes: Vec<(u8, u8)>,
    auto_tx_done: bool,
    bus_broken: bool,
}

impl ChipState {
    fn new(version: u8) -> Self {
        let mut registers = [0u8; 128];
        registers[REG_OP_MODE as usize] = 0x09;
        registers[0x09] = 0x4F;
        registers[0x0B] = 0x2B;
        registers[0x0C] = 0x20;
        registers[0x1D] = if version == Chip::SX1272_VERSION { 0x08 } else { 0x72 };
        registers[0x1E] = 0x70;
        registers[0x26] = 0x04;
        registers[0x39] = 0x12;
        registers[REG_IMAGE_CAL as usize] = 0x82;
        registers[0x3C] = 0xE7;
        registers[REG_VERSION as usize] = version;
        registers[0x4D] = 0x84;
        registers[0x5A] = 0x84;

        Self {
            registers,
            fifo: [0u8; 256],
            frames: Vec::new(),
            writes: Vec::new(),
            auto_tx_done: true,
            bus_broken: false,
        }
    }

    /// Clocks one data byte for the access started by `address`, returning the reply.
    fn clock(&mut self, address: &mut u8, mosi: u8) -> u8 {
        let write = *address & 0x80 != 0;
        let register = *address & 0x7F;

        if register == REG_FIFO {
            let ptr = self.registers[REG_FIFO_ADDR_PTR];
            self.registers[REG_FIFO_ADDR_PTR] = ptr.wrapping_add(1);
            if write {
                self.fifo[ptr as usize] = mosi;
                return 0;
            }
            return self.fifo[ptr as usize];
        }

        let reply = self.registers[register as usize];
        if write {
            self.store(register, mosi);
        }
        *address = (*address & 0x80) | ((register + 1) & 0x7F);
        reply
    }

    fn store(&mut self, register: u8, value: u8) {
        self.writes.push((register, value));
        if READ_ONLY.contains(&register) {
            return;
        }

        let slot = &mut self.registers[register as usize];
        match register {
            REG_IRQ_FLAGS => *slot &= !value,
            REG_IMAGE_CAL => *slot = value & !(ImageCal::IMAGE_CAL_START | ImageCal::IMAGE_CAL_RUNNING),
            REG_OP_MODE => {
                *slot = value;
                if self.auto_tx_done && value == 0x83 {
                    self.registers[REG_IRQ_FLAGS as usize] |= Irq::TX_DONE.bits();
                }
            }
            _ => *slot = value,
        }
    }
}

/// Simulated SX127x shared between a test and the driver under test.
#[derive(Clone)]
pub struct SimulatedChip {
    state: Rc<RefCell<ChipState>>,
}

impl SimulatedChip {
    /// An SX1276 (version 0x12) with datasheet reset values.
    pub fn sx1276() -> Self {
        Self::with_version(Chip::SX1276_VERSION)
    }

    /// An SX1272 (version 0x22) with datasheet reset values.
    pub fn sx1272() -> Self {
        Self::with_version(Chip::SX1272_VERSION)
    }

    /// A chip reporting an arbitrary version byte.
    pub fn with_version(version: u8) -> Self {
        Self {
            state: Rc::new(RefCell::new(ChipState::new(version))),
        }
    }

    /// An `SpiDevice` talking to this chip.
    pub fn spi(&self) -> SimulatedSpi {
        SimulatedSpi {
            state: Rc::clone(&self.state),
        }
    }

    /// Bytes clocked out by the host, one entry per transaction.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.state.borrow().frames.clone()
    }

    /// Number of SPI transactions so far.
    pub fn transaction_count(&self) -> usize {
        self.state.borrow().frames.len()
    }

    /// Every register write so far, in order, as `(address, value)`.
    pub fn writes(&self) -> Vec<(u8, u8)> {
        self.state.borrow().writes.clone()
    }

    /// Values written to one register, in order.
    pub fn writes_to(&self, register: u8) -> Vec<u8> {
        self.state
            .borrow()
            .writes
            .iter()
            .filter(|(address, _)| *address == register)
            .map(|(_, value)| *value)
            .collect()
    }

    /// Forgets the recorded frames and writes.
    pub fn clear_history(&self) {
        let mut state = self.state.borrow_mut();
        state.frames.clear();
        state.writes.clear();
    }

    /// Current register contents.
    pub fn register(&self, address: u8) -> u8 {
        self.state.borrow().registers[(address & 0x7F) as usize]
    }

    /// Sets a register directly, bypassing side effects.
    pub fn set_register(&self, address: u8, value: u8) {
        self.state.borrow_mut().registers[(address & 0x7F) as usize] = value;
    }

    /// FIFO contents starting at `start`.
    pub fn fifo(&self, start: u8, len: usize) -> Vec<u8> {
        let state = self.state.borrow();
        (0..len)
            .map(|i| state.fifo[(start as usize + i) % 256])
            .collect()
    }

    /// Raises interrupt flags as the modem would.
    pub fn raise_irq(&self, irq: Irq) {
        self.state.borrow_mut().registers[REG_IRQ_FLAGS as usize] |= irq.bits();
    }

    /// Whether entering transmit mode raises TxDone straight away.
    pub fn set_auto_tx_done(&self, enabled: bool) {
        self.state.borrow_mut().auto_tx_done = enabled;
    }

    /// Makes every following transaction fail.
    pub fn break_bus(&self) {
        self.state.borrow_mut().bus_broken = true;
    }

    /// Lands a received packet in the FIFO at the RX base address and raises RxDone.
    pub fn inject_rx(&self, payload: &[u8], snr_raw: u8, rssi_raw: u8) {
        let mut state = self.state.borrow_mut();
        let base = state.registers[REG_FIFO_RX_BASE_ADDR];
        for (i, byte) in payload.iter().enumerate() {
            state.fifo[(base as usize + i) % 256] = *byte;
        }
        state.registers[REG_FIFO_RX_CURRENT_ADDR] = base;
        state.registers[REG_RX_NB_BYTES] = payload.len() as u8;
        state.registers[REG_PKT_SNR_VALUE] = snr_raw;
        state.registers[REG_PKT_RSSI_VALUE] = rssi_raw;
        state.registers[REG_IRQ_FLAGS as usize] |= Irq::RX_DONE.bits();
    }
}

/// Bus failure reported by a [`SimulatedChip`] after [`SimulatedChip::break_bus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedBusError;

impl spi::Error for SimulatedBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// `SpiDevice` handle onto a [`SimulatedChip`].
pub struct SimulatedSpi {
    state: Rc<RefCell<ChipState>>,
}

impl spi::ErrorType for SimulatedSpi {
    type Error = SimulatedBusError;
}

impl SpiDevice for SimulatedSpi {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        let mut state = self.state.borrow_mut();
        if state.bus_broken {
            return Err(SimulatedBusError);
        }

        let mut frame = Vec::new();
        let mut address: Option<u8> = None;
        let mut exchange = |state: &mut ChipState, mosi: u8| -> u8 {
            frame.push(mosi);
            match address.as_mut() {
                None => {
                    address = Some(mosi);
                    0
                }
                Some(current) => state.clock(current, mosi),
            }
        };

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    for byte in bytes.iter() {
                        exchange(&mut *state, *byte);
                    }
                }
                Operation::Read(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = exchange(&mut *state, 0x00);
                    }
                }
                Operation::TransferInPlace(buffer) => {
                    for byte in buffer.iter_mut() {
                        *byte = exchange(&mut *state, *byte);
                    }
                }
                Operation::Transfer(read, write) => {
                    for i in 0..read.len().max(write.len()) {
                        let reply = exchange(&mut *state, write.get(i).copied().unwrap_or(0x00));
                        if let Some(slot) = read.get_mut(i) {
                            *slot = reply;
                        }
                    }
                }
                Operation::DelayNs(_) => {}
            }
        }

        state.frames.push(frame);
        Ok(())
    }
}

/// Delay that returns immediately and adds up what it was asked for.
#[derive(Debug, Default)]
pub struct NoopDelay {
    elapsed_ns: u64,
}

impl NoopDelay {
    /// Total requested delay in whole milliseconds.
    pub fn total_ms(&self) -> u32 {
        (self.elapsed_ns / 1_000_000) as u32
    }
}

impl DelayNs for NoopDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    fn delay_us(&mut self, us: u32) {
        self.elapsed_ns += u64::from(us) * 1_000;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}

/// Records the levels written to an output pin.
#[derive(Clone, Default)]
pub struct PinLog {
    levels: Rc<RefCell<Vec<bool>>>,
    high: Rc<Cell<bool>>,
}

impl PinLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// An `OutputPin` feeding this log.
    pub fn pin(&self) -> LoggedPin {
        LoggedPin { log: self.clone() }
    }

    pub fn is_high(&self) -> bool {
        self.high.get()
    }

    /// Every level written, in order.
    pub fn history(&self) -> Vec<bool> {
        self.levels.borrow().clone()
    }

    fn record(&self, high: bool) {
        self.levels.borrow_mut().push(high);
        self.high.set(high);
    }
}

/// Output pin handed to the driver by a [`PinLog`].
pub struct LoggedPin {
    log: PinLog,
}

impl digital::ErrorType for LoggedPin {
    type Error = Infallible;
}

impl OutputPin for LoggedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.log.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.log.record(true);
        Ok(())
    }
}
