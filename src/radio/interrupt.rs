//! DIO0 interrupt handling and the polling alternative
//!
//! When a receiver is attached, [`Sx127x::receive`] and [`Sx127x::end_packet`] record
//! which completion the next DIO0 edge stands for and route DIO0 to
//! RxDone or TxDone. [`Sx127x::handle_interrupt`] then classifies the interrupt flags
//! and either calls the receiver or records a [`RadioFault`].
//!
//! Without a receiver, the application polls [`Sx127x::is_tx_done`] and
//! [`Sx127x::received_packet`] instead.

use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;

use super::{
    Error, RadioFault, RadioMode, SignalQuality, Sx127x, TransmitState, FIFO_RX_BASE_ADDR,
};
use crate::dispatch::InterruptHandler;
use crate::registers::{FifoAddrPtr, Irq, IrqFlags, ModeBits, OpMode, PayloadLength};
use crate::switch::RfSwitch;

/// Completion callbacks delivered from the DIO0 interrupt.
///
/// Both methods run in interrupt context. They must not block, delay or log, and
/// should copy what they need and return.
pub trait LoraReceiver {
    /// A packet arrived intact. `payload` is only valid for the duration of the call.
    fn on_receive(&mut self, payload: &[u8], quality: SignalQuality);

    /// The staged packet has been sent. The radio goes back to receiving afterwards.
    fn on_transmit_done(&mut self);
}

/// Placeholder receiver for radios driven by polling.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReceiver;

impl LoraReceiver for NoReceiver {
    fn on_receive(&mut self, _payload: &[u8], _quality: SignalQuality) {}

    fn on_transmit_done(&mut self) {}
}

/// What the next DIO0 edge is expected to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IrqAction {
    /// Nothing armed; the flags are cleared and otherwise ignored
    None,
    /// DIO0 routed to RxDone
    ReceivePending,
    /// DIO0 routed to TxDone
    TransmitPending,
}

impl<SPI, D, R, SW> Sx127x<SPI, D, R, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    R: LoraReceiver,
    SW: RfSwitch,
{
    /// Services one DIO0 edge.
    ///
    /// Safe to call from interrupt context: it never waits, delays or logs. Failures
    /// are recorded for [`last_error`](Self::last_error) rather than returned.
    pub fn handle_interrupt(&mut self) {
        let outcome = match self.action {
            IrqAction::None => self.acknowledge_interrupt(),
            IrqAction::ReceivePending => self.service_receive(),
            IrqAction::TransmitPending => self.service_transmit(),
        };
        if outcome.is_err() {
            self.fault = Some(RadioFault::Bus);
        }
    }

    fn acknowledge_interrupt(&mut self) -> Result<(), Error> {
        self.take_flags_from_interrupt().map(|_| ())
    }

    fn service_receive(&mut self) -> Result<(), Error> {
        self.fault = None;
        let Some(flags) = self.take_flags_from_interrupt()? else {
            self.fault = Some(RadioFault::IrqLockBusy);
            return Ok(());
        };

        let fault = if !flags.contains(Irq::RX_DONE) {
            RadioFault::NotRxDone
        } else if flags.contains(Irq::PAYLOAD_CRC_ERROR) {
            RadioFault::RxCrcError
        } else if flags.contains(Irq::RX_TIMEOUT) {
            RadioFault::RxTimeout
        } else if self.receiver.is_none() {
            RadioFault::NoReceiver
        } else {
            // The lock is already released: the FIFO copy is not covered by it.
            self.load_payload()?;
            let quality = self.signal_quality()?;
            if let Some(receiver) = self.receiver.as_mut() {
                receiver.on_receive(&self.rx_buffer[..self.rx_length], quality);
            }
            return Ok(());
        };

        self.fault = Some(fault);
        Ok(())
    }

    fn service_transmit(&mut self) -> Result<(), Error> {
        self.fault = None;
        let Some(flags) = self.take_flags_from_interrupt()? else {
            self.fault = Some(RadioFault::IrqLockBusy);
            return Ok(());
        };

        if !flags.contains(Irq::TX_DONE) {
            self.fault = Some(RadioFault::TxNotDone(flags.bits()));
            return Ok(());
        }

        self.transmit = TransmitState::Idle;
        self.action = IrqAction::None;
        match self.receiver.as_mut() {
            Some(receiver) => {
                receiver.on_transmit_done();
                self.receive(0)
            }
            None => {
                self.fault = Some(RadioFault::TxNoCallback);
                Ok(())
            }
        }
    }

    /// One attempt at the flags lock, then read-clear. `None` if the lock was held.
    fn take_flags_from_interrupt(&mut self) -> Result<Option<Irq>, Error> {
        if !self.lock.try_acquire() {
            return Ok(None);
        }
        let flags = self.read_clear_flags();
        self.lock.release();
        flags.map(Some)
    }

    /// Waits for the flags lock, then read-clear.
    fn take_flags(&mut self) -> Result<Irq, Error> {
        self.lock.acquire(&mut self.delay)?;
        let flags = self.read_clear_flags();
        self.lock.release();
        flags
    }

    fn read_clear_flags(&mut self) -> Result<Irq, Error> {
        let flags: IrqFlags = self.device.read_register()?;
        self.device.write_register(flags)?;
        Ok(flags.irq)
    }

    /// Polls for transmit completion, clearing the interrupt flags.
    ///
    /// Returns `true` once per completed packet.
    ///
    /// # Important Notes
    /// Refused while a receiver is attached: logs a warning, records
    /// [`RadioFault::SyncWithCallback`] and returns `false` without touching the chip.
    pub fn is_tx_done(&mut self) -> Result<bool, Error> {
        if self.receiver.is_some() {
            log::warn!("sx127x: do not call is_tx_done with a receiver attached, use the callback");
            self.fault = Some(RadioFault::SyncWithCallback);
            return Ok(false);
        }

        let flags = self.take_flags()?;
        if !flags.contains(Irq::TX_DONE) {
            return Ok(false);
        }
        self.transmit = TransmitState::Idle;
        Ok(true)
    }

    /// Polls for a received packet, clearing the interrupt flags.
    ///
    /// `expected_size > 0` selects implicit header mode with that payload length for
    /// the next packet. Returns `true` when a packet arrived with RxDone alone set;
    /// read it with [`read_payload`](Self::read_payload). If nothing arrived and the
    /// radio is not listening, continuous receive is re-entered.
    ///
    /// # Important Notes
    /// Refused while a receiver is attached, like [`is_tx_done`](Self::is_tx_done).
    pub fn received_packet(&mut self, expected_size: u8) -> Result<bool, Error> {
        if self.receiver.is_some() {
            log::warn!(
                "sx127x: do not call received_packet with a receiver attached, use the callback"
            );
            self.fault = Some(RadioFault::SyncWithCallback);
            return Ok(false);
        }

        let flags = self.take_flags()?;
        self.set_implicit_header(expected_size > 0)?;
        if expected_size > 0 {
            self.device.write_register(PayloadLength {
                value: expected_size,
            })?;
        }

        if flags == Irq::RX_DONE {
            return Ok(true);
        }

        let op_mode = OpMode::from_byte(self.device.read_byte::<OpMode>()?);
        let listening = op_mode.long_range_mode
            && matches!(
                op_mode.mode,
                ModeBits::ReceiveSingle | ModeBits::ReceiveContinuous
            );
        if !listening {
            self.device.write_register(FifoAddrPtr {
                value: FIFO_RX_BASE_ADDR,
            })?;
            self.device
                .write_register(OpMode::lora(ModeBits::ReceiveContinuous))?;
            self.mode = RadioMode::ReceiveContinuous;
        }
        Ok(false)
    }
}

impl<SPI, D, R, SW> InterruptHandler for Sx127x<SPI, D, R, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    R: LoraReceiver,
    SW: RfSwitch,
{
    fn on_interrupt(&mut self) {
        self.handle_interrupt();
    }
}
