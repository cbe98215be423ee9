//! Addressed packet link over an interrupt-driven radio
//!
//! [`LoraLink`] is the usual entry point. It attaches an [`Inbox`] to the radio, keeps
//! the radio listening between transmissions and frames every outgoing payload with
//! the header described in [`packet`](crate::packet).
//!
//! Received packets go into a single slot: a packet that is not read before the next
//! one arrives is replaced.
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use sx127x::{InterruptSlot, LoraLink, RadioConfig};
//!
//! fn run<SPI: SpiDevice, D: DelayNs>(
//!     slot: &InterruptSlot<LoraLink<SPI, D>>,
//!     spi: SPI,
//!     delay: D,
//! ) -> Result<(), sx127x::Error> {
//!     let mut link = LoraLink::new(spi, delay);
//!     link.start(&RadioConfig::link_defaults())?;
//!     slot.install(link);
//!
//!     // From the DIO0 interrupt handler: `slot.dispatch();`
//!
//!     slot.with(|link| link.send_string("hello")).transpose()?;
//!     if let Some(Some(packet)) = slot.with(|link| link.read_packet()) {
//!         let _ = packet.text();
//!     }
//!     Ok(())
//! }
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiDevice;

use crate::dispatch::InterruptHandler;
use crate::packet::{LoraPacket, PacketHeader, BROADCAST_ADDRESS, MAX_PAYLOAD};
use crate::radio::{
    hardware_reset, Error, LoraReceiver, RadioConfig, RadioFault, SignalQuality, Sx127x,
};
use crate::registers::Chip;
use crate::switch::{NoRfSwitch, RfSwitch};

/// Source address used by [`LoraLink::send_string`] until changed.
pub const DEFAULT_LOCAL_ADDRESS: u8 = 0x41;

/// Receiver that keeps the latest packet and a transmit done flag.
#[derive(Debug, Default)]
pub struct Inbox {
    pending: Option<LoraPacket>,
    tx_done: bool,
}

impl Inbox {
    /// Whether a packet is waiting.
    pub fn has_packet(&self) -> bool {
        self.pending.is_some()
    }

    /// Takes the waiting packet.
    pub fn take_packet(&mut self) -> Option<LoraPacket> {
        self.pending.take()
    }

    /// Whether the last packet handed to the radio has been sent.
    pub fn tx_done(&self) -> bool {
        self.tx_done
    }

    fn clear_tx_done(&mut self) {
        self.tx_done = false;
    }
}

impl LoraReceiver for Inbox {
    fn on_receive(&mut self, payload: &[u8], quality: SignalQuality) {
        // Too short for a header: keep whatever is already waiting.
        if let Some(packet) = LoraPacket::decode(payload, quality) {
            self.pending = Some(packet);
        }
    }

    fn on_transmit_done(&mut self) {
        self.tx_done = true;
    }
}

/// Packet link: an [`Sx127x`] with an [`Inbox`] attached and a line counter.
pub struct LoraLink<SPI, D, SW = NoRfSwitch> {
    radio: Sx127x<SPI, D, Inbox, SW>,
    line_counter: u8,
    dst_address: u8,
    local_address: u8,
}

impl<SPI, D> LoraLink<SPI, D> {
    /// Creates a link without an antenna switch. Call [`start`](Self::start) next.
    pub fn new(spi: SPI, delay: D) -> Self {
        Self::with_switch(spi, delay, NoRfSwitch)
    }
}

impl<SPI, D, SW> LoraLink<SPI, D, SW> {
    /// Creates a link driving an antenna switch.
    pub fn with_switch(spi: SPI, delay: D, switch: SW) -> Self {
        Self {
            radio: Sx127x::with_switch(spi, delay, switch),
            line_counter: 0,
            dst_address: BROADCAST_ADDRESS,
            local_address: DEFAULT_LOCAL_ADDRESS,
        }
    }

    /// Sets the addresses [`send_string`](Self::send_string) uses.
    pub fn set_addresses(&mut self, dst: u8, local: u8) {
        self.dst_address = dst;
        self.local_address = local;
    }

    /// Line counter of the last packet sent.
    pub fn line_counter(&self) -> u8 {
        self.line_counter
    }

    /// Whether the last packet sent has completed.
    ///
    /// With `clear`, a `true` is reported once.
    pub fn is_packet_sent(&mut self, clear: bool) -> bool {
        let Some(inbox) = self.radio.receiver_mut() else {
            return false;
        };
        let done = inbox.tx_done();
        if clear {
            inbox.clear_tx_done();
        }
        done
    }

    /// Whether a received packet is waiting.
    pub fn is_packet_available(&self) -> bool {
        self.radio.receiver().is_some_and(Inbox::has_packet)
    }

    /// Takes the waiting packet, if any.
    pub fn read_packet(&mut self) -> Option<LoraPacket> {
        self.radio.receiver_mut().and_then(Inbox::take_packet)
    }

    /// The last fault recorded by the interrupt handler, optionally clearing it.
    pub fn last_error(&mut self, clear: bool) -> Option<RadioFault> {
        let fault = self.radio.last_error();
        if clear {
            self.radio.clear_last_error();
        }
        fault
    }

    /// The underlying radio.
    pub fn radio(&self) -> &Sx127x<SPI, D, Inbox, SW> {
        &self.radio
    }

    /// The underlying radio, mutably.
    pub fn radio_mut(&mut self) -> &mut Sx127x<SPI, D, Inbox, SW> {
        &mut self.radio
    }
}

impl<SPI, D, SW> LoraLink<SPI, D, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    SW: RfSwitch,
{
    /// Configures the radio, runs one image calibration and starts listening.
    pub fn start(&mut self, config: &RadioConfig) -> Result<Chip, Error> {
        let chip = self.radio.init(config)?;
        let temperature = self.radio.calibrate()?;
        log::info!("sx127x link: {chip:?} up, raw temperature {temperature}");

        self.radio.set_receiver(Inbox::default());
        self.radio.receive(0)?;
        Ok(chip)
    }

    /// Pulses the reset line. Call [`start`](Self::start) again afterwards.
    pub fn reset<P: OutputPin>(&mut self, reset: &mut P) -> Result<(), Error> {
        hardware_reset(reset, self.radio.delay_mut())
    }

    /// Sends `payload` to `dst` as `src`, without waiting for completion.
    ///
    /// Returns the number of payload bytes sent; anything past [`MAX_PAYLOAD`] is
    /// dropped.
    ///
    /// # Errors
    /// * `Error::TransmitInFlight` - the previous packet has not completed
    pub fn send_packet(&mut self, dst: u8, src: u8, payload: &[u8]) -> Result<usize, Error> {
        self.radio.begin_packet(false)?;
        self.line_counter = self.line_counter.wrapping_add(1);
        if let Some(inbox) = self.radio.receiver_mut() {
            inbox.clear_tx_done();
        }

        let payload = &payload[..payload.len().min(MAX_PAYLOAD)];
        let header = PacketHeader {
            dst,
            src,
            line: self.line_counter,
            len: payload.len() as u8,
        };
        self.radio.write_fifo(&header.to_bytes())?;
        let sent = self.radio.write_fifo(payload)?;
        self.radio.end_packet()?;
        Ok(sent)
    }

    /// Sends `text` from the local address to the destination address.
    pub fn send_string(&mut self, text: &str) -> Result<usize, Error> {
        self.send_packet(self.dst_address, self.local_address, text.as_bytes())
    }

    /// Retunes the radio. Leaves it in standby; call
    /// [`wait_for_packet`](Self::wait_for_packet) to listen again.
    pub fn set_frequency(&mut self, frequency_hz: u64) -> Result<(), Error> {
        self.radio.standby()?;
        self.radio.delay_mut().delay_ms(1);
        self.radio.set_frequency(frequency_hz)
    }

    /// Sets the crystal error compensation.
    pub fn set_frequency_offset(&mut self, offset_hz: i32) -> Result<(), Error> {
        self.radio.set_frequency_offset(offset_hz)
    }

    /// Puts the radio to sleep.
    pub fn sleep(&mut self) -> Result<(), Error> {
        self.radio.sleep()
    }

    /// Goes back to listening.
    pub fn wait_for_packet(&mut self) -> Result<(), Error> {
        self.radio.receive(0)
    }

    /// Logs every register.
    pub fn dump_registers(&mut self) -> Result<(), Error> {
        self.radio.dump_registers()
    }
}

impl<SPI, D, SW> InterruptHandler for LoraLink<SPI, D, SW>
where
    SPI: SpiDevice,
    D: DelayNs,
    SW: RfSwitch,
{
    fn on_interrupt(&mut self) {
        self.radio.handle_interrupt();
    }
}
