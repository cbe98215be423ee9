#![cfg_attr(not(test), no_std)]
//! SX127x LoRa Radio Driver
//!
//! This crate provides an interrupt-driven interface for the Semtech SX1272 and SX1276
//! (and the pin compatible SX1277/8/9) sub-GHz LoRa transceivers, on top of the
//! `embedded-hal` 1.0 SPI, digital and delay traits.
//!
//! # Features
//! - SX1276 (version 0x12) and SX1272 (version 0x22), identified at start-up
//! - LoRa modulation: SF6-12, BW 7.8-500 kHz (125-500 kHz on the SX1272), CR 4/5-4/8
//! - Output power on RFO (0 to +14 dBm) or PA_BOOST (+2 to +20 dBm)
//! - Transmit and receive completion delivered from the DIO0 interrupt, or polled
//! - Image calibration and raw temperature readout
//! - Addressed packet link with a latest-packet-wins receive slot
//!
//! # Architecture
//! The driver is organized into three layers:
//!
//! - [`device`]: Register protocol
//!   - One SPI transaction per register access, bit 7 of the address selects write
//!   - Block FIFO transfers in a single transaction
//!
//! - [`radio`]: Radio state machine
//!   - Chip identification and configuration ([`RadioConfig`])
//!   - Sleep, standby, transmit and continuous receive
//!   - DIO0 interrupt classification and the [`LoraReceiver`] callbacks
//!   - RSSI/SNR conversion and image calibration
//!
//! - [`link`] and [`packet`]: Packetization
//!   - Four byte addressing header, line counter, single receive slot
//!
//! Supporting modules:
//! - [`registers`]: Typed register definitions for direct hardware access
//! - [`lock`]: The interrupt flags lock shared by mainline and interrupt code
//! - [`dispatch`]: A static slot that routes the DIO0 interrupt to the driver
//! - [`switch`]: Optional antenna switch control
//!
//! # Usage
//! The driver uses the `regiface` crate to provide a type-safe interface for register
//! access. Most applications only need [`LoraLink`]:
//!
//! 1. Pulse the reset line with [`hardware_reset`]
//! 2. Create a [`LoraLink`] with your SPI device and delay provider
//! 3. [`LoraLink::start`] with a [`RadioConfig`]
//! 4. Install the link in a static [`InterruptSlot`] and call
//!    [`InterruptSlot::dispatch`] from the DIO0 rising edge handler
//! 5. Send with [`LoraLink::send_packet`], read with [`LoraLink::read_packet`]
//!
//! # Important Notes
//! - Configuration must be done in sleep or standby mode
//! - Only one transmission may be in flight at a time
//! - The interrupt path never logs or delays; faults it meets are recorded and read
//!   back with [`Sx127x::last_error`]
//! - Interrupt-driven and polled completion must not be mixed on one radio
//!
//! # Example
//! ```no_run
//! use embedded_hal::{delay::DelayNs, spi::SpiDevice};
//! use sx127x::{Error, RadioConfig, Sx127x};
//!
//! fn send<SPI: SpiDevice, D: DelayNs>(spi: SPI, delay: D) -> Result<(), Error> {
//!     let mut radio = Sx127x::new(spi, delay);
//!     radio.init(&RadioConfig::default())?;
//!
//!     radio.begin_packet(false)?;
//!     radio.write_fifo(b"hello")?;
//!     radio.end_packet()?;
//!     while !radio.is_tx_done()? {}
//!
//!     Ok(())
//! }
//! ```

pub use regiface::errors::Error as RegisterError;

pub mod device;
pub mod dispatch;
pub mod link;
pub mod lock;
pub mod packet;
pub mod radio;
pub mod registers;
pub mod switch;

#[cfg(test)]
mod mock;

pub use device::Device;
pub use dispatch::{InterruptHandler, InterruptSlot};
pub use link::{Inbox, LoraLink};
pub use lock::IrqFlagLock;
pub use packet::{LoraPacket, PacketHeader};
pub use radio::{
    hardware_reset, Error, LoraReceiver, NoReceiver, PaOutput, RadioConfig, RadioFault,
    RadioMode, SignalQuality, Sx127x,
};
pub use registers::Chip;
pub use switch::{DirectionPins, NoRfSwitch, RfSwitch};
