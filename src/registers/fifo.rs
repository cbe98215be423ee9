//! FIFO pointer and length registers
//!
//! The 256-byte FIFO is shared by transmit and receive. These registers position the
//! SPI access pointer, split the FIFO between TX and RX, and report where and how much
//! data the last received packet left behind.

use core::convert::Infallible;

use regiface::{register, FromByteArray, ReadableRegister, ToByteArray, WritableRegister};

/// FIFO SPI pointer (address: 0x0D)
///
/// Address in the FIFO of the next byte read or written through RegFifo.
/// Auto-incremented on every access.
#[register(0x0Du8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FifoAddrPtr {
    /// FIFO address
    pub value: u8,
}

/// TX base address (address: 0x0E)
///
/// Where the modem starts reading the payload when transmitting.
#[register(0x0Eu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FifoTxBaseAddr {
    /// FIFO address
    pub value: u8,
}

/// RX base address (address: 0x0F)
///
/// Where the modem starts writing received payloads.
#[register(0x0Fu8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct FifoRxBaseAddr {
    /// FIFO address
    pub value: u8,
}

/// Start address of the last packet received (address: 0x10)
///
/// Read-only.
#[register(0x10u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct FifoRxCurrentAddr {
    /// FIFO address
    pub value: u8,
}

/// Number of payload bytes of the last packet received (address: 0x13)
///
/// Read-only. Only meaningful in explicit header mode; implicit header mode uses
/// [`PayloadLength`].
#[register(0x13u8)]
#[derive(Debug, Clone, Copy, ReadableRegister)]
pub struct RxNbBytes {
    /// Byte count
    pub value: u8,
}

/// Payload length (address: 0x22)
///
/// - Transmit: number of bytes queued in the FIFO for the next packet
/// - Implicit header receive: expected payload length
///
/// A value of 0 is not permitted when transmitting.
#[register(0x22u8)]
#[derive(Debug, Clone, Copy, ReadableRegister, WritableRegister)]
pub struct PayloadLength {
    /// Length in bytes
    pub value: u8,
}

single_byte_value!(
    FifoAddrPtr,
    FifoTxBaseAddr,
    FifoRxBaseAddr,
    FifoRxCurrentAddr,
    RxNbBytes,
    PayloadLength
);
