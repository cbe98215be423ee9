//! Register definitions for the SX127x radio
//! Taken from the SX1276/77/78/79 (rev. 7) and SX1272/73 (rev. 4) datasheets, LoRa mode
//! register map.
//!
//! Each register is a type carrying its 7-bit address, so the register protocol layer
//! can read and write it without a separate address table. Registers whose bit layout
//! differs between the SX1272 and SX1276 keep their raw byte and expose helpers that
//! take the detected [`Chip`].

/// Implements the one-byte `FromByteArray`/`ToByteArray` pair for registers that hold a
/// single `value` field.
macro_rules! single_byte_value {
    ($($reg:ident),*) => {
        $(
            impl FromByteArray for $reg {
                type Error = Infallible;
                type Array = [u8; 1];

                fn from_bytes(bytes: Self::Array) -> Result<Self, Self::Error> {
                    Ok(Self { value: bytes[0] })
                }
            }

            impl ToByteArray for $reg {
                type Error = Infallible;
                type Array = [u8; 1];

                fn to_bytes(self) -> Result<Self::Array, Self::Error> {
                    Ok([self.value])
                }
            }
        )*
    };
}

mod calibration;
mod fifo;
mod irq;
mod modem;
mod mode;
mod rf;

pub use calibration::*;
pub use fifo::*;
pub use irq::*;
pub use modem::*;
pub use mode::*;
pub use rf::*;

/// FIFO data register (address: 0x00)
///
/// Reading or writing it moves through the FIFO at `FifoAddrPtr`, which the chip
/// auto-increments after each byte.
pub const REG_FIFO: u8 = 0x00;

/// Total FIFO size shared by transmit and receive, in bytes.
pub const FIFO_SIZE: usize = 256;

/// Largest LoRa payload the modem will frame.
pub const MAX_PACKET_LENGTH: usize = 255;
