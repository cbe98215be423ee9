//! Error types for the SX127x driver.
//!
//! Two kinds of failure are kept apart:
//! - [`Error`] is returned by mainline calls and always reaches the caller
//! - [`RadioFault`] is recorded by the interrupt path and by refused calls, and is only
//!   visible through [`Sx127x::last_error`](crate::Sx127x::last_error)

use core::fmt;

use regiface::errors::Error as RegisterError;

/// Errors returned by the radio and link operations.
#[derive(Debug)]
pub enum Error {
    /// A register transaction failed on the bus.
    Register(RegisterError),
    /// The version register did not identify a supported chip.
    ///
    /// Reported by `init`; the radio is left untouched and the caller decides whether
    /// to retry or give up.
    UnsupportedVersion(u8),
    /// `begin_packet` was called before the previous transmit completed.
    TransmitInFlight,
    /// The interrupt flags lock stayed held for the whole retry budget.
    LockTimeout,
    /// A control pin (reset or RF switch) could not be driven.
    Pin,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(err) => write!(f, "register access failed: {err:?}"),
            Self::UnsupportedVersion(version) => {
                write!(f, "detected incorrect version: {version:#04x}")
            }
            Self::TransmitInFlight => f.write_str("a transmit is already in flight"),
            Self::LockTimeout => f.write_str("timed out waiting for the irq flags lock"),
            Self::Pin => f.write_str("control pin failure"),
        }
    }
}

impl From<RegisterError> for Error {
    fn from(err: RegisterError) -> Self {
        Error::Register(err)
    }
}

/// Advisory record of the last interrupt-path event that did not end in a callback,
/// or of a refused call.
///
/// Overwritten by the next classified event. Never returned as an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioFault {
    /// A receive interrupt fired without RxDone set.
    NotRxDone,
    /// RxDone arrived with the payload CRC error flag.
    RxCrcError,
    /// RxDone arrived with the receive timeout flag.
    RxTimeout,
    /// A packet arrived but no receiver is attached.
    NoReceiver,
    /// TxDone arrived but no receiver is attached to be told.
    TxNoCallback,
    /// A transmit interrupt fired without TxDone; carries the flags that were set.
    TxNotDone(u8),
    /// A polling call was made while a receiver is attached.
    SyncWithCallback,
    /// The interrupt path found the flags lock held and left the flags alone.
    IrqLockBusy,
    /// A bus or pin access failed inside the interrupt handler.
    Bus,
}

impl fmt::Display for RadioFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRxDone => f.write_str("not rx done"),
            Self::RxCrcError => f.write_str("rx crc error"),
            Self::RxTimeout => f.write_str("rx timeout error"),
            Self::NoReceiver => f.write_str("no receive method defined"),
            Self::TxNoCallback => f.write_str("transmit callback but no callback method"),
            Self::TxNotDone(flags) => write!(f, "transmit callback but not txdone: {flags}"),
            Self::SyncWithCallback => {
                f.write_str("polling call refused while a receive callback is attached")
            }
            Self::IrqLockBusy => f.write_str("irq flags lock busy"),
            Self::Bus => f.write_str("bus failure in interrupt handler"),
        }
    }
}
