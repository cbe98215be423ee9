//! RF direction control
//!
//! Some boards (mostly SX1272 designs) route the antenna through an external switch
//! with separate receive and transmit enables. The radio flips it before entering
//! receive and before staging a transmit.

use embedded_hal::digital::OutputPin;

use crate::Error;

/// Antenna switch driven by the radio.
pub trait RfSwitch {
    /// Connects the antenna to the receive chain.
    fn set_receive(&mut self) -> Result<(), Error>;

    /// Connects the antenna to the transmit chain.
    fn set_transmit(&mut self) -> Result<(), Error>;
}

/// No external switch fitted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRfSwitch;

impl RfSwitch for NoRfSwitch {
    fn set_receive(&mut self) -> Result<(), Error> {
        Ok(())
    }

    fn set_transmit(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

/// Switch with one enable pin per direction, active high.
///
/// The inactive side is always released before the active side is driven.
pub struct DirectionPins<RX, TX> {
    rx: RX,
    tx: TX,
}

impl<RX, TX> DirectionPins<RX, TX>
where
    RX: OutputPin,
    TX: OutputPin,
{
    /// Takes both pins and parks the switch with both sides off.
    pub fn new(mut rx: RX, mut tx: TX) -> Result<Self, Error> {
        rx.set_low().map_err(|_| Error::Pin)?;
        tx.set_low().map_err(|_| Error::Pin)?;
        Ok(Self { rx, tx })
    }

    /// Returns the pins.
    pub fn release(self) -> (RX, TX) {
        (self.rx, self.tx)
    }
}

impl<RX, TX> RfSwitch for DirectionPins<RX, TX>
where
    RX: OutputPin,
    TX: OutputPin,
{
    fn set_receive(&mut self) -> Result<(), Error> {
        self.tx.set_low().map_err(|_| Error::Pin)?;
        self.rx.set_high().map_err(|_| Error::Pin)
    }

    fn set_transmit(&mut self) -> Result<(), Error> {
        self.rx.set_low().map_err(|_| Error::Pin)?;
        self.tx.set_high().map_err(|_| Error::Pin)
    }
}
