//! Interfaces for SPI, as a bus master.
//!
//! ```ignore
//! let p = pac::Peripherals::take().unwrap();
//! let power = power::new(p.SIM, Clocks::reset());
//! let portd = port::portd::split(p.PORTD, power.gates.port_d);
//!
//! let pins = spi::Pins::new(portd.pd1, portd.pd2, portd.pd3);
//! let mut spi = spi::new(p.SPI0, power.gates.spi0, pins, &power.clocks)?;
//! spi.config_mut().set_frequency(1_000_000.Hz())?;
//!
//! let mut rx = [0u8; 4];
//! spi.transfer_blocking(&[1, 2, 3, 4], &mut rx)?;
//! ```

mod config;
pub use config::*;

mod hal02;
mod hal1;

mod instance;
pub use instance::*;

mod master;
pub use master::*;

mod registers;
pub use registers::*;

#[cfg(test)]
mod fake;

use crate::power::{Clocks, Gate};

/// Wrap an SPI peripheral into a master, without hardware chip select.
#[inline(always)]
pub fn new<Spi>(spi: Spi, gate: Gate<Spi>, pins: Pins<Spi>, clocks: &Clocks) -> Result<Master<Spi>, Error>
where
    Spi: Instance,
{
    Master::new(spi, gate, pins, clocks)
}

/// Why the peripheral reported a hardware fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    /// The module did not accept its configuration.
    NotResponding,
    /// A frame was shifted out of an empty TX FIFO.
    TxUnderflow,
    /// A frame arrived while the RX FIFO was full.
    RxOverflow,
}

/// SPI error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A setting is out of range, or not usable with the clocks.
    InvalidConfig,
    /// The peripheral flagged an error condition.
    HardwareFault(Fault),
    /// The transfer made no progress for the configured number of polls.
    Timeout,
}

impl core::fmt::Display for Error {
    #[allow(clippy::missing_inline_in_public_items)]
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "SPI Error {:?}", self)
    }
}
