use crate::pac;

use crate::port::alt;
use crate::power::Device;

use super::{Ctar, Mcr, Push, Status};

/// A trait for SPI peripherals.
#[allow(private_bounds)]
#[cfg(not(feature = "defmt"))]
pub trait Instance: InstanceSealed + Device {
    type Sck: core::fmt::Debug;
    type Sout: core::fmt::Debug;
    type Sin: core::fmt::Debug;
    type Pcs0: core::fmt::Debug + ChipSelect;
}

/// A trait for SPI peripherals.
#[allow(private_bounds)]
#[cfg(feature = "defmt")]
pub trait Instance: InstanceSealed + Device {
    type Sck: core::fmt::Debug + defmt::Format;
    type Sout: core::fmt::Debug + defmt::Format;
    type Sin: core::fmt::Debug + defmt::Format;
    type Pcs0: core::fmt::Debug + defmt::Format + ChipSelect;
}

/// Typed register access for an SPI peripheral.
///
/// Writers are unsafe: the caller must own the peripheral.
pub(crate) trait InstanceSealed {
    /// Entries in each of the TX and RX FIFOs.
    const FIFO_DEPTH: u8;

    fn read_mcr(&self) -> Mcr;
    unsafe fn write_mcr(&self, mcr: Mcr);

    unsafe fn write_ctar(&self, n: usize, ctar: Ctar);

    fn read_status(&self) -> Status;
    /// Clear the write-1-to-clear flags set in `flags`.
    unsafe fn clear_status(&self, flags: Status);

    /// Push a command and data word into the TX FIFO.
    unsafe fn push(&self, cmd: Push);
    /// Pop a word from the RX FIFO.
    unsafe fn pop(&self) -> u32;
}

/// A chip select choice for a [Master](super::Master).
#[allow(private_bounds)]
pub trait ChipSelect: ChipSelectSealed {
    /// The PUSHR.PCS bits to assert.
    const MASK: u8;
}

pub(crate) trait ChipSelectSealed {}

/// No hardware chip select.
impl ChipSelectSealed for () {}
impl ChipSelect for () {
    const MASK: u8 = 0;
}

impl ChipSelectSealed for alt::spi0::Pcs0 {}
impl ChipSelect for alt::spi0::Pcs0 {
    const MASK: u8 = 1 << 0;
}

impl Instance for pac::SPI0 {
    type Sck = alt::spi0::Sck;
    type Sout = alt::spi0::Sout;
    type Sin = alt::spi0::Sin;
    type Pcs0 = alt::spi0::Pcs0;
}

impl InstanceSealed for pac::SPI0 {
    const FIFO_DEPTH: u8 = 4;

    #[inline(always)]
    fn read_mcr(&self) -> Mcr {
        Mcr::from_bits(self.mcr().read())
    }

    #[inline(always)]
    unsafe fn write_mcr(&self, mcr: Mcr) {
        self.mcr().write(mcr.into_bits())
    }

    #[inline(always)]
    unsafe fn write_ctar(&self, n: usize, ctar: Ctar) {
        self.ctar(n).write(ctar.into_bits())
    }

    #[inline(always)]
    fn read_status(&self) -> Status {
        Status::from_bits(self.sr().read())
    }

    #[inline(always)]
    unsafe fn clear_status(&self, flags: Status) {
        // w1c, so a plain write leaves the other flags alone
        self.sr().write(flags.into_bits())
    }

    #[inline(always)]
    unsafe fn push(&self, cmd: Push) {
        self.pushr().write(cmd.into_bits())
    }

    #[inline(always)]
    unsafe fn pop(&self) -> u32 {
        self.popr().read()
    }
}
