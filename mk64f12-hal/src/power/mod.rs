//! Interfaces for power and clock control.

use crate::pac;
use crate::time::Hertz;

mod gate;
pub use gate::*;

/// Core clock after reset: the FLL in FEI mode, 640 × 32.768 kHz.
pub const RESET_CLOCK: Hertz = Hertz::from_raw(20_971_520);

/// Create the power peripherals from the SIM registers.
///
/// `clocks` describes the clock tree as configured by the
/// application. Use [Clocks::reset] if the MCG was left alone.
#[inline(always)]
pub fn new(sim: pac::SIM, clocks: Clocks) -> Power {
    Power::new(sim, clocks)
}

/// The frequencies of the clocks that feed the peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Clocks {
    core: Hertz,
    bus: Hertz,
}

impl Clocks {
    /// Describe a clock tree with the given core and bus frequencies.
    #[inline(always)]
    pub const fn new(core: Hertz, bus: Hertz) -> Self {
        Self { core, bus }
    }

    /// The clock tree straight out of reset, with all output dividers at 1.
    #[inline(always)]
    pub const fn reset() -> Self {
        Self::new(RESET_CLOCK, RESET_CLOCK)
    }

    /// The core / system clock.
    #[inline(always)]
    pub fn core_clk(&self) -> Hertz {
        self.core
    }

    /// The bus clock, which drives the DSPI modules.
    #[inline(always)]
    pub fn bus_clk(&self) -> Hertz {
        self.bus
    }
}

impl Default for Clocks {
    #[inline(always)]
    fn default() -> Self {
        Self::reset()
    }
}

/// Peripherals that control power and the clock.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Power {
    pub clocks: Clocks,
    pub gates: Gates,
}

impl Power {
    /// Take ownership of the SIM clock gates.
    #[inline(always)]
    pub fn new(_sim: pac::SIM, clocks: Clocks) -> Self {
        debug!("power: core {} Hz, bus {} Hz", clocks.core.raw(), clocks.bus.raw());

        // safety: we own SIM, so nothing else touches the gate registers
        unsafe {
            Self {
                clocks,
                gates: Gates::steal(),
            }
        }
    }

    /// Recover the SIM registers.
    #[inline(always)]
    pub fn free(self) -> pac::SIM {
        // safety: all the gates are consumed with self
        unsafe { pac::SIM::steal() }
    }
}
