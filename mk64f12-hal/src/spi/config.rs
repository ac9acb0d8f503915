use muldiv::MulDiv;

use crate::power::Clocks;
use crate::time::{Hertz, NanosDuration};

use super::{Ctar, Error};

/// Choices for clock phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPhase {
    /// Data is captured on the leading SCK edge and changed on the
    /// following edge (CPHA = 0).
    CaptureOnLeadingEdge,
    /// Data is changed on the leading SCK edge and captured on the
    /// following edge (CPHA = 1).
    ChangeOnLeadingEdge,
}

/// Choices for clock polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockPolarity {
    /// SCK idles low (CPOL = 0).
    InactiveLow,
    /// SCK idles high (CPOL = 1).
    InactiveHigh,
}

/// Choices for bit order.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferOrder {
    /// Least significant bit is shifted first.
    LSBFirst,
    /// Most significant bit is shifted first.
    MSBFirst,
}

/// An SPI mode describing clock polarity and phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Mode {
    pub polarity: ClockPolarity,
    pub phase: ClockPhase,
}

impl Mode {
    /// SPI mode 0: CPOL = 0, CPHA = 0.
    pub const MODE_0: Self = Self {
        polarity: ClockPolarity::InactiveLow,
        phase: ClockPhase::CaptureOnLeadingEdge,
    };

    /// SPI mode 1: CPOL = 0, CPHA = 1.
    pub const MODE_1: Self = Self {
        polarity: ClockPolarity::InactiveLow,
        phase: ClockPhase::ChangeOnLeadingEdge,
    };

    /// SPI mode 2: CPOL = 1, CPHA = 0.
    pub const MODE_2: Self = Self {
        polarity: ClockPolarity::InactiveHigh,
        phase: ClockPhase::CaptureOnLeadingEdge,
    };

    /// SPI mode 3: CPOL = 1, CPHA = 1.
    pub const MODE_3: Self = Self {
        polarity: ClockPolarity::InactiveHigh,
        phase: ClockPhase::ChangeOnLeadingEdge,
    };
}

impl From<embedded_hal_1::spi::Mode> for Mode {
    #[inline(always)]
    fn from(value: embedded_hal_1::spi::Mode) -> Self {
        use embedded_hal_1::spi::{Phase, Polarity};
        Self {
            polarity: match value.polarity {
                Polarity::IdleLow => ClockPolarity::InactiveLow,
                Polarity::IdleHigh => ClockPolarity::InactiveHigh,
            },
            phase: match value.phase {
                Phase::CaptureOnFirstTransition => ClockPhase::CaptureOnLeadingEdge,
                Phase::CaptureOnSecondTransition => ClockPhase::ChangeOnLeadingEdge,
            },
        }
    }
}

impl From<embedded_hal_02::spi::Mode> for Mode {
    #[inline(always)]
    fn from(value: embedded_hal_02::spi::Mode) -> Self {
        use embedded_hal_02::spi::{Phase, Polarity};
        Self {
            polarity: match value.polarity {
                Polarity::IdleLow => ClockPolarity::InactiveLow,
                Polarity::IdleHigh => ClockPolarity::InactiveHigh,
            },
            phase: match value.phase {
                Phase::CaptureOnFirstTransition => ClockPhase::CaptureOnLeadingEdge,
                Phase::CaptureOnSecondTransition => ClockPhase::ChangeOnLeadingEdge,
            },
        }
    }
}

/// Baud rate prescaler divisors, by CTAR.PBR.
const BAUD_RATE_PRESCALERS: [u32; 4] = [2, 3, 5, 7];

/// Delay prescaler multipliers, by CTAR.PCSSCK, PASC and PDT.
const DELAY_PRESCALERS: [u32; 4] = [1, 3, 5, 7];

/// Baud rate scaler divisor for CTAR.BR.
#[inline(always)]
const fn baud_rate_scaler(index: u8) -> u32 {
    if index < 4 {
        2 * (index as u32 + 1)
    } else {
        1 << index
    }
}

/// Delay scaler multiplier for CTAR.CSSCK, ASC and DT.
#[inline(always)]
const fn delay_scaler(index: u8) -> u32 {
    1 << (index + 1)
}

/// Longest delay any prescaler / scaler pair can produce, in bus cycles.
const MAX_DELAY_CYCLES: u32 = 7 * (1 << 16);

/// Find the shortest (prescaler, scaler) pair lasting at least `cycles`.
fn delay_indices(cycles: u32) -> Option<(u8, u8)> {
    let mut best: Option<(u32, u8, u8)> = None;
    for pre in 0..4u8 {
        for scale in 0..16u8 {
            let total = DELAY_PRESCALERS[pre as usize] * delay_scaler(scale);
            if total < cycles {
                continue;
            }
            if best.map_or(true, |(b, _, _)| total < b) {
                best = Some((total, pre, scale));
            }
        }
    }
    best.map(|(_, pre, scale)| (pre, scale))
}

/// Clock, framing and timing attributes for an SPI master.
///
/// This is a plain value. Setters check their argument and leave the
/// configuration untouched when they return an error. Nothing reaches
/// the hardware until the next transfer starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    bus_clock: Hertz,
    polarity: ClockPolarity,
    phase: ClockPhase,
    order: TransferOrder,
    frame_size: u8,
    baud_rate_prescaler: u8,
    baud_rate_scaler: u8,
    double_baud_rate: bool,
    pcs_to_sck_delay_prescaler: u8,
    pcs_to_sck_delay_scaler: u8,
    after_sck_delay_prescaler: u8,
    after_sck_delay_scaler: u8,
    after_transfer_delay_prescaler: u8,
    after_transfer_delay_scaler: u8,
    timeout: u32,
}

impl Default for Config {
    #[inline(always)]
    fn default() -> Self {
        Self::new(&Clocks::default())
    }
}

impl Config {
    /// Fastest SCK the DSPI supports in master mode.
    pub const MAX_FREQUENCY: Hertz = Hertz::from_raw(25_000_000);

    /// Supported frame sizes, in bits.
    pub const FRAME_SIZES: core::ops::RangeInclusive<u8> = 4..=16;

    /// Status polls without progress before a transfer gives up.
    pub const DEFAULT_TIMEOUT: u32 = 1_000_000;

    /// The power-on configuration for a DSPI clocked from `clocks`.
    ///
    /// 8-bit frames, MSB first, SPI mode 0, the slowest baud rate, and
    /// the shortest delays.
    #[inline(always)]
    pub fn new(clocks: &Clocks) -> Self {
        Self::for_bus(clocks.bus_clk())
    }

    #[inline(always)]
    pub(super) fn for_bus(bus_clock: Hertz) -> Self {
        Self {
            bus_clock,
            polarity: ClockPolarity::InactiveLow,
            phase: ClockPhase::CaptureOnLeadingEdge,
            order: TransferOrder::MSBFirst,
            frame_size: 8,
            baud_rate_prescaler: 0,
            baud_rate_scaler: 15,
            double_baud_rate: false,
            pcs_to_sck_delay_prescaler: 0,
            pcs_to_sck_delay_scaler: 0,
            after_sck_delay_prescaler: 0,
            after_sck_delay_scaler: 0,
            after_transfer_delay_prescaler: 0,
            after_transfer_delay_scaler: 0,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Apply `f` to a copy, and keep it only if `f` and the baud rate
    /// check both pass.
    #[inline(always)]
    fn update(&mut self, f: impl FnOnce(&mut Self) -> Result<(), Error>) -> Result<(), Error> {
        let mut next = *self;
        f(&mut next)?;
        if next.sck_ceil() > next.get_max_frequency().raw() {
            warn!("spi: rejected config, SCK above {} Hz", next.get_max_frequency().raw());
            return Err(Error::InvalidConfig);
        }
        *self = next;
        Ok(())
    }

    /// SCK rounded up, for comparing against the ceiling.
    #[inline(always)]
    fn sck_ceil(&self) -> u32 {
        let div = BAUD_RATE_PRESCALERS[self.baud_rate_prescaler as usize]
            * baud_rate_scaler(self.baud_rate_scaler);
        self.bus_clock
            .raw()
            .mul_div_ceil(1 + self.double_baud_rate as u32, div)
            // the divisor is at least 4
            .unwrap_or(u32::MAX)
    }

    /// Convert bus cycles to nanoseconds, rounding up.
    #[inline(always)]
    fn cycles_to_ns(&self, cycles: u32) -> NanosDuration {
        let ns = match self.bus_clock.raw() {
            0 => u32::MAX,
            bus => cycles.mul_div_ceil(1_000_000_000, bus).unwrap_or(u32::MAX),
        };
        NanosDuration::from_ticks(ns)
    }

    /// Convert nanoseconds to bus cycles, rounding up.
    #[inline(always)]
    fn ns_to_cycles(&self, delay: NanosDuration) -> Option<u32> {
        delay
            .ticks()
            .mul_div_ceil(self.bus_clock.raw(), 1_000_000_000)
    }

    /// Set the bus clock frequency feeding the DSPI.
    ///
    /// Fails if the current baud rate settings would exceed the new
    /// ceiling.
    #[inline(always)]
    pub fn set_bus_clock(&mut self, clocks: &Clocks) -> Result<(), Error> {
        self.update(|c| {
            c.bus_clock = clocks.bus_clk();
            Ok(())
        })
    }

    /// Get the bus clock frequency feeding the DSPI.
    #[inline(always)]
    pub fn get_bus_clock(&self) -> Hertz {
        self.bus_clock
    }

    /// Set the clock phase.
    #[inline(always)]
    pub fn set_clock_phase(&mut self, phase: ClockPhase) {
        self.phase = phase;
    }

    /// Get the clock phase.
    #[inline(always)]
    pub fn get_clock_phase(&self) -> ClockPhase {
        self.phase
    }

    /// Set the clock polarity.
    #[inline(always)]
    pub fn set_clock_polarity(&mut self, polarity: ClockPolarity) {
        self.polarity = polarity;
    }

    /// Get the clock polarity.
    #[inline(always)]
    pub fn get_clock_polarity(&self) -> ClockPolarity {
        self.polarity
    }

    /// Set the mode.
    #[inline(always)]
    pub fn set_mode(&mut self, mode: impl Into<Mode>) {
        let mode = mode.into();
        self.set_clock_polarity(mode.polarity);
        self.set_clock_phase(mode.phase);
    }

    /// Get the mode.
    #[inline(always)]
    pub fn get_mode(&self) -> Mode {
        Mode {
            polarity: self.polarity,
            phase: self.phase,
        }
    }

    /// Set the bit order.
    #[inline(always)]
    pub fn set_transfer_order(&mut self, order: TransferOrder) {
        self.order = order;
    }

    /// Get the bit order.
    #[inline(always)]
    pub fn get_transfer_order(&self) -> TransferOrder {
        self.order
    }

    /// Set the frame size in bits, from 4 to 16.
    #[inline(always)]
    pub fn set_frame_size(&mut self, bits: u8) -> Result<(), Error> {
        if !Self::FRAME_SIZES.contains(&bits) {
            return Err(Error::InvalidConfig);
        }
        self.frame_size = bits;
        Ok(())
    }

    /// Get the frame size in bits.
    #[inline(always)]
    pub fn get_frame_size(&self) -> u8 {
        self.frame_size
    }

    /// Set the baud rate prescaler index, 0 to 3, dividing by 2, 3, 5
    /// or 7.
    #[inline(always)]
    pub fn set_baud_rate_prescaler(&mut self, index: u8) -> Result<(), Error> {
        self.update(|c| {
            if index > 3 {
                return Err(Error::InvalidConfig);
            }
            c.baud_rate_prescaler = index;
            Ok(())
        })
    }

    /// Get the baud rate prescaler index.
    #[inline(always)]
    pub fn get_baud_rate_prescaler(&self) -> u8 {
        self.baud_rate_prescaler
    }

    /// Set the baud rate scaler index, 0 to 15.
    ///
    /// Indices 0 to 3 divide by 2, 4, 6 and 8. From 4 up, index `n`
    /// divides by 2<sup>n</sup>.
    #[inline(always)]
    pub fn set_baud_rate_scaler(&mut self, index: u8) -> Result<(), Error> {
        self.update(|c| {
            if index > 15 {
                return Err(Error::InvalidConfig);
            }
            c.baud_rate_scaler = index;
            Ok(())
        })
    }

    /// Get the baud rate scaler index.
    #[inline(always)]
    pub fn get_baud_rate_scaler(&self) -> u8 {
        self.baud_rate_scaler
    }

    /// Double the baud rate.
    #[inline(always)]
    pub fn set_double_baud_rate(&mut self, double: bool) -> Result<(), Error> {
        self.update(|c| {
            c.double_baud_rate = double;
            Ok(())
        })
    }

    /// Is the baud rate doubled?
    #[inline(always)]
    pub fn get_double_baud_rate(&self) -> bool {
        self.double_baud_rate
    }

    /// The fastest SCK allowed with this bus clock.
    #[inline(always)]
    pub fn get_max_frequency(&self) -> Hertz {
        let half_bus = Hertz::from_raw(self.bus_clock.raw() / 2);
        if half_bus < Self::MAX_FREQUENCY {
            half_bus
        } else {
            Self::MAX_FREQUENCY
        }
    }

    /// The SCK frequency these settings produce, rounded down.
    #[inline(always)]
    pub fn get_frequency(&self) -> Hertz {
        let div = BAUD_RATE_PRESCALERS[self.baud_rate_prescaler as usize]
            * baud_rate_scaler(self.baud_rate_scaler);
        let hz = self
            .bus_clock
            .raw()
            .mul_div_floor(1 + self.double_baud_rate as u32, div)
            .unwrap_or(u32::MAX);
        Hertz::from_raw(hz)
    }

    /// Pick the fastest baud rate settings not above `freq`.
    ///
    /// Fails if even the slowest setting is too fast.
    pub fn set_frequency(&mut self, freq: Hertz) -> Result<(), Error> {
        let limit = core::cmp::min(freq.raw(), self.get_max_frequency().raw()) as u64;
        let bus = self.bus_clock.raw() as u64;

        let mut best: Option<(u64, u8, u8, bool)> = None;
        for dbr in [false, true] {
            for pbr in 0..4u8 {
                for br in 0..16u8 {
                    let div = (BAUD_RATE_PRESCALERS[pbr as usize] * baud_rate_scaler(br)) as u64;
                    let num = bus * (1 + dbr as u64);
                    // exact: num / div <= limit
                    if num > limit * div {
                        continue;
                    }
                    let hz = num / div;
                    if best.map_or(true, |(b, _, _, _)| hz > b) {
                        best = Some((hz, pbr, br, dbr));
                    }
                }
            }
        }

        let (_, pbr, br, dbr) = best.ok_or(Error::InvalidConfig)?;
        self.update(|c| {
            c.baud_rate_prescaler = pbr;
            c.baud_rate_scaler = br;
            c.double_baud_rate = dbr;
            Ok(())
        })
    }

    /// Set the PCS to SCK delay prescaler index, 0 to 3, multiplying by
    /// 1, 3, 5 or 7.
    #[inline(always)]
    pub fn set_pcs_to_sck_delay_prescaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 3 {
            return Err(Error::InvalidConfig);
        }
        self.pcs_to_sck_delay_prescaler = index;
        Ok(())
    }

    /// Get the PCS to SCK delay prescaler index.
    #[inline(always)]
    pub fn get_pcs_to_sck_delay_prescaler(&self) -> u8 {
        self.pcs_to_sck_delay_prescaler
    }

    /// Set the PCS to SCK delay scaler index, 0 to 15, for
    /// 2<sup>n+1</sup> cycles.
    #[doc(alias = "set_psc_to_sck_delay_scaler")]
    #[inline(always)]
    pub fn set_pcs_to_sck_delay_scaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 15 {
            return Err(Error::InvalidConfig);
        }
        self.pcs_to_sck_delay_scaler = index;
        Ok(())
    }

    /// Get the PCS to SCK delay scaler index.
    #[inline(always)]
    pub fn get_pcs_to_sck_delay_scaler(&self) -> u8 {
        self.pcs_to_sck_delay_scaler
    }

    /// Set the after SCK delay prescaler index, 0 to 3, multiplying by
    /// 1, 3, 5 or 7.
    #[inline(always)]
    pub fn set_after_sck_delay_prescaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 3 {
            return Err(Error::InvalidConfig);
        }
        self.after_sck_delay_prescaler = index;
        Ok(())
    }

    /// Get the after SCK delay prescaler index.
    #[inline(always)]
    pub fn get_after_sck_delay_prescaler(&self) -> u8 {
        self.after_sck_delay_prescaler
    }

    /// Set the after SCK delay scaler index, 0 to 15, for
    /// 2<sup>n+1</sup> cycles.
    #[inline(always)]
    pub fn set_after_sck_delay_scaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 15 {
            return Err(Error::InvalidConfig);
        }
        self.after_sck_delay_scaler = index;
        Ok(())
    }

    /// Get the after SCK delay scaler index.
    #[inline(always)]
    pub fn get_after_sck_delay_scaler(&self) -> u8 {
        self.after_sck_delay_scaler
    }

    /// Set the delay after transfer prescaler index, 0 to 3,
    /// multiplying by 1, 3, 5 or 7.
    #[doc(alias = "set_after_transfer_prescaler")]
    #[inline(always)]
    pub fn set_after_transfer_delay_prescaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 3 {
            return Err(Error::InvalidConfig);
        }
        self.after_transfer_delay_prescaler = index;
        Ok(())
    }

    /// Get the delay after transfer prescaler index.
    #[inline(always)]
    pub fn get_after_transfer_delay_prescaler(&self) -> u8 {
        self.after_transfer_delay_prescaler
    }

    /// Set the delay after transfer scaler index, 0 to 15, for
    /// 2<sup>n+1</sup> cycles.
    #[inline(always)]
    pub fn set_after_transfer_delay_scaler(&mut self, index: u8) -> Result<(), Error> {
        if index > 15 {
            return Err(Error::InvalidConfig);
        }
        self.after_transfer_delay_scaler = index;
        Ok(())
    }

    /// Get the delay after transfer scaler index.
    #[inline(always)]
    pub fn get_after_transfer_delay_scaler(&self) -> u8 {
        self.after_transfer_delay_scaler
    }

    /// Delay between PCS assertion and the first SCK edge.
    #[inline(always)]
    pub fn get_pcs_to_sck_delay(&self) -> NanosDuration {
        self.cycles_to_ns(
            DELAY_PRESCALERS[self.pcs_to_sck_delay_prescaler as usize]
                * delay_scaler(self.pcs_to_sck_delay_scaler),
        )
    }

    /// Delay between the last SCK edge and PCS negation.
    #[inline(always)]
    pub fn get_after_sck_delay(&self) -> NanosDuration {
        self.cycles_to_ns(
            DELAY_PRESCALERS[self.after_sck_delay_prescaler as usize]
                * delay_scaler(self.after_sck_delay_scaler),
        )
    }

    /// Delay between PCS negation and the next assertion.
    #[inline(always)]
    pub fn get_after_transfer_delay(&self) -> NanosDuration {
        self.cycles_to_ns(
            DELAY_PRESCALERS[self.after_transfer_delay_prescaler as usize]
                * delay_scaler(self.after_transfer_delay_scaler),
        )
    }

    /// Pick the shortest delay settings lasting at least `delay`.
    fn delay_for(&self, delay: NanosDuration) -> Result<(u8, u8), Error> {
        let cycles = self.ns_to_cycles(delay).ok_or(Error::InvalidConfig)?;
        if cycles > MAX_DELAY_CYCLES {
            return Err(Error::InvalidConfig);
        }
        delay_indices(cycles).ok_or(Error::InvalidConfig)
    }

    /// Set the PCS to SCK delay to at least `delay`.
    #[inline]
    pub fn set_pcs_to_sck_delay(&mut self, delay: NanosDuration) -> Result<(), Error> {
        let (pre, scale) = self.delay_for(delay)?;
        self.pcs_to_sck_delay_prescaler = pre;
        self.pcs_to_sck_delay_scaler = scale;
        Ok(())
    }

    /// Set the after SCK delay to at least `delay`.
    #[inline]
    pub fn set_after_sck_delay(&mut self, delay: NanosDuration) -> Result<(), Error> {
        let (pre, scale) = self.delay_for(delay)?;
        self.after_sck_delay_prescaler = pre;
        self.after_sck_delay_scaler = scale;
        Ok(())
    }

    /// Set the delay after transfer to at least `delay`.
    #[inline]
    pub fn set_after_transfer_delay(&mut self, delay: NanosDuration) -> Result<(), Error> {
        let (pre, scale) = self.delay_for(delay)?;
        self.after_transfer_delay_prescaler = pre;
        self.after_transfer_delay_scaler = scale;
        Ok(())
    }

    /// Set how many status polls without progress a blocking transfer
    /// waits before failing with [Error::Timeout]. Zero is not allowed.
    #[inline(always)]
    pub fn set_timeout(&mut self, polls: u32) -> Result<(), Error> {
        if polls == 0 {
            return Err(Error::InvalidConfig);
        }
        self.timeout = polls;
        Ok(())
    }

    /// Get the transfer timeout, in status polls.
    #[inline(always)]
    pub fn get_timeout(&self) -> u32 {
        self.timeout
    }

    /// The CTAR value for these settings.
    #[inline(always)]
    pub fn to_ctar(&self) -> Ctar {
        Ctar::new()
            .with_dbr(self.double_baud_rate)
            .with_fmsz(self.frame_size - 1)
            .with_cpol(self.polarity == ClockPolarity::InactiveHigh)
            .with_cpha(self.phase == ClockPhase::ChangeOnLeadingEdge)
            .with_lsbfe(self.order == TransferOrder::LSBFirst)
            .with_pcssck(self.pcs_to_sck_delay_prescaler)
            .with_pasc(self.after_sck_delay_prescaler)
            .with_pdt(self.after_transfer_delay_prescaler)
            .with_pbr(self.baud_rate_prescaler)
            .with_cssck(self.pcs_to_sck_delay_scaler)
            .with_asc(self.after_sck_delay_scaler)
            .with_dt(self.after_transfer_delay_scaler)
            .with_br(self.baud_rate_scaler)
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use crate::time::RateExtU32;

    fn clocks(bus: u32) -> Clocks {
        Clocks::new(bus.Hz(), bus.Hz())
    }

    /// An index that is sometimes out of range.
    #[derive(Debug, Clone, Copy)]
    struct Index(u8);

    impl Arbitrary for Index {
        fn arbitrary(g: &mut Gen) -> Self {
            Self(u8::arbitrary(g) % 20)
        }
    }

    /// A plausible bus clock, 1 to 60 MHz.
    #[derive(Debug, Clone, Copy)]
    struct Bus(u32);

    impl Arbitrary for Bus {
        fn arbitrary(g: &mut Gen) -> Self {
            Self(1_000_000 + u32::arbitrary(g) % 59_000_001)
        }
    }

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(crate::power::RESET_CLOCK, c.get_bus_clock());
        assert_eq!(8, c.get_frame_size());
        assert_eq!(ClockPolarity::InactiveLow, c.get_clock_polarity());
        assert_eq!(ClockPhase::CaptureOnLeadingEdge, c.get_clock_phase());
        assert_eq!(TransferOrder::MSBFirst, c.get_transfer_order());
        assert_eq!(0, c.get_baud_rate_prescaler());
        assert_eq!(15, c.get_baud_rate_scaler());
        assert!(!c.get_double_baud_rate());
        assert_eq!(Config::DEFAULT_TIMEOUT, c.get_timeout());

        // 20.97152 MHz / 2 / 32768
        assert_eq!(320, c.get_frequency().raw());

        let ctar = c.to_ctar();
        assert_eq!(7, ctar.fmsz());
        assert_eq!(15, ctar.br());
        assert_eq!(0x3800_000f, ctar.into_bits());
    }

    #[test]
    fn scalers() {
        let br: [u32; 16] = core::array::from_fn(|i| baud_rate_scaler(i as u8));
        assert_eq!(
            [2, 4, 6, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096, 8192, 16384, 32768],
            br
        );
        assert_eq!(2, delay_scaler(0));
        assert_eq!(65536, delay_scaler(15));
        assert_eq!(MAX_DELAY_CYCLES, DELAY_PRESCALERS[3] * delay_scaler(15));
    }

    #[test]
    fn mode() {
        let mut c = Config::default();
        c.set_mode(Mode::MODE_3);
        assert_eq!(Mode::MODE_3, c.get_mode());
        assert!(c.to_ctar().cpol());
        assert!(c.to_ctar().cpha());

        c.set_mode(embedded_hal_1::spi::MODE_1);
        assert_eq!(Mode::MODE_1, c.get_mode());
        c.set_mode(embedded_hal_02::spi::MODE_2);
        assert_eq!(Mode::MODE_2, c.get_mode());
    }

    #[test]
    fn transfer_order() {
        let mut c = Config::default();
        c.set_transfer_order(TransferOrder::LSBFirst);
        assert_eq!(TransferOrder::LSBFirst, c.get_transfer_order());
        assert!(c.to_ctar().lsbfe());
    }

    #[test]
    fn frame_size_bounds() {
        let mut c = Config::default();
        assert_eq!(Err(Error::InvalidConfig), c.set_frame_size(3));
        assert_eq!(Err(Error::InvalidConfig), c.set_frame_size(17));
        assert_eq!(8, c.get_frame_size());
        for bits in 4..=16 {
            assert_eq!(Ok(()), c.set_frame_size(bits));
            assert_eq!(bits, c.get_frame_size());
            assert_eq!(bits - 1, c.to_ctar().fmsz());
        }
    }

    #[test]
    fn after_sck_delay_prescaler_out_of_range() {
        let mut c = Config::default();
        c.set_after_sck_delay_prescaler(2).unwrap();
        let before = c;
        assert_eq!(Err(Error::InvalidConfig), c.set_after_sck_delay_prescaler(4));
        assert_eq!(before, c);
        assert_eq!(2, c.get_after_sck_delay_prescaler());
    }

    #[test]
    fn baud_rate_ceiling() {
        // 60 MHz bus: /2 * 2 would be 60 MHz, well over 25 MHz
        let mut c = Config::new(&clocks(60_000_000));
        c.set_baud_rate_scaler(0).unwrap();
        assert_eq!(15_000_000, c.get_frequency().raw());
        assert_eq!(Err(Error::InvalidConfig), c.set_double_baud_rate(true));
        assert!(!c.get_double_baud_rate());

        // 20.97 MHz bus: ceiling is half the bus
        let mut c = Config::default();
        c.set_baud_rate_scaler(0).unwrap();
        assert_eq!(Ok(()), c.set_double_baud_rate(true));
        assert_eq!(c.get_max_frequency(), c.get_frequency());
    }

    #[test]
    fn frequency() {
        let mut c = Config::new(&clocks(60_000_000));
        c.set_frequency(1_000_000.Hz()).unwrap();
        assert!(c.get_frequency().raw() <= 1_000_000);
        // the closest divisor is 2 * 32
        assert_eq!(937_500, c.get_frequency().raw());

        // capped at 25 MHz, and 60 MHz * 2 / 3 / 2 is the closest
        c.set_frequency(100_000_000.Hz()).unwrap();
        assert_eq!(20_000_000, c.get_frequency().raw());
        assert!(c.get_double_baud_rate());

        let before = c;
        assert_eq!(Err(Error::InvalidConfig), c.set_frequency(100.Hz()));
        assert_eq!(before, c);
    }

    #[test]
    fn delays() {
        let mut c = Config::new(&clocks(50_000_000));
        // 20ns per cycle, shortest is 2 cycles
        assert_eq!(40, c.get_pcs_to_sck_delay().ticks());

        c.set_pcs_to_sck_delay(NanosDuration::from_ticks(1_000)).unwrap();
        // 50 cycles needed, 7 * 8 is the closest pair
        assert_eq!(3, c.get_pcs_to_sck_delay_prescaler());
        assert_eq!(2, c.get_pcs_to_sck_delay_scaler());
        assert_eq!(1_120, c.get_pcs_to_sck_delay().ticks());

        c.set_after_sck_delay(NanosDuration::from_ticks(0)).unwrap();
        assert_eq!(0, c.get_after_sck_delay_prescaler());
        assert_eq!(0, c.get_after_sck_delay_scaler());

        let before = c;
        assert_eq!(
            Err(Error::InvalidConfig),
            c.set_after_transfer_delay(NanosDuration::from_ticks(20_000_000))
        );
        assert_eq!(before, c);
    }

    #[test]
    fn timeout() {
        let mut c = Config::default();
        assert_eq!(Err(Error::InvalidConfig), c.set_timeout(0));
        c.set_timeout(10).unwrap();
        assert_eq!(10, c.get_timeout());
    }

    #[quickcheck]
    fn max_scalers_never_exceed_ceiling(bus: Bus, dbr: bool) -> bool {
        let mut c = Config::new(&clocks(bus.0));
        let _ = c.set_double_baud_rate(dbr);
        let _ = c.set_baud_rate_prescaler(3);
        let _ = c.set_baud_rate_scaler(15);
        c.get_frequency() <= c.get_max_frequency()
    }

    #[quickcheck]
    fn baud_setters_hold_ceiling(bus: Bus, pbr: Index, br: Index, dbr: bool) -> bool {
        let mut c = Config::new(&clocks(bus.0));
        let _ = c.set_baud_rate_scaler(br.0);
        let _ = c.set_baud_rate_prescaler(pbr.0);
        let _ = c.set_double_baud_rate(dbr);
        c.get_frequency() <= c.get_max_frequency()
    }

    #[quickcheck]
    fn set_frequency_not_above_request(bus: Bus, freq: u32) -> bool {
        let mut c = Config::new(&clocks(bus.0));
        match c.set_frequency(freq.Hz()) {
            Ok(()) => c.get_frequency().raw() <= freq && c.get_frequency() <= c.get_max_frequency(),
            Err(_) => c == Config::new(&clocks(bus.0)),
        }
    }

    type Setter = fn(&mut Config, u8) -> Result<(), Error>;
    type Getter = fn(&Config) -> u8;

    const INDEXED: [(Setter, Getter); 8] = [
        (Config::set_baud_rate_prescaler, Config::get_baud_rate_prescaler),
        (Config::set_baud_rate_scaler, Config::get_baud_rate_scaler),
        (Config::set_pcs_to_sck_delay_prescaler, Config::get_pcs_to_sck_delay_prescaler),
        (Config::set_pcs_to_sck_delay_scaler, Config::get_pcs_to_sck_delay_scaler),
        (Config::set_after_sck_delay_prescaler, Config::get_after_sck_delay_prescaler),
        (Config::set_after_sck_delay_scaler, Config::get_after_sck_delay_scaler),
        (Config::set_after_transfer_delay_prescaler, Config::get_after_transfer_delay_prescaler),
        (Config::set_after_transfer_delay_scaler, Config::get_after_transfer_delay_scaler),
    ];

    #[quickcheck]
    fn setters_round_trip(bus: Bus, values: Vec<(u8, Index)>) -> bool {
        // each setter either takes the value, or changes nothing
        let mut c = Config::new(&clocks(bus.0));
        values.into_iter().all(|(which, value)| {
            let (set, get) = INDEXED[which as usize % INDEXED.len()];
            let before = c;
            match set(&mut c, value.0) {
                Ok(()) => get(&c) == value.0,
                Err(e) => e == Error::InvalidConfig && c == before,
            }
        })
    }

    #[quickcheck]
    fn out_of_range_prescaler_changes_nothing(index: Index) -> bool {
        let mut c = Config::default();
        let before = c;
        match c.set_after_sck_delay_prescaler(index.0) {
            Ok(()) => index.0 <= 3 && c.get_after_sck_delay_prescaler() == index.0,
            Err(e) => index.0 > 3 && e == Error::InvalidConfig && c == before,
        }
    }
}
