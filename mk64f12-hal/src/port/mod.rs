//! Pin multiplexing through the PORT modules.
//!
//! Each pin is a zero-sized token carrying its port, number, and
//! multiplexer setting in its type. Split a port with
//! [porta::split] and friends, then convert pins into the types the
//! peripheral drivers ask for (see [alt]).

use core::marker::PhantomData;

use crate::pac;

pub mod alt;

/// Pin mode is whatever the reset state left it in. (type state)
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Unspecified;

/// Pin is disabled, or routed to its analog function. (type state)
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Disabled;

/// Pin is routed to the GPIO module. (type state)
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Gpio;

/// Pin is routed to alternate function `ALT`. (type state)
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alternate<const ALT: u8>;

/// A multiplexer setting a pin can be put into.
#[allow(private_bounds)]
pub trait PinMode: PinModeSealed {
    /// Value of the PCR MUX field.
    const MUX: u8;
}

trait PinModeSealed {}

impl PinModeSealed for Disabled {}
impl PinMode for Disabled {
    const MUX: u8 = 0;
}

impl PinModeSealed for Gpio {}
impl PinMode for Gpio {
    const MUX: u8 = 1;
}

impl<const ALT: u8> PinModeSealed for Alternate<ALT> {}
impl<const ALT: u8> PinMode for Alternate<ALT> {
    const MUX: u8 = {
        assert!(ALT >= 2 && ALT <= 7); // This error means an alternate function outside ALT2..ALT7
        ALT
    };
}

/// A single pin, `P{PORT}{N}`, in mode `Mode`.
pub struct Pin<const PORT: char, const N: u8, Mode> {
    _mode: PhantomData<Mode>,
}

impl<const PORT: char, const N: u8, Mode> core::fmt::Debug for Pin<PORT, N, Mode> {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "P{}{}", PORT, N)
    }
}

#[cfg(feature = "defmt")]
impl<const PORT: char, const N: u8, Mode> defmt::Format for Pin<PORT, N, Mode> {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "P{}{}", PORT, N);
    }
}

impl<const PORT: char, const N: u8, Mode> Pin<PORT, N, Mode> {
    /// safety: must be the only token for this pin
    #[inline(always)]
    pub(crate) unsafe fn steal() -> Self {
        Self {
            _mode: PhantomData,
        }
    }

    #[inline(always)]
    fn port() -> &'static pac::port::RegisterBlock {
        let ptr = match PORT {
            'A' => pac::PORTA::ptr(),
            'B' => pac::PORTB::ptr(),
            'C' => pac::PORTC::ptr(),
            'D' => pac::PORTD::ptr(),
            _ => pac::PORTE::ptr(),
        };
        // safety: fixed, valid address, and we only touch our own PCR
        unsafe { &*ptr }
    }

    /// Switch the pin multiplexer to a new mode.
    ///
    /// This has no effect on a locked pin.
    #[inline(always)]
    pub fn into_mode<M>(self) -> Pin<PORT, N, M>
    where
        M: PinMode,
    {
        // safety: the PCR belongs to this pin alone. ISF is masked so a
        // pending interrupt flag is not cleared by the write back.
        unsafe {
            Self::port().pcr(N as usize).modify(|r| {
                (r & !(pac::port::PCR_MUX_MASK | pac::port::PCR_ISF))
                    | ((M::MUX as u32) << pac::port::PCR_MUX_SHIFT)
            });
        }
        Pin {
            _mode: PhantomData,
        }
    }

    /// Route the pin to alternate function `ALT`.
    #[inline(always)]
    pub fn into_alternate<const ALT: u8>(self) -> Pin<PORT, N, Alternate<ALT>> {
        self.into_mode()
    }

    /// Route the pin to GPIO.
    #[inline(always)]
    pub fn into_gpio(self) -> Pin<PORT, N, Gpio> {
        self.into_mode()
    }

    /// Disable the pin.
    #[inline(always)]
    pub fn into_disabled(self) -> Pin<PORT, N, Disabled> {
        self.into_mode()
    }

    /// Freeze the multiplexer setting until the next reset.
    #[inline(always)]
    pub fn lock(&mut self) {
        // safety: the PCR belongs to this pin alone, ISF as above
        unsafe {
            Self::port()
                .pcr(N as usize)
                .modify(|r| (r & !pac::port::PCR_ISF) | pac::port::PCR_LK);
        }
    }

    /// Is the pin control register locked until the next reset?
    #[inline(always)]
    pub fn is_locked(&self) -> bool {
        Self::port().pcr(N as usize).read() & pac::port::PCR_LK != 0
    }
}

macro_rules! port {
    ($mod:ident, $PORT:ident, $letter:literal, $prefix:ident) => {
        port!($mod, $PORT, $letter, $prefix, [
            0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
            16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31
        ]);
    };

    ($mod:ident, $PORT:ident, $letter:literal, $prefix:ident, [$($n:literal),*]) => {
        #[doc = concat!("Helper types for port ", $letter, ".")]
        pub mod $mod {
            use super::{Pin, Unspecified};

            use crate::pac;
            use crate::power::Gate;

            paste::paste! {
                #[doc = concat!("Pins for port ", $letter, ".")]
                #[derive(Debug)]
                #[cfg_attr(feature = "defmt", derive(defmt::Format))]
                pub struct Pins {
                    /// The clock gate for this port, enabled.
                    pub gate: Gate<pac::$PORT>,
                    $(pub [<$prefix $n>]: Pin<$letter, $n, Unspecified>,)*
                }

                /// Enable the port clock and split the port into pins.
                #[inline(always)]
                pub fn split(_port: pac::$PORT, mut gate: Gate<pac::$PORT>) -> Pins {
                    gate.enable();
                    // safety: we own the port token, so these are the only pins
                    unsafe {
                        Pins {
                            gate,
                            $([<$prefix $n>]: Pin::steal(),)*
                        }
                    }
                }

                /// Recover the port registers and gate from the pins.
                #[inline(always)]
                pub fn recover(pins: Pins) -> (pac::$PORT, Gate<pac::$PORT>) {
                    // safety: we have all of the pins, and destroy them here
                    unsafe { (pac::$PORT::steal(), pins.gate) }
                }
            }
        }
    };
}

port!(porta, PORTA, 'A', pa);
port!(portb, PORTB, 'B', pb);
port!(portc, PORTC, 'C', pc);
port!(portd, PORTD, 'D', pd);
port!(porte, PORTE, 'E', pe);
