//! Peripheral access for the NXP Kinetis MK64F12.
//!
//! Only the register blocks needed to bring up the DSPI modules are
//! described: system integration (clock gating), pin control, and
//! SPI0.

#![no_std]
#![allow(non_camel_case_types)]

use core::marker::PhantomData;
use core::ops::Deref;

use vcell::VolatileCell;

/// A single 32-bit memory-mapped register.
#[repr(transparent)]
pub struct Reg {
    value: VolatileCell<u32>,
}

impl Reg {
    /// Read the raw register value.
    #[inline(always)]
    pub fn read(&self) -> u32 {
        self.value.get()
    }

    /// Write a raw register value.
    ///
    /// # Safety
    /// Arbitrary bit patterns can put the peripheral into states the
    /// HAL does not expect.
    #[inline(always)]
    pub unsafe fn write(&self, value: u32) {
        self.value.set(value)
    }

    /// Read, modify and write back the register.
    ///
    /// # Safety
    /// See [Reg::write]. This is not atomic.
    #[inline(always)]
    pub unsafe fn modify(&self, f: impl FnOnce(u32) -> u32) {
        self.write(f(self.read()))
    }
}

impl core::fmt::Debug for Reg {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "Reg({:#010x})", self.read())
    }
}

/// System integration module.
pub mod sim {
    use super::Reg;

    /// SIM register block.
    #[repr(C)]
    pub struct RegisterBlock {
        sopt1: Reg,
        sopt1cfg: Reg,
        _reserved0: [u32; 0x3ff],
        sopt2: Reg,
        _reserved1: [u32; 1],
        sopt4: Reg,
        sopt5: Reg,
        _reserved2: [u32; 1],
        sopt7: Reg,
        _reserved3: [u32; 2],
        sdid: Reg,
        scgc1: Reg,
        scgc2: Reg,
        scgc3: Reg,
        scgc4: Reg,
        scgc5: Reg,
        scgc6: Reg,
        scgc7: Reg,
    }

    impl RegisterBlock {
        /// 0x1004 System options register 2.
        #[inline(always)]
        pub fn sopt2(&self) -> &Reg {
            &self.sopt2
        }

        /// 0x1024 System device identification register.
        #[inline(always)]
        pub fn sdid(&self) -> &Reg {
            &self.sdid
        }

        /// 0x1030 System clock gating control register 3.
        #[inline(always)]
        pub fn scgc3(&self) -> &Reg {
            &self.scgc3
        }

        /// 0x1034 System clock gating control register 4.
        #[inline(always)]
        pub fn scgc4(&self) -> &Reg {
            &self.scgc4
        }

        /// 0x1038 System clock gating control register 5 (ports).
        #[inline(always)]
        pub fn scgc5(&self) -> &Reg {
            &self.scgc5
        }

        /// 0x103C System clock gating control register 6 (SPI0, SPI1).
        #[inline(always)]
        pub fn scgc6(&self) -> &Reg {
            &self.scgc6
        }

        /// 0x1040 System clock gating control register 7.
        #[inline(always)]
        pub fn scgc7(&self) -> &Reg {
            &self.scgc7
        }
    }
}

/// Pin control and interrupts. Shared by all five ports.
pub mod port {
    use super::Reg;

    /// PCR multiplexer field, bits 10:8.
    pub const PCR_MUX_SHIFT: u32 = 8;
    /// PCR multiplexer field mask.
    pub const PCR_MUX_MASK: u32 = 0b111 << PCR_MUX_SHIFT;
    /// PCR lock bit. Once set, the low half of the PCR is frozen until reset.
    pub const PCR_LK: u32 = 1 << 15;
    /// PCR interrupt status flag, write-1-to-clear.
    pub const PCR_ISF: u32 = 1 << 24;

    /// PORT register block.
    #[repr(C)]
    pub struct RegisterBlock {
        pcr: [Reg; 32],
        gpclr: Reg,
        gpchr: Reg,
        _reserved0: [u32; 6],
        isfr: Reg,
    }

    impl RegisterBlock {
        /// 0x00..0x7C Pin control register n.
        #[inline(always)]
        pub fn pcr(&self, n: usize) -> &Reg {
            &self.pcr[n]
        }

        /// 0x80 Global pin control low.
        #[inline(always)]
        pub fn gpclr(&self) -> &Reg {
            &self.gpclr
        }

        /// 0x84 Global pin control high.
        #[inline(always)]
        pub fn gpchr(&self) -> &Reg {
            &self.gpchr
        }

        /// 0xA0 Interrupt status flags.
        #[inline(always)]
        pub fn isfr(&self) -> &Reg {
            &self.isfr
        }
    }
}

/// DSPI module 0, with 4-entry TX and RX FIFOs.
pub mod spi0 {
    use super::Reg;

    /// DSPI register block.
    #[repr(C)]
    pub struct RegisterBlock {
        mcr: Reg,
        _reserved0: [u32; 1],
        tcr: Reg,
        ctar: [Reg; 2],
        _reserved1: [u32; 6],
        sr: Reg,
        rser: Reg,
        pushr: Reg,
        popr: Reg,
        txfr: [Reg; 4],
        _reserved2: [u32; 12],
        rxfr: [Reg; 4],
    }

    impl RegisterBlock {
        /// 0x00 Module configuration register.
        #[inline(always)]
        pub fn mcr(&self) -> &Reg {
            &self.mcr
        }

        /// 0x08 Transfer count register.
        #[inline(always)]
        pub fn tcr(&self) -> &Reg {
            &self.tcr
        }

        /// 0x0C, 0x10 Clock and transfer attributes register n.
        #[inline(always)]
        pub fn ctar(&self, n: usize) -> &Reg {
            &self.ctar[n]
        }

        /// 0x2C Status register. Flags are write-1-to-clear.
        #[inline(always)]
        pub fn sr(&self) -> &Reg {
            &self.sr
        }

        /// 0x30 DMA/interrupt request select and enable register.
        #[inline(always)]
        pub fn rser(&self) -> &Reg {
            &self.rser
        }

        /// 0x34 PUSH TX FIFO register.
        #[inline(always)]
        pub fn pushr(&self) -> &Reg {
            &self.pushr
        }

        /// 0x38 POP RX FIFO register.
        #[inline(always)]
        pub fn popr(&self) -> &Reg {
            &self.popr
        }

        /// 0x3C..0x48 Transmit FIFO entry n, for debugging.
        #[inline(always)]
        pub fn txfr(&self, n: usize) -> &Reg {
            &self.txfr[n]
        }

        /// 0x7C..0x88 Receive FIFO entry n, for debugging.
        #[inline(always)]
        pub fn rxfr(&self, n: usize) -> &Reg {
            &self.rxfr[n]
        }
    }
}

macro_rules! peripheral {
    ($(#[$attr:meta])* $name:ident, $block:path, $addr:literal) => {
        $(#[$attr])*
        pub struct $name {
            _marker: PhantomData<*const ()>,
        }

        unsafe impl Send for $name {}

        impl $name {
            /// Pointer to the register block.
            pub const PTR: *const $block = $addr as *const _;

            /// Return the pointer to the register block.
            #[inline(always)]
            pub const fn ptr() -> *const $block {
                Self::PTR
            }

            /// Steal an instance of this peripheral.
            ///
            /// # Safety
            /// Ensure that the new instance of the peripheral cannot
            /// be used in a way that may race with any existing
            /// instances.
            #[inline(always)]
            pub unsafe fn steal() -> Self {
                Self {
                    _marker: PhantomData,
                }
            }
        }

        impl Deref for $name {
            type Target = $block;

            #[inline(always)]
            fn deref(&self) -> &Self::Target {
                // safety: fixed, valid address for the life of the program
                unsafe { &*Self::PTR }
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
                f.debug_struct(stringify!($name)).finish()
            }
        }

        #[cfg(feature = "defmt")]
        impl defmt::Format for $name {
            fn format(&self, f: defmt::Formatter) {
                defmt::write!(f, "{}", stringify!($name));
            }
        }
    };
}

peripheral!(
    /// System integration module.
    SIM, sim::RegisterBlock, 0x4004_7000
);
peripheral!(
    /// Pin control, port A.
    PORTA, port::RegisterBlock, 0x4004_9000
);
peripheral!(
    /// Pin control, port B.
    PORTB, port::RegisterBlock, 0x4004_a000
);
peripheral!(
    /// Pin control, port C.
    PORTC, port::RegisterBlock, 0x4004_b000
);
peripheral!(
    /// Pin control, port D.
    PORTD, port::RegisterBlock, 0x4004_c000
);
peripheral!(
    /// Pin control, port E.
    PORTE, port::RegisterBlock, 0x4004_d000
);
peripheral!(
    /// DSPI module 0.
    SPI0, spi0::RegisterBlock, 0x4002_c000
);

// set once the peripherals have been handed out
static mut DEVICE_PERIPHERALS: bool = false;

/// All the peripherals described by this crate.
#[allow(non_snake_case)]
#[derive(Debug)]
pub struct Peripherals {
    pub SIM: SIM,
    pub PORTA: PORTA,
    pub PORTB: PORTB,
    pub PORTC: PORTC,
    pub PORTD: PORTD,
    pub PORTE: PORTE,
    pub SPI0: SPI0,
}

impl Peripherals {
    /// Returns all the peripherals *once*.
    #[inline]
    pub fn take() -> Option<Self> {
        critical_section::with(|_| {
            // safety: guarded by the critical section
            if unsafe { DEVICE_PERIPHERALS } {
                return None;
            }
            Some(unsafe { Peripherals::steal() })
        })
    }

    /// Unchecked version of [Peripherals::take].
    ///
    /// # Safety
    /// Each of the returned peripherals must be used at most once.
    #[inline]
    pub unsafe fn steal() -> Self {
        DEVICE_PERIPHERALS = true;
        Peripherals {
            SIM: SIM::steal(),
            PORTA: PORTA::steal(),
            PORTB: PORTB::steal(),
            PORTC: PORTC::steal(),
            PORTD: PORTD::steal(),
            PORTE: PORTE::steal(),
            SPI0: SPI0::steal(),
        }
    }
}
