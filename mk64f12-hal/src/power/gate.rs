use crate::pac;

// Clock gate bits live in SIM_SCGC5 (ports) and SIM_SCGC6 (SPI0).

/// Ownership of one clock gate bit.
///
/// Whoever holds the `Gate` for a device is the only one allowed to turn
/// its clock on or off.
pub struct Gate<Dev> {
    _device: core::marker::PhantomData<Dev>,
}

pub(crate) trait Sealed {}

/// A peripheral behind a SIM clock gate.
#[allow(private_bounds)]
pub trait Device: Sealed {
    /// Shown by `Debug` and `defmt` output for the gate.
    const NAME: &'static str;

    /// Turn the clock to this device on or off.
    ///
    /// # Safety
    /// Only a [Gate] may call this. Any other caller can gate a device
    /// off under a driver that still uses it, and every register access
    /// to an unclocked device is a bus fault.
    unsafe fn set_enabled(enabled: bool);

    /// Is the clock to this device on?
    fn is_enabled() -> bool;

    #[cfg(feature = "defmt")]
    fn defmt(f: defmt::Formatter);
}

impl<Dev> core::fmt::Debug for Gate<Dev>
where
    Dev: Device,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Gate")
            .field("device", &Dev::NAME)
            .field("on", &Dev::is_enabled())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl<Dev> defmt::Format for Gate<Dev>
where
    Dev: Device,
{
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Gate(");
        Dev::defmt(f);
        defmt::write!(f, " on={})", Dev::is_enabled());
    }
}

impl<Dev> Gate<Dev>
where
    Dev: Device,
{
    /// Conjure a gate for `Dev`.
    ///
    /// The caller must make sure only one exists at a time.
    #[inline(always)]
    pub(crate) unsafe fn steal() -> Self {
        Self {
            _device: core::marker::PhantomData,
        }
    }

    /// Clock the device, or stop its clock.
    #[inline(always)]
    pub fn set_enabled(&mut self, enabled: bool) {
        // safety: the only gate for Dev is &mut self
        unsafe { Dev::set_enabled(enabled) }
    }

    /// Start the clock to the device.
    #[inline(always)]
    pub fn enable(&mut self) {
        self.set_enabled(true);
    }

    /// Stop the clock to the device. Its registers read as a bus fault
    /// until it is enabled again.
    #[inline(always)]
    pub fn disable(&mut self) {
        self.set_enabled(false);
    }

    /// Is the device clocked?
    #[inline(always)]
    pub fn is_enabled(&self) -> bool {
        Dev::is_enabled()
    }
}

// one Device impl per SCGC bit
macro_rules! dev_gate_impl {
    {$(($dev:ident, $name:ident, $reg:ident, $bit:literal)),+,} => {
        /// A collection of controls for powering individual devices.
        #[derive(Debug)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        pub struct Gates {
            $(pub $name: Gate<pac::$dev>),*
        }

        impl Gates {
            /// safety: this peripheral reads and writes the SIM clock gates
            #[inline(always)]
            pub(crate) unsafe fn steal() -> Self {
                Self {
                    $($name: Gate::steal()),*
                }
            }
        }

        $(dev_gate_impl!(trait $dev, $reg, $bit);)+
    };

    // helper to implement the Device trait
    (trait $dev:ident, $reg:ident, $bit:literal) => {
        impl Sealed for pac::$dev {}

        impl Device for pac::$dev {
            const NAME: &'static str = stringify!($dev);

            #[inline(always)]
            unsafe fn set_enabled(enabled: bool) {
                // the SCGC registers are shared between devices, so the
                // read-modify-write has to be exclusive
                critical_section::with(|_| {
                    let sim = pac::SIM::steal();
                    sim.$reg().modify(|r| {
                        if enabled {
                            r | (1 << $bit)
                        } else {
                            r & !(1 << $bit)
                        }
                    });
                })
            }

            #[inline(always)]
            fn is_enabled() -> bool {
                // safety: we only read our bit
                unsafe { pac::SIM::steal().$reg().read() & (1 << $bit) != 0 }
            }

            #[cfg(feature = "defmt")]
            #[inline(always)]
            fn defmt(f: defmt::Formatter) {
                defmt::write!(f, "{}", stringify!($dev));
            }
        }
    };
}

dev_gate_impl! {
    (PORTA, port_a, scgc5, 9),
    (PORTB, port_b, scgc5, 10),
    (PORTC, port_c, scgc5, 11),
    (PORTD, port_d, scgc5, 12),
    (PORTE, port_e, scgc5, 13),
    (SPI0, spi0, scgc6, 12),
}
