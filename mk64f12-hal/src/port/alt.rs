//! Types for using pins in alternate modes.

use super::*;

macro_rules! pin {
    ($name:literal, enum $pinname:ident {$($var:ident = ($port:literal, $n:literal, $alt:literal)),*$(,)?}) => {
        #[derive(Debug)]
        #[cfg_attr(feature = "defmt", derive(defmt::Format))]
        #[doc = concat!("Choices for pin ", stringify!($pinname), " on ", $name, ".")]
        pub enum $pinname {
            $(
                $var(Pin<$port, $n, Alternate<$alt>>),
            )*
        }

        $(
            impl<Mode> From<Pin<$port, $n, Mode>> for $pinname {
                #[inline(always)]
                fn from(value: Pin<$port, $n, Mode>) -> Self {
                    Self::$var(value.into_alternate())
                }
            }
        )*
    };
}

macro_rules! pins {
    ($mod:ident, $name:literal, {$(enum $pinname:ident {$($var:ident = ($port:literal, $n:literal, $alt:literal)),*$(,)?})*}) => {
        #[doc = concat!($name, ".")]
        pub mod $mod {
            use super::*;

            $(
                pin!($name, enum $pinname {
                    $($var = ($port, $n, $alt),)*
                });
            )*
        }
    };
}

pins!(spi0, "SPI0", {
    enum Pcs0 {
        PA14 = ('A', 14, 2),
        PC4 = ('C', 4, 2),
        PD0 = ('D', 0, 2),
    }

    enum Sck {
        PA15 = ('A', 15, 2),
        PC5 = ('C', 5, 2),
        PD1 = ('D', 1, 2),
    }

    enum Sout {
        PA16 = ('A', 16, 2),
        PC6 = ('C', 6, 2),
        PD2 = ('D', 2, 2),
    }

    enum Sin {
        PA17 = ('A', 17, 2),
        PC7 = ('C', 7, 2),
        PD3 = ('D', 3, 2),
    }
});
