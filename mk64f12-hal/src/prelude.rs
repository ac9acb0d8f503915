//! Commonly used traits, for glob import.

pub use crate::time::{DurationExtU32 as _, RateExtU32 as _};

pub use embedded_hal_1::spi::{SpiBus as _, SpiDevice as _};
pub use embedded_hal_nb::spi::FullDuplex as _;
