#![no_std]

#[macro_use]
mod fmt;

pub mod prelude;

/// Peripheral access crate, providing raw, unconstrained access to
/// peripherals.
pub use mk64f12 as pac;

pub mod block;
pub mod port;
pub mod power;
pub mod spi;
pub mod time;
