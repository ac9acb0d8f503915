//! Helpers for non-blocking operations.
//!
//! This is a re-export of the [nb] crate, so that HAL users need not
//! depend on it directly.

pub use nb::{block, Error, Result};
