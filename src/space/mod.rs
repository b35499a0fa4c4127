//! Interval algebra over integer-encoded address ranges.
//!
//! - [`Interval`] - inclusive run of encoded addresses
//! - [`AddressSpace`] - normalized set of intervals of one family

mod address_space;
mod interval;

pub use address_space::{AddressSpace, Fit};
pub use interval::Interval;
