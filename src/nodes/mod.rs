//! Ready-made node bodies.
//!
//! These are ordinary implementations of the body traits, built entirely on
//! the public pin API — the same way downstream crates write their own.

mod generic;
mod math;

pub use generic::{Delay, Generator, Ostreamer, Tee};
pub use math::{Adder, ConstAdder};
