//! # Oracle Module
//!
//! Cumulative price accumulator maintained as a side effect of every
//! reserve-changing operation, and the averaging helper its consumers use.

pub mod twap;

pub use twap::*;
