//! # Mathematical Functions
//!
//! Checked integer arithmetic and the 18-digit decimal fixed-point type.

pub mod fixed_point;
pub mod safe_math;

pub use fixed_point::*;
pub use safe_math::*;
