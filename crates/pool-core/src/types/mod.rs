//! # Core Type Definitions
//!
//! Identities, reserves, swap direction and the observable records the
//! pool emits.

pub mod events;
pub mod identity;
pub mod reserves;

pub use events::*;
pub use identity::*;
pub use reserves::*;
