use serde::{Deserialize, Serialize};

use crate::math::Fixed18;
use crate::types::Side;

/// The pool's recorded holdings of both assets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reserves {
    pub a: Fixed18,
    pub b: Fixed18,
}

impl Reserves {
    pub fn new(a: Fixed18, b: Fixed18) -> Self {
        Self { a, b }
    }

    pub fn get(&self, side: Side) -> Fixed18 {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut Fixed18 {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Both reserves strictly positive
    pub fn is_funded(&self) -> bool {
        !self.a.is_zero() && !self.b.is_zero()
    }
}
