//! Primitive, non-anti-aliased oscillator types.

use super::*;

pub mod saw;
pub mod square;

pub use saw::SawOsc;
pub use square::SquareOsc;
