//! Module for signal generation.

use super::*;

pub mod basic;
pub mod harmonic_oscs;

pub use basic::*;
pub use harmonic_oscs::{HarmonicOscillators, SynthBlockSettings};

/// A trait for generators whose frequency is expressed as a period length in
/// samples, so that they stay locked to a tracked pitch.
pub trait GeneratorProcessor {
    /// Produces the next sample, in the range `[-1.0, 1.0]`.
    fn process(&mut self) -> f32;

    /// Sets the period of the generator in samples. A period of zero is
    /// treated as one.
    fn set_period(&mut self, period_samples: u32);

    /// Returns the generator to the start of its cycle.
    fn reset(&mut self);
}
