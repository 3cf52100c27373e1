//! Module for time domain filters.

use dyn_clone::DynClone;

pub mod biquad;
pub mod simple;

/// The Q of a second-order Butterworth section.
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// A trait which allows for filters to be dynamically dispatched.
pub trait Filter: Send + DynClone + std::fmt::Debug {
    /// Generic processing method for a filter.
    fn process(&mut self, sample: f64) -> f64;

    /// Moves the filter's centre or corner frequency to `freq` Hz.
    fn set_freq(&mut self, freq: f64);

    /// Clears any internal state (delay lines etc.) without affecting the
    /// filter's parameters.
    fn reset(&mut self) {}
}

dyn_clone::clone_trait_object!(Filter);

/// An enum which covers the available filter types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Boosts or cuts a band around the centre frequency.
    #[default]
    Peak,
    /// Second-order lowpass.
    Lowpass,
}
