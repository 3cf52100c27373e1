//! Biquad coefficient designs.
//!
//! Coefficient equations taken from the
//! [Audio EQ Cookbook by Robert Bristow-Johnson](https://www.w3.org/TR/audio-eq-cookbook/).

use crate::settings::NUM_BIQUAD_COEFS;
use crate::util::{db_to_level, level_to_db};
use std::f64::consts::TAU;

/// Normalised biquad coefficients (`a0 == 1`).
///
/// `b*` are the feedforward (input side) coefficients and `a*` are the
/// feedback (output side) coefficients.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefs {
    /// A coefficient state which leaves the input signal totally unaffected.
    pub const fn identity() -> Self {
        Self { b0: 1.0, b1: 0.0, b2: 0.0, a1: 0.0, a2: 0.0 }
    }

    /// Whether these coefficients are exactly the identity response.
    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    /// A peaking EQ centred on `freq` Hz, boosting or cutting by `gain_db`.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `freq` is not within `(0, sample_rate / 2)` or
    /// if `q` is not positive.
    pub fn peak(freq: f64, q: f64, gain_db: f64, sample_rate: f64) -> Self {
        debug_assert!(0.0 < freq && freq < sample_rate / 2.0 && q > 0.0);

        let (cos_phi, alpha) = phi_and_alpha(freq, q, sample_rate);
        // half the gain, as it is applied to both the zeros and the poles
        let amp = db_to_level(gain_db / 2.0);

        let a0 = 1.0 + alpha / amp;

        Self {
            b0: alpha.mul_add(amp, 1.0) / a0,
            b1: (-2.0 * cos_phi) / a0,
            b2: (-alpha).mul_add(amp, 1.0) / a0,
            a1: (-2.0 * cos_phi) / a0,
            a2: (1.0 - alpha / amp) / a0,
        }
    }

    /// A second-order lowpass with its corner at `freq` Hz.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if `freq` is not within `(0, sample_rate / 2)` or
    /// if `q` is not positive.
    pub fn lowpass(freq: f64, q: f64, sample_rate: f64) -> Self {
        debug_assert!(0.0 < freq && freq < sample_rate / 2.0 && q > 0.0);

        let (cos_phi, alpha) = phi_and_alpha(freq, q, sample_rate);
        let a0 = 1.0 + alpha;
        let b0 = ((1.0 - cos_phi) * 0.5) / a0;

        Self {
            b0,
            b1: (1.0 - cos_phi) / a0,
            b2: b0,
            a1: (-2.0 * cos_phi) / a0,
            a2: (1.0 - alpha) / a0,
        }
    }

    pub const fn to_array(self) -> [f64; NUM_BIQUAD_COEFS] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }

    pub const fn from_array(arr: [f64; NUM_BIQUAD_COEFS]) -> Self {
        let [b0, b1, b2, a1, a2] = arr;
        Self { b0, b1, b2, a1, a2 }
    }

    /// Returns the magnitude response at `freq` Hz in decibels.
    ///
    /// Evaluates `|H(e^jw)|` directly from the transfer function.
    pub fn response_at(&self, freq: f64, sample_rate: f64) -> f64 {
        let w = TAU * freq / sample_rate;
        let (cos1, sin1) = (w.cos(), w.sin());
        let (cos2, sin2) = ((2.0 * w).cos(), (2.0 * w).sin());

        let num_re = self.b2.mul_add(cos2, self.b1.mul_add(cos1, self.b0));
        let num_im = -self.b2.mul_add(sin2, self.b1 * sin1);
        let den_re = self.a2.mul_add(cos2, self.a1.mul_add(cos1, 1.0));
        let den_im = -self.a2.mul_add(sin2, self.a1 * sin1);

        let num = num_re.hypot(num_im);
        let den = den_re.hypot(den_im);

        level_to_db(num / den)
    }
}

impl Default for BiquadCoefs {
    fn default() -> Self {
        Self::identity()
    }
}

fn phi_and_alpha(freq: f64, q: f64, sample_rate: f64) -> (f64, f64) {
    let phi = TAU * (freq / sample_rate);
    (phi.cos(), phi.sin() / (2.0 * q))
}
