//! Biquad filter using the [direct form 1](https://en.wikipedia.org/wiki/Digital_biquad_filter#Direct_form_1).

#![allow(clippy::module_name_repetitions)]
use super::*;
use std::f64::consts::FRAC_1_SQRT_2;
use FilterType as FT;

/// A struct which covers the parameters used by biquad filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadParams {
    pub freq: f64,
    pub gain: f64,
    pub q: f64,
    pub filter_type: FilterType,
}

impl Default for BiquadParams {
    fn default() -> Self {
        Self {
            freq: 1000.0,
            q: FRAC_1_SQRT_2,
            filter_type: FT::default(),
            gain: 0.0,
        }
    }
}

/// The delay line of a direct form 1 biquad.
///
/// Filters sharing the same signal path may hand this over to one another so
/// that a change of coefficients does not restart the filter from silence.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BiquadState {
    pub delayed_in: (f64, f64),
    pub delayed_out: (f64, f64),
}

/// A biquad filter implementation, which offers the filter types available in
/// `FilterType`.
///
/// There are two ways to drive it. Parameters may be set via `set_params()`
/// (or retuned with `Filter::set_freq()`), in which case the coefficients are recomputed
/// lazily on the next call to `process()`. Alternatively, precomputed
/// coefficients may be installed directly with `set_coefs()`, which never
/// triggers a recompute; this is how the harmonic filter bank receives
/// coefficients designed on another thread.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    coefs: BiquadCoefs,
    state: BiquadState,

    params: BiquadParams,
    sample_rate: f64,

    needs_recompute: bool,
}

impl Filter for BiquadFilter {
    /// Processes a single sample of the filter and returns the new sample.
    ///
    /// Note that this filter will lazily update its coefficients; if there is
    /// no parameter change between calls to this method, only the sample output
    /// is computed.
    fn process(&mut self, sample: f64) -> f64 {
        if self.needs_recompute {
            self.recompute();
        }

        let BiquadCoefs { b0, b1, b2, a1, a2 } = self.coefs;
        let BiquadState { delayed_in: (x1, x2), delayed_out: (y1, y2) } =
            self.state;

        let output = b0 * sample + b1 * x1 + b2 * x2 - a1 * y1 - a2 * y2;

        self.state.delayed_in = (sample, x1);
        self.state.delayed_out = (output, y1);

        output
    }

    fn set_freq(&mut self, freq: f64) {
        self.params.freq = freq;
        self.needs_recompute = true;
        self.assertions();
    }

    fn reset(&mut self) {
        self.state = BiquadState::default();
    }
}

impl BiquadFilter {
    /// Creates a new filter with identity coefficients.
    #[must_use]
    pub fn new(sample_rate: f64) -> Self {
        Self {
            coefs: BiquadCoefs::identity(),
            state: BiquadState::default(),
            params: BiquadParams::default(),
            sample_rate,
            needs_recompute: false,
        }
    }

    /// Sets the parameters of the filter.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the frequency or q value is not positive, or if
    /// the frequency is not below half of the sample rate.
    pub fn set_params(&mut self, params: &BiquadParams) {
        self.params = *params;
        self.needs_recompute = true;
        self.assertions();
    }

    /// Installs precomputed coefficients, replacing any pending recompute.
    pub fn set_coefs(&mut self, coefs: BiquadCoefs) {
        self.coefs = coefs;
        self.needs_recompute = false;
    }

    pub const fn coefs(&self) -> BiquadCoefs {
        self.coefs
    }

    pub const fn params(&self) -> BiquadParams {
        self.params
    }

    pub const fn state(&self) -> BiquadState {
        self.state
    }

    pub fn set_state(&mut self, state: BiquadState) {
        self.state = state;
    }

    pub const fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Returns the magnitude response of the current coefficients at `freq`
    /// Hz in decibels.
    pub fn response_at(&self, freq: f64) -> f64 {
        self.coefs.response_at(freq, self.sample_rate)
    }

    /* PRIVATE METHODS */

    fn recompute(&mut self) {
        let BiquadParams { freq, gain, q, filter_type } = self.params;
        let sr = self.sample_rate;

        self.coefs = match filter_type {
            FT::Peak => BiquadCoefs::peak(freq, q, gain, sr),
            FT::Lowpass => BiquadCoefs::lowpass(freq, q, sr),
        };

        self.needs_recompute = false;
    }

    /// Debug assertions used whenever a parameter is changed.
    fn assertions(&self) {
        let BiquadParams { freq, q, .. } = self.params;

        debug_assert!(
            freq > 0.0 && q > 0.0 && freq < self.sample_rate / 2.0,
            "invalid biquad parameters: freq {freq}, q {q}"
        );
    }
}
