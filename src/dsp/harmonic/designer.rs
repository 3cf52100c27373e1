//! Peaking filter design for the fundamental and its harmonics.

use crate::dsp::BiquadCoefs;
use crate::settings::{HARMONIC_FILTER_Q, NUM_HARMONIC_BANDS};
use crate::util::epsilon_eq;
use serde::{Deserialize, Serialize};

/// One harmonic band of the EQ.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
    Fundamental,
    Third,
    Fifth,
    Seventh,
    Second,
    Fourth,
    Sixth,
}

/// The bands in processing order: the fundamental, then the odd harmonics,
/// then the even harmonics.
pub const BANDS: [Band; NUM_HARMONIC_BANDS] = [
    Band::Fundamental,
    Band::Third,
    Band::Fifth,
    Band::Seventh,
    Band::Second,
    Band::Fourth,
    Band::Sixth,
];

impl Band {
    /// The multiple of the fundamental this band is centred on.
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Fundamental => 1.0,
            Self::Second => 2.0,
            Self::Third => 3.0,
            Self::Fourth => 4.0,
            Self::Fifth => 5.0,
            Self::Sixth => 6.0,
            Self::Seventh => 7.0,
        }
    }

    /// The gain knob (in decibels) which controls this band.
    pub const fn gain_db(self, request: &DesignRequest) -> f32 {
        match self {
            Self::Fundamental => request.fundamental_db,
            Self::Third | Self::Fifth | Self::Seventh => request.odd_db,
            Self::Second | Self::Fourth | Self::Sixth => request.even_db,
        }
    }
}

/// The inputs of one coefficient design: the tracked fundamental and the
/// three EQ knobs.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DesignRequest {
    pub freq_hz: f32,
    pub fundamental_db: f32,
    pub odd_db: f32,
    pub even_db: f32,
}

/// Coefficients for every band, in [`BANDS`] order.
pub type CoefficientSet = [BiquadCoefs; NUM_HARMONIC_BANDS];

/// Designs the peaking filters of the harmonic EQ.
#[derive(Debug, Clone, Copy)]
pub struct HarmonicFilterDesigner {
    sample_rate: f64,
    q: f64,
}

impl HarmonicFilterDesigner {
    /// # Panics
    ///
    /// Panics if `sample_rate` or `q` is not positive.
    pub fn new(sample_rate: f64, q: f64) -> Self {
        assert!(sample_rate > 0.0 && q > 0.0);
        Self { sample_rate, q }
    }

    pub fn with_default_q(sample_rate: f64) -> Self {
        Self::new(sample_rate, HARMONIC_FILTER_Q)
    }

    pub const fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Designs coefficients for every band.
    ///
    /// A band gets identity coefficients if its centre is at or above Nyquist,
    /// if the fundamental is not positive, or if its gain is 0 dB.
    pub fn design(&self, request: &DesignRequest) -> CoefficientSet {
        BANDS.map(|band| self.design_band(band, request))
    }

    fn design_band(&self, band: Band, request: &DesignRequest) -> BiquadCoefs {
        let centre = f64::from(request.freq_hz) * band.multiplier();
        let gain_db = f64::from(band.gain_db(request));

        if !self.is_audible(centre)
            || epsilon_eq(gain_db, 0.0)
            || !gain_db.is_finite()
        {
            return BiquadCoefs::identity();
        }

        BiquadCoefs::peak(centre, self.q, gain_db, self.sample_rate)
    }

    fn is_audible(&self, centre: f64) -> bool {
        centre > 0.0 && centre < self.sample_rate / 2.0
    }
}
