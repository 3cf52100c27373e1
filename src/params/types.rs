//! Parameter identifiers, ranges, and the per-block parameter snapshot.

use crate::dsp::DesignRequest;
use crate::settings::SYNTH_OFF_DB;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result};

/// The seven user-facing knobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamId {
    /// Cutoff of the lowpass after the saw oscillator.
    OddLowPass,
    /// Level of the saw oscillator.
    OddSynth,
    /// Gain of the odd harmonic bands (x3, x5, x7).
    OddHarmonics,
    /// Gain of the fundamental band.
    Fundamental,
    /// Gain of the even harmonic bands (x2, x4, x6).
    EvenHarmonics,
    /// Level of the square oscillator.
    EvenSynth,
    /// Cutoff of the lowpass after the square oscillator.
    EvenLowPass,
}

/// The numeric range and default of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamRange {
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

impl ParamRange {
    pub fn contains(&self, value: f32) -> bool {
        (self.min..=self.max).contains(&value)
    }

    /// Clamps `value` into the range. Non-finite values map to the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if value.is_nan() {
            return self.default;
        }

        value.clamp(self.min, self.max)
    }
}

const CUTOFF_RANGE: ParamRange =
    ParamRange { min: 100.0, max: 20000.0, default: 20000.0 };
const SYNTH_RANGE: ParamRange =
    ParamRange { min: SYNTH_OFF_DB, max: 0.0, default: SYNTH_OFF_DB };
const HARMONIC_RANGE: ParamRange =
    ParamRange { min: -15.0, max: 15.0, default: 0.0 };

impl ParamId {
    /// Every parameter, in the order they appear on the control surface.
    pub const ALL: [Self; 7] = [
        Self::OddLowPass,
        Self::OddSynth,
        Self::OddHarmonics,
        Self::Fundamental,
        Self::EvenHarmonics,
        Self::EvenSynth,
        Self::EvenLowPass,
    ];

    /// The stable identifier used in persisted state.
    pub const fn id(self) -> &'static str {
        match self {
            Self::OddLowPass => "oddLowPass",
            Self::OddSynth => "oddSynth",
            Self::OddHarmonics => "oddHarmonics",
            Self::Fundamental => "fundamental",
            Self::EvenHarmonics => "evenHarmonics",
            Self::EvenSynth => "evenSynth",
            Self::EvenLowPass => "evenLowPass",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    pub const fn range(self) -> ParamRange {
        match self {
            Self::OddLowPass | Self::EvenLowPass => CUTOFF_RANGE,
            Self::OddSynth | Self::EvenSynth => SYNTH_RANGE,
            Self::OddHarmonics | Self::Fundamental | Self::EvenHarmonics => {
                HARMONIC_RANGE
            }
        }
    }

    pub const fn default_value(self) -> f32 {
        self.range().default
    }

    pub const fn unit(self) -> &'static str {
        match self {
            Self::OddLowPass | Self::EvenLowPass => "Hz",
            _ => "dB",
        }
    }

    pub(super) const fn index(self) -> usize {
        self as usize
    }
}

impl Display for ParamId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::OddLowPass => write!(f, "Odd Low Pass"),
            Self::OddSynth => write!(f, "Odd Synth"),
            Self::OddHarmonics => write!(f, "Odd Harmonics"),
            Self::Fundamental => write!(f, "Fundamental"),
            Self::EvenHarmonics => write!(f, "Even Harmonics"),
            Self::EvenSynth => write!(f, "Even Synth"),
            Self::EvenLowPass => write!(f, "Even Low Pass"),
        }
    }
}

// *** //

/// A snapshot of every knob. Serialises with the stable parameter ids as
/// keys.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HarmonicGainParams {
    #[serde(rename = "fundamental")]
    pub fundamental_db: f32,
    #[serde(rename = "oddHarmonics")]
    pub odd_harmonics_db: f32,
    #[serde(rename = "evenHarmonics")]
    pub even_harmonics_db: f32,
    #[serde(rename = "oddSynth")]
    pub odd_synth_db: f32,
    #[serde(rename = "evenSynth")]
    pub even_synth_db: f32,
    #[serde(rename = "oddLowPass")]
    pub odd_cutoff_hz: f32,
    #[serde(rename = "evenLowPass")]
    pub even_cutoff_hz: f32,
}

impl HarmonicGainParams {
    pub const fn get(&self, id: ParamId) -> f32 {
        match id {
            ParamId::OddLowPass => self.odd_cutoff_hz,
            ParamId::OddSynth => self.odd_synth_db,
            ParamId::OddHarmonics => self.odd_harmonics_db,
            ParamId::Fundamental => self.fundamental_db,
            ParamId::EvenHarmonics => self.even_harmonics_db,
            ParamId::EvenSynth => self.even_synth_db,
            ParamId::EvenLowPass => self.even_cutoff_hz,
        }
    }

    pub fn set(&mut self, id: ParamId, value: f32) {
        let field = match id {
            ParamId::OddLowPass => &mut self.odd_cutoff_hz,
            ParamId::OddSynth => &mut self.odd_synth_db,
            ParamId::OddHarmonics => &mut self.odd_harmonics_db,
            ParamId::Fundamental => &mut self.fundamental_db,
            ParamId::EvenHarmonics => &mut self.even_harmonics_db,
            ParamId::EvenSynth => &mut self.even_synth_db,
            ParamId::EvenLowPass => &mut self.even_cutoff_hz,
        };

        *field = value;
    }

    /// The filter design these knobs ask for at `freq_hz`.
    pub const fn design_request(&self, freq_hz: f32) -> DesignRequest {
        DesignRequest {
            freq_hz,
            fundamental_db: self.fundamental_db,
            odd_db: self.odd_harmonics_db,
            even_db: self.even_harmonics_db,
        }
    }
}

impl Default for HarmonicGainParams {
    fn default() -> Self {
        let mut params = Self {
            fundamental_db: 0.0,
            odd_harmonics_db: 0.0,
            even_harmonics_db: 0.0,
            odd_synth_db: 0.0,
            even_synth_db: 0.0,
            odd_cutoff_hz: 0.0,
            even_cutoff_hz: 0.0,
        };

        for id in ParamId::ALL {
            params.set(id, id.default_value());
        }

        params
    }
}
