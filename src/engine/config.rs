//! Engine configuration.

use crate::dsp::analysis::{PitchSearch, PitchTrackerConfig};
use crate::error::{EngineError, EngineResult};
use crate::settings::*;
use serde::{Deserialize, Serialize};

/// Tunables of the pitch tracker and filter bank. Every field defaults to the
/// corresponding constant in [`settings`](crate::settings), so a JSON
/// document only needs to name the fields it changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct EngineConfig {
    pub capture_window_size: usize,
    pub reference_window_size: usize,
    pub min_search_lag: usize,
    pub capture_gain: f32,
    pub volume_gate: f32,
    pub dip_margin: f32,
    pub relative_dip_margin: f32,
    pub min_sample_shift: u32,
    pub stability_tolerance_hz: f32,
    pub octave_tolerance_hz: f32,
    pub octave_confirmations: u32,
    pub min_freq_hz: f32,
    pub max_freq_hz: f32,
    pub initial_freq_hz: f32,
    pub filter_q: f64,
    /// The input channel fed to the pitch tracker. Falls back to the last
    /// input channel if the input has fewer channels.
    pub tracking_channel: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            capture_window_size: CAPTURE_WINDOW_SIZE,
            reference_window_size: REFERENCE_WINDOW_SIZE,
            min_search_lag: MIN_SEARCH_LAG,
            capture_gain: CAPTURE_GAIN,
            volume_gate: VOLUME_GATE,
            dip_margin: DIP_MARGIN,
            relative_dip_margin: RELATIVE_DIP_MARGIN,
            min_sample_shift: MIN_SAMPLE_SHIFT,
            stability_tolerance_hz: STABILITY_TOLERANCE_HZ,
            octave_tolerance_hz: OCTAVE_TOLERANCE_HZ,
            octave_confirmations: OCTAVE_CONFIRMATIONS,
            min_freq_hz: MIN_TRACKED_FREQ_HZ,
            max_freq_hz: MAX_TRACKED_FREQ_HZ,
            initial_freq_hz: INITIAL_FREQ_HZ,
            filter_q: HARMONIC_FILTER_Q,
            tracking_channel: PITCH_TRACKING_CHANNEL,
        }
    }
}

impl EngineConfig {
    /// Parses a (possibly partial) configuration and validates it.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is malformed, names an unknown field, or
    /// describes an inconsistent configuration.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;

        Ok(config)
    }

    /// Checks that the configuration is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] describing the first problem
    /// found.
    pub fn validate(&self) -> EngineResult<()> {
        let fail = |msg: String| Err(EngineError::InvalidConfig(msg));

        if self.reference_window_size == 0
            || self.reference_window_size >= self.capture_window_size
        {
            return fail(format!(
                "reference window ({}) must be non-empty and shorter than \
                 the capture window ({})",
                self.reference_window_size, self.capture_window_size
            ));
        }

        let search_end = self.capture_window_size - self.reference_window_size;
        if self.min_search_lag == 0 || self.min_search_lag + 2 > search_end {
            return fail(format!(
                "minimum search lag ({}) must be within [1, {}]",
                self.min_search_lag,
                search_end.saturating_sub(2)
            ));
        }

        let positive = [
            ("capture gain", self.capture_gain),
            ("stability tolerance", self.stability_tolerance_hz),
            ("octave tolerance", self.octave_tolerance_hz),
            ("minimum frequency", self.min_freq_hz),
            ("initial frequency", self.initial_freq_hz),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return fail(format!("{name} must be positive, got {value}"));
            }
        }

        let non_negative = [
            ("volume gate", self.volume_gate),
            ("dip margin", self.dip_margin),
            ("relative dip margin", self.relative_dip_margin),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return fail(format!(
                    "{name} must not be negative, got {value}"
                ));
            }
        }

        if !(self.max_freq_hz.is_finite() && self.min_freq_hz < self.max_freq_hz)
        {
            return fail(format!(
                "frequency range [{}, {}] is empty",
                self.min_freq_hz, self.max_freq_hz
            ));
        }

        if !(self.filter_q.is_finite() && self.filter_q > 0.0) {
            return fail(format!(
                "filter Q must be positive, got {}",
                self.filter_q
            ));
        }

        if self.octave_confirmations < 2 {
            return fail(String::from(
                "octave jumps need at least two confirming passes",
            ));
        }

        Ok(())
    }

    /// The pitch tracker thresholds described by this configuration.
    pub fn tracker_config(&self) -> PitchTrackerConfig {
        PitchTrackerConfig {
            search: PitchSearch {
                reference_len: self.reference_window_size,
                min_lag: self.min_search_lag,
                dip_margin: self.dip_margin,
                relative_dip_margin: self.relative_dip_margin,
            },
            volume_gate: self.volume_gate,
            min_sample_shift: self.min_sample_shift,
            min_freq_hz: self.min_freq_hz,
            max_freq_hz: self.max_freq_hz,
            stability_tolerance_hz: self.stability_tolerance_hz,
            octave_tolerance_hz: self.octave_tolerance_hz,
            octave_confirmations: self.octave_confirmations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert_eq!(
            EngineConfig::default().tracker_config(),
            PitchTrackerConfig::default()
        );
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(
            r#"{ "maxFreqHz": 523.25, "trackingChannel": 0 }"#,
        )
        .unwrap();

        assert_eq!(config.max_freq_hz, 523.25);
        assert_eq!(config.tracking_channel, 0);
        assert_eq!(config.capture_window_size, CAPTURE_WINDOW_SIZE);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "captureWindow": 10 }"#),
            Err(EngineError::ConfigDecode(_))
        ));
    }

    #[test]
    fn test_inconsistent_configs_rejected() {
        let cases = [
            EngineConfig { reference_window_size: 3000, ..Default::default() },
            EngineConfig { min_search_lag: 2743, ..Default::default() },
            EngineConfig { min_freq_hz: 500.0, ..Default::default() },
            EngineConfig { capture_gain: 0.0, ..Default::default() },
            EngineConfig { volume_gate: f32::NAN, ..Default::default() },
            EngineConfig { filter_q: -1.0, ..Default::default() },
            EngineConfig { octave_confirmations: 1, ..Default::default() },
        ];

        for config in cases {
            assert!(
                matches!(config.validate(), Err(EngineError::InvalidConfig(_))),
                "{config:?} should be invalid"
            );
        }
    }
}
