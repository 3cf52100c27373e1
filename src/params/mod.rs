//! User parameters.
//!
//! [`HarmonicParams`] is a lock-free store shared (via `Arc`) between whoever
//! edits the knobs and the engine. Writes may happen from any thread at any
//! time; the engine snapshots the store once per block, so a write takes
//! effect on the next block.

pub mod types;

use crate::error::ParamError;
use crate::util::AtomicOps;
use atomic_float::AtomicF32;
use lazy_static::lazy_static;
use serde_json::{json, Map, Value};

pub use types::*;

lazy_static! {
    static ref STATE_VALIDATOR: Option<jsonschema::Validator> =
        jsonschema::Validator::new(&state_schema()).ok();
}

/// The JSON schema of persisted parameter state: an object keyed by
/// parameter id, every key optional, each value a number within its range.
pub fn state_schema() -> Value {
    let properties: Map<String, Value> = ParamId::ALL
        .into_iter()
        .map(|id| {
            let range = id.range();
            let schema = json!({
                "type": "number",
                "minimum": range.min,
                "maximum": range.max,
            });

            (id.id().to_owned(), schema)
        })
        .collect();

    json!({
        "type": "object",
        "properties": properties,
    })
}

/// The knob values, one atomic per parameter.
#[derive(Debug)]
pub struct HarmonicParams {
    values: [AtomicF32; 7],
}

impl HarmonicParams {
    pub fn new() -> Self {
        Self {
            values: ParamId::ALL.map(|id| AtomicF32::new(id.default_value())),
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].lr()
    }

    /// Sets a parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is outside the parameter's range (or is
    /// NaN). The stored value is left unchanged.
    pub fn set(&self, id: ParamId, value: f32) -> Result<(), ParamError> {
        let range = id.range();

        if !range.contains(value) {
            return Err(ParamError::OutOfRange {
                id,
                value,
                min: range.min,
                max: range.max,
            });
        }

        self.values[id.index()].sr(value);
        Ok(())
    }

    /// Sets a parameter, clamping `value` into its range.
    pub fn set_clamped(&self, id: ParamId, value: f32) {
        self.values[id.index()].sr(id.range().clamp(value));
    }

    /// Sets a parameter by its string id.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is unknown or `value` is out of range.
    pub fn set_by_id(&self, id: &str, value: f32) -> Result<(), ParamError> {
        let param = ParamId::from_id(id)
            .ok_or_else(|| ParamError::UnknownId(id.to_owned()))?;

        self.set(param, value)
    }

    /// Returns every parameter to its default.
    pub fn reset_to_defaults(&self) {
        for id in ParamId::ALL {
            self.values[id.index()].sr(id.default_value());
        }
    }

    /// A copy of every knob. Each value is read individually, so a snapshot
    /// taken while another thread is writing may mix old and new values of
    /// *different* knobs, but never a torn value.
    pub fn snapshot(&self) -> HarmonicGainParams {
        let mut params = HarmonicGainParams::default();

        for id in ParamId::ALL {
            params.set(id, self.get(id));
        }

        params
    }

    /// Serialises the current values as a JSON object keyed by parameter id.
    ///
    /// # Errors
    ///
    /// Returns an error if serialisation fails.
    pub fn save_state(&self) -> Result<String, ParamError> {
        Ok(serde_json::to_string(&self.snapshot())?)
    }

    /// Restores values from a JSON object produced by
    /// [`save_state()`](Self::save_state).
    ///
    /// Unknown keys are ignored and missing keys keep their current value.
    ///
    /// # Errors
    ///
    /// Returns an error if `state` is not valid JSON or any present value is
    /// not a number within range. Nothing is applied in that case.
    pub fn load_state(&self, state: &str) -> Result<(), ParamError> {
        let value: Value = serde_json::from_str(state)?;

        let validator = STATE_VALIDATOR.as_ref().ok_or_else(|| {
            ParamError::Schema(String::from("schema failed to compile"))
        })?;

        if let Some(err) = validator.iter_errors(&value).next() {
            return Err(ParamError::Schema(err.to_string()));
        }

        let mut pending = Vec::with_capacity(ParamId::ALL.len());

        for id in ParamId::ALL {
            if let Some(v) = value.get(id.id()).and_then(Value::as_f64) {
                let v = v as f32;
                // the schema checks the f64; the f32 must agree
                let range = id.range();
                if !range.contains(v) {
                    return Err(ParamError::OutOfRange {
                        id,
                        value: v,
                        min: range.min,
                        max: range.max,
                    });
                }

                pending.push((id, v));
            }
        }

        for (id, v) in pending {
            self.values[id.index()].sr(v);
        }

        log::debug!("loaded parameter state: {:?}", self.snapshot());
        Ok(())
    }
}

impl Default for HarmonicParams {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SYNTH_OFF_DB;
    use std::sync::Arc;

    #[test]
    fn test_defaults() {
        let params = HarmonicParams::new();
        assert_eq!(params.snapshot(), HarmonicGainParams::default());
    }

    #[test]
    fn test_set_rejects_out_of_range() {
        let params = HarmonicParams::new();

        assert!(params.set(ParamId::Fundamental, 15.0).is_ok());
        assert!(matches!(
            params.set(ParamId::Fundamental, 15.5),
            Err(ParamError::OutOfRange { id: ParamId::Fundamental, .. })
        ));
        assert!(params.set(ParamId::OddLowPass, f32::NAN).is_err());
        assert!(params.set(ParamId::EvenSynth, 1.0).is_err());

        assert_eq!(params.get(ParamId::Fundamental), 15.0);
        assert_eq!(params.get(ParamId::EvenSynth), SYNTH_OFF_DB);
    }

    #[test]
    fn test_set_clamped() {
        let params = HarmonicParams::new();
        params.set_clamped(ParamId::EvenLowPass, 50.0);
        assert_eq!(params.get(ParamId::EvenLowPass), 100.0);
    }

    #[test]
    fn test_set_by_id() {
        let params = HarmonicParams::new();

        params.set_by_id("oddHarmonics", -3.0).unwrap();
        assert_eq!(params.get(ParamId::OddHarmonics), -3.0);
        assert!(matches!(
            params.set_by_id("volume", 0.0),
            Err(ParamError::UnknownId(_))
        ));
    }

    #[test]
    fn test_state_restores_into_a_new_store() {
        let params = HarmonicParams::new();
        params.set(ParamId::Fundamental, 6.0).unwrap();
        params.set(ParamId::OddSynth, -12.0).unwrap();
        params.set(ParamId::EvenLowPass, 800.0).unwrap();

        let state = params.save_state().unwrap();
        let restored = HarmonicParams::new();
        restored.load_state(&state).unwrap();

        assert_eq!(restored.snapshot(), params.snapshot());
    }

    #[test]
    fn test_partial_state_keeps_other_values() {
        let params = HarmonicParams::new();
        params.set(ParamId::EvenHarmonics, 4.0).unwrap();

        params
            .load_state(r#"{ "fundamental": -2.5, "someOtherKey": true }"#)
            .unwrap();

        assert_eq!(params.get(ParamId::Fundamental), -2.5);
        assert_eq!(params.get(ParamId::EvenHarmonics), 4.0);
    }

    #[test]
    fn test_invalid_state_applies_nothing() {
        let params = HarmonicParams::new();
        let before = params.snapshot();

        // the first value is fine, the second is out of range
        let err = params
            .load_state(r#"{ "fundamental": 3.0, "oddSynth": 10.0 }"#)
            .unwrap_err();
        assert!(matches!(err, ParamError::Schema(_)));

        let err = params.load_state(r#"{ "fundamental": "loud" }"#);
        assert!(matches!(err, Err(ParamError::Schema(_))));

        assert!(matches!(
            params.load_state("not json"),
            Err(ParamError::Json(_))
        ));

        assert_eq!(params.snapshot(), before);
    }

    #[test]
    fn test_concurrent_writes_are_never_torn() {
        let params = Arc::new(HarmonicParams::new());
        let writer_params = Arc::clone(&params);

        let writer = std::thread::spawn(move || {
            for i in 0..10_000 {
                let v = if i % 2 == 0 { -15.0 } else { 15.0 };
                writer_params.set(ParamId::OddHarmonics, v).unwrap();
            }
        });

        for _ in 0..10_000 {
            let v = params.snapshot().odd_harmonics_db;
            assert!(v == 0.0 || v == -15.0 || v == 15.0);
        }

        writer.join().unwrap();
    }
}
