//! General-purpose utility functions.

/// Calculates amplitude in decibels from a linear power level.
#[inline]
pub fn level_to_db(level: f64) -> f64 {
    20.0 * level.log10()
}

/// Calculates the linear power level from amplitude as decibels.
#[inline]
pub fn db_to_level(db_value: f64) -> f64 {
    10.0f64.powf(db_value / 20.0)
}

/// Calculates the linear power level from amplitude as decibels.
#[inline]
pub fn db_to_level_f32(db_value: f32) -> f32 {
    10.0f32.powf(db_value / 20.0)
}

/// Returns whether `value` and `target` are equal, with a tolerance of
/// [`f64::EPSILON`].
pub fn epsilon_eq(value: f64, target: f64) -> bool {
    (target - value).abs() < f64::EPSILON
}

/// Returns the mean of the absolute values in `buffer`, or `0.0` if it is
/// empty. Accumulates in `f64`.
pub fn mean_abs(buffer: &[f32]) -> f32 {
    if buffer.is_empty() {
        return 0.0;
    }

    let sum: f64 = buffer.iter().map(|&x| f64::from(x.abs())).sum();
    (sum / buffer.len() as f64) as f32
}

/// Returns the number of samples in one period of `freq_hz`, rounded to the
/// nearest sample and never less than one.
///
/// # Panics
///
/// Panics in debug mode if `freq_hz` is not positive.
pub fn period_in_samples(freq_hz: f32, sample_rate: f64) -> u32 {
    debug_assert!(freq_hz > 0.0);
    let period = (sample_rate / f64::from(freq_hz)).round();

    if period.is_finite() && period >= 1.0 {
        period as u32
    }
    else {
        1
    }
}
