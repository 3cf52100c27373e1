//! Coarse loudness measure used as a gate.

use crate::util::mean_abs;

/// Computes the mean absolute value of a captured window, in input units.
#[derive(Debug, Clone, Copy)]
pub struct VolumeEstimator {
    capture_gain: f32,
}

impl VolumeEstimator {
    /// `capture_gain` is the gain applied by the capture window, which is
    /// divided back out of the estimate.
    ///
    /// # Panics
    ///
    /// Panics if `capture_gain` is not positive.
    pub fn new(capture_gain: f32) -> Self {
        assert!(capture_gain > 0.0);
        Self { capture_gain }
    }

    pub fn estimate(&self, window: &[f32]) -> f32 {
        mean_abs(window) / self.capture_gain
    }
}
