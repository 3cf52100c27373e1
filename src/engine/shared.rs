//! State shared between the audio thread, the analysis worker and the display
//! feed.

use crate::dsp::{FilterBankShared, TrackedPitch};
use crate::util::AtomicOps;
use atomic::Atomic;
use atomic_float::AtomicF32;

/// Everything published across threads. Each value has a single writer: the
/// worker writes the pitch, volume and designed coefficients, and the audio
/// thread writes the filter bank's active group.
#[derive(Debug)]
pub struct SharedState {
    pub pitch: Atomic<TrackedPitch>,
    /// Mean absolute input level of the last analysed window.
    pub average_volume: AtomicF32,
    pub filter_bank: FilterBankShared,
}

impl SharedState {
    pub fn new(initial_pitch: TrackedPitch) -> Self {
        Self {
            pitch: Atomic::new(initial_pitch),
            average_volume: AtomicF32::new(0.0),
            filter_bank: FilterBankShared::new(),
        }
    }

    pub fn tracked_pitch(&self) -> TrackedPitch {
        self.pitch.la()
    }

    pub fn average_volume(&self) -> f32 {
        self.average_volume.la()
    }

    /// Restores the initial state. Only call this while neither the audio
    /// thread nor the worker is running.
    pub fn reset(&self, initial_pitch: TrackedPitch) {
        self.pitch.sr_rel(initial_pitch);
        self.average_volume.sr_rel(0.0);
        self.filter_bank.reset();
    }
}
