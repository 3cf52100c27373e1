//! Trait for audio-processing types.

/// A per-sample audio processor which may hold state for several channels.
pub trait Effect: Send + std::fmt::Debug {
    /// Processes one sample of channel `ch_idx`.
    fn process_mono(&mut self, input: f64, ch_idx: usize) -> f64;

    /// Processes a block of channel `ch_idx` in place.
    fn process_block(&mut self, block: &mut [f32], ch_idx: usize) {
        for sample in block {
            *sample = self.process_mono(f64::from(*sample), ch_idx) as f32;
        }
    }

    /// Clears any internal state.
    fn reset(&mut self) {}

    fn get_sample_rate(&self) -> f64;
}
