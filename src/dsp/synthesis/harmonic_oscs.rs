//! The odd/even harmonic synthesisers, locked to the tracked fundamental.
//!
//! The square wave carries the odd harmonics of the fundamental but is
//! controlled by the "even" synth knobs, and the sawtooth (which carries
//! every harmonic) by the "odd" synth knobs.

use super::*;
use crate::dsp::{filtering::simple::SteepLowpass, Effect};
use crate::settings::SYNTH_OFF_DB;
use crate::util::db_to_level_f32;

/// Everything the oscillators need for one block, snapshotted by the audio
/// thread at the start of the block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthBlockSettings {
    /// The tracked period in samples.
    pub period_samples: u32,
    /// The current average input volume, used as the output level.
    pub level: f32,
    /// The volume gate the level must exceed for synthesis to run.
    pub gate: f32,
    /// Square (even knob) gain in decibels.
    pub even_gain_db: f32,
    /// Square lowpass cutoff in Hz.
    pub even_cutoff_hz: f32,
    /// Saw (odd knob) gain in decibels.
    pub odd_gain_db: f32,
    /// Saw lowpass cutoff in Hz.
    pub odd_cutoff_hz: f32,
}

impl SynthBlockSettings {
    fn is_gated(&self) -> bool {
        self.level <= self.gate
    }

    pub fn square_enabled(&self) -> bool {
        self.even_gain_db > SYNTH_OFF_DB && !self.is_gated()
    }

    pub fn saw_enabled(&self) -> bool {
        self.odd_gain_db > SYNTH_OFF_DB && !self.is_gated()
    }
}

/// A square and a saw oscillator, each followed by a 24 dB/octave lowpass,
/// rendering into preallocated block buffers.
#[derive(Debug, Clone)]
pub struct HarmonicOscillators {
    square: SquareOsc,
    saw: SawOsc,

    even_lowpass: SteepLowpass,
    odd_lowpass: SteepLowpass,

    square_buffer: Vec<f32>,
    saw_buffer: Vec<f32>,

    square_active: bool,
    saw_active: bool,
}

impl HarmonicOscillators {
    /// # Panics
    ///
    /// Panics if `max_block_size == 0` or if `sample_rate` is not positive.
    pub fn new(
        sample_rate: f64,
        max_block_size: usize,
        period_samples: u32,
    ) -> Self {
        assert_ne!(max_block_size, 0);
        let cutoff = sample_rate / 2.0;

        Self {
            square: SquareOsc::new(period_samples),
            saw: SawOsc::new(period_samples),

            even_lowpass: SteepLowpass::new(sample_rate, cutoff),
            odd_lowpass: SteepLowpass::new(sample_rate, cutoff),

            square_buffer: vec![0.0; max_block_size],
            saw_buffer: vec![0.0; max_block_size],

            square_active: false,
            saw_active: false,
        }
    }

    /// Renders the next `len` samples of both oscillators. An oscillator which
    /// is off or gated does not advance and contributes nothing.
    ///
    /// # Panics
    ///
    /// Panics if `len` exceeds the block size given to `new()`.
    pub fn render(&mut self, len: usize, settings: &SynthBlockSettings) {
        assert!(len <= self.square_buffer.len());

        self.square_active = settings.square_enabled();
        self.saw_active = settings.saw_enabled();

        if self.square_active {
            let amp = db_to_level_f32(settings.even_gain_db) * settings.level;
            self.square.set_period(settings.period_samples);
            self.even_lowpass
                .set_cutoff(f64::from(settings.even_cutoff_hz));

            let buf = &mut self.square_buffer[..len];
            for x in buf.iter_mut() {
                *x = self.square.process() * amp;
            }
            self.even_lowpass.process_block(buf, 0);
        }

        if self.saw_active {
            let amp = db_to_level_f32(settings.odd_gain_db) * settings.level;
            self.saw.set_period(settings.period_samples);
            self.odd_lowpass.set_cutoff(f64::from(settings.odd_cutoff_hz));

            let buf = &mut self.saw_buffer[..len];
            for x in buf.iter_mut() {
                *x = self.saw.process() * amp;
            }
            self.odd_lowpass.process_block(buf, 0);
        }
    }

    /// The synthesised sample at `idx` of the last rendered block, or `0.0`
    /// if neither oscillator is active.
    #[inline]
    pub fn sample_at(&self, idx: usize) -> f32 {
        let mut out = 0.0;

        if self.square_active {
            out += self.square_buffer[idx];
        }
        if self.saw_active {
            out += self.saw_buffer[idx];
        }

        out
    }

    pub const fn is_active(&self) -> bool {
        self.square_active || self.saw_active
    }

    pub fn reset(&mut self) {
        self.square.reset();
        self.saw.reset();
        self.even_lowpass.reset();
        self.odd_lowpass.reset();
        self.square_active = false;
        self.saw_active = false;
    }
}
