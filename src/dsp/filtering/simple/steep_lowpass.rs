//! 24 dB/octave lowpass.

use super::*;
use crate::dsp::{BiquadCoefs, BiquadFilter, BiquadParams, Effect};

/// The section Qs of a 4th-order Butterworth response.
const SECTION_QS: [f64; 2] = [0.541_196_100_146_197, 1.306_562_964_876_376_5];

/// The cutoff is kept below this fraction of the sample rate so the sections
/// stay stable when the knob exceeds Nyquist at low sample rates.
const MAX_CUTOFF_RATIO: f64 = 0.45;

/// A cascade of two Butterworth biquad lowpasses, giving a 4th-order
/// (24 dB/octave) Butterworth response. Used to tame the harmonic
/// oscillators, which are not band-limited.
#[derive(Clone, Debug)]
pub struct SteepLowpass {
    sections: Vec<Box<dyn Filter>>,
    cutoff: f64,
    sample_rate: f64,
}

impl SteepLowpass {
    /// # Panics
    ///
    /// Panics if `sample_rate` is not positive.
    pub fn new(sample_rate: f64, cutoff: f64) -> Self {
        assert!(sample_rate > 0.0);
        let cutoff = clamp_cutoff(cutoff, sample_rate);

        let sections = SECTION_QS
            .iter()
            .map(|&q| {
                let mut section = BiquadFilter::new(sample_rate);
                section.set_params(&BiquadParams {
                    freq: cutoff,
                    gain: 0.0,
                    q,
                    filter_type: FilterType::Lowpass,
                });

                Box::new(section) as Box<dyn Filter>
            })
            .collect();

        Self { sections, cutoff, sample_rate }
    }

    /// Sets the cutoff frequency. The sections are only retuned if the
    /// (clamped) cutoff actually changed.
    pub fn set_cutoff(&mut self, cutoff: f64) {
        let cutoff = clamp_cutoff(cutoff, self.sample_rate);

        if cutoff == self.cutoff {
            return;
        }

        self.cutoff = cutoff;

        for section in &mut self.sections {
            section.set_freq(cutoff);
        }
    }

    pub const fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Returns the magnitude response at `freq` Hz in decibels.
    pub fn response_at(&self, freq: f64) -> f64 {
        SECTION_QS
            .iter()
            .map(|&q| {
                BiquadCoefs::lowpass(self.cutoff, q, self.sample_rate)
                    .response_at(freq, self.sample_rate)
            })
            .sum()
    }
}

impl Effect for SteepLowpass {
    fn process_mono(&mut self, mut input: f64, _: usize) -> f64 {
        for section in &mut self.sections {
            input = section.process(input);
        }

        input
    }

    fn reset(&mut self) {
        self.sections.iter_mut().for_each(|section| section.reset());
    }

    fn get_sample_rate(&self) -> f64 {
        self.sample_rate
    }
}

/// Never panics, and always lands strictly between zero and Nyquist.
fn clamp_cutoff(cutoff: f64, sample_rate: f64) -> f64 {
    cutoff.max(1.0).min(sample_rate * MAX_CUTOFF_RATIO)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 48000.0;

    #[test]
    fn test_butterworth_corner() {
        let filter = SteepLowpass::new(SR, 1000.0);

        assert!((filter.response_at(1000.0) + 3.0103).abs() < 0.05);
        assert!(filter.response_at(100.0).abs() < 0.01);
    }

    #[test]
    fn test_rolls_off_at_24_db_per_octave() {
        let filter = SteepLowpass::new(SR, 500.0);

        let one_octave = filter.response_at(2000.0);
        let two_octaves = filter.response_at(4000.0);
        assert!((two_octaves - one_octave) < -22.0);
    }

    #[test]
    fn test_sections_follow_cutoff() {
        let mut filter = SteepLowpass::new(SR, 20000.0);
        filter.set_cutoff(200.0);

        // a 5 kHz tone is more than four octaves above the corner
        let mut peak: f64 = 0.0;
        for i in 0..4800 {
            let x = (std::f64::consts::TAU * 5000.0 * f64::from(i) / SR).sin();
            let y = filter.process_mono(x, 0);
            if i >= 2400 {
                peak = peak.max(y.abs());
            }
        }

        assert!(peak < 0.001, "peak at 5 kHz: {peak}");
    }

    #[test]
    fn test_clone_carries_section_state() {
        let mut filter = SteepLowpass::new(SR, 1000.0);
        for _ in 0..64 {
            _ = filter.process_mono(1.0, 0);
        }

        let mut copy = filter.clone();
        assert_eq!(copy.process_mono(0.5, 0), filter.clone().process_mono(0.5, 0));

        // resetting the copy leaves the original alone
        copy.reset();
        assert_eq!(
            copy.process_mono(0.5, 0),
            SteepLowpass::new(SR, 1000.0).process_mono(0.5, 0)
        );
        assert_ne!(
            filter.process_mono(0.5, 0),
            SteepLowpass::new(SR, 1000.0).process_mono(0.5, 0)
        );
    }

    #[test]
    fn test_cutoff_is_clamped_below_nyquist() {
        let filter = SteepLowpass::new(22050.0, 20000.0);
        assert!(filter.cutoff() < 22050.0 / 2.0);
    }

    #[test]
    fn test_tiny_sample_rate_is_clamped_without_panicking() {
        let mut filter = SteepLowpass::new(1.0, 1000.0);
        assert!(filter.cutoff() > 0.0 && filter.cutoff() < 0.5);

        filter.set_cutoff(0.0);
        assert!(filter.cutoff() > 0.0 && filter.cutoff() < 0.5);
        assert!(filter.process_mono(1.0, 0).is_finite());
    }

    #[test]
    #[should_panic]
    fn test_zero_sample_rate_panics() {
        _ = SteepLowpass::new(0.0, 1000.0);
    }
}
