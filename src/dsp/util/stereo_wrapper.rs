//! Left/right pairs of mono processors.

use super::Effect;

/// Two independent instances of a mono [`Effect`], one per stereo channel.
/// Channels past the first two are passed through untouched, so a pair can
/// sit on a bus of any width.
#[derive(Clone, Debug)]
pub struct StereoWrapper<E> {
    pub l: E,
    pub r: E,
}

impl<E: Effect + Clone> StereoWrapper<E> {
    /// Both channels start as copies of `effect`.
    pub fn from_single(effect: E) -> Self {
        Self { l: effect.clone(), r: effect }
    }

    /// Applies the same change to both channels, e.g. new coefficients.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(&mut E)) {
        f(&mut self.l);
        f(&mut self.r);
    }
}

impl<E: Effect + Clone> Effect for StereoWrapper<E> {
    #[inline]
    fn process_mono(&mut self, input: f64, ch_idx: usize) -> f64 {
        match ch_idx {
            0 => self.l.process_mono(input, 0),
            1 => self.r.process_mono(input, 1),
            _ => input,
        }
    }

    fn reset(&mut self) {
        self.for_each_mut(Effect::reset);
    }

    fn get_sample_rate(&self) -> f64 {
        self.l.get_sample_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums every sample it has seen.
    #[derive(Clone, Debug, Default)]
    struct Accumulator(f64);

    impl Effect for Accumulator {
        fn process_mono(&mut self, input: f64, _: usize) -> f64 {
            self.0 += input;
            self.0
        }

        fn reset(&mut self) {
            self.0 = 0.0;
        }

        fn get_sample_rate(&self) -> f64 {
            48000.0
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut pair = StereoWrapper::from_single(Accumulator::default());

        pair.process_mono(1.0, 0);
        pair.process_mono(1.0, 0);
        pair.process_mono(5.0, 1);

        assert_eq!(pair.l.0, 2.0);
        assert_eq!(pair.r.0, 5.0);
        assert_eq!(pair.process_mono(0.75, 2), 0.75);

        pair.reset();
        assert_eq!(pair.l.0, 0.0);
        assert_eq!(pair.r.0, 0.0);
    }

    #[test]
    fn test_block_processing() {
        let mut pair = StereoWrapper::from_single(Accumulator::default());
        let mut block = [1.0_f32; 4];

        pair.process_block(&mut block, 1);

        assert_eq!(block, [1.0, 2.0, 3.0, 4.0]);
        assert_eq!(pair.l.0, 0.0);
    }
}
