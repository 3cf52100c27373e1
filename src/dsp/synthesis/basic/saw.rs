//! Sawtooth generator.

use super::*;

/// A falling ramp driven by a descending sample counter.
///
/// The output is `counter / period`, so it falls from `1.0` towards `0.0`
/// across each cycle.
#[derive(Debug, Clone, Copy)]
pub struct SawOsc {
    counter: u32,
    period: u32,
}

impl SawOsc {
    pub fn new(period_samples: u32) -> Self {
        let period = period_samples.max(1);
        Self { counter: period, period }
    }

    pub const fn period(&self) -> u32 {
        self.period
    }
}

impl GeneratorProcessor for SawOsc {
    fn process(&mut self) -> f32 {
        self.counter = self.counter.saturating_sub(1);

        if self.counter == 0 {
            self.counter = self.period;
        }

        (self.counter as f32) / (self.period as f32)
    }

    fn set_period(&mut self, period_samples: u32) {
        self.period = period_samples.max(1);
        self.counter = self.counter.min(self.period);
    }

    fn reset(&mut self) {
        self.counter = self.period;
    }
}
