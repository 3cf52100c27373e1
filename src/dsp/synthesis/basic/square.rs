//! Square wave generator.

use super::*;

/// Basic non-antialiased square wave oscillator driven by a sample counter.
///
/// The counter is advanced before each sample and wraps at the period. The
/// output is high while the counter is in the first half of the cycle.
#[derive(Debug, Clone, Copy)]
pub struct SquareOsc {
    counter: u32,
    period: u32,
}

impl SquareOsc {
    pub fn new(period_samples: u32) -> Self {
        Self { counter: 0, period: period_samples.max(1) }
    }

    pub const fn period(&self) -> u32 {
        self.period
    }
}

impl GeneratorProcessor for SquareOsc {
    fn process(&mut self) -> f32 {
        self.counter += 1;

        if self.counter >= self.period {
            self.counter = 0;
        }

        if self.counter < self.period / 2 { 1.0 } else { -1.0 }
    }

    fn set_period(&mut self, period_samples: u32) {
        self.period = period_samples.max(1);
    }

    fn reset(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duty_cycle() {
        let mut osc = SquareOsc::new(100);
        let cycle: Vec<f32> = (0..100).map(|_| osc.process()).collect();

        let high = cycle.iter().filter(|&&x| x > 0.0).count();
        assert_eq!(high, 50);
    }

    #[test]
    fn test_period_is_locked() {
        let mut osc = SquareOsc::new(436);
        let first: Vec<f32> = (0..436).map(|_| osc.process()).collect();
        let second: Vec<f32> = (0..436).map(|_| osc.process()).collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_shrinking_period_wraps_immediately() {
        let mut osc = SquareOsc::new(1000);
        for _ in 0..900 {
            _ = osc.process();
        }

        osc.set_period(10);
        _ = osc.process();
        assert!(osc.counter < 10);
    }

    #[test]
    fn test_zero_period_is_clamped() {
        let mut osc = SquareOsc::new(0);
        assert_eq!(osc.period(), 1);
        assert!(osc.process().abs() == 1.0);
    }
}
