//! A low-rate feed of engine state for a UI.

use super::shared::SharedState;
use crate::dsp::GroupId;
use crate::params::{HarmonicGainParams, HarmonicParams};
use crate::util::{AtomicOps, TimerThread};
use std::{io, sync::Arc};
use triple_buffer::{triple_buffer, Output};

/// What a UI needs to draw the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DisplaySnapshot {
    pub fundamental_hz: f32,
    pub cycle_samples: u32,
    pub average_volume: f32,
    pub params: HarmonicGainParams,
    pub active_group: GroupId,
}

impl DisplaySnapshot {
    fn capture(shared: &SharedState, params: &HarmonicParams) -> Self {
        let pitch = shared.tracked_pitch();

        Self {
            fundamental_hz: pitch.freq_hz,
            cycle_samples: pitch.cycle_samples,
            average_volume: shared.average_volume.la(),
            params: params.snapshot(),
            active_group: shared.filter_bank.active_group(),
        }
    }
}

/// Publishes a [`DisplaySnapshot`] at a fixed rate from its own thread.
/// Stops when dropped.
pub struct DisplayFeed {
    timer: TimerThread,
}

impl DisplayFeed {
    /// Starts the feed, returning it alongside the reading end.
    ///
    /// # Errors
    ///
    /// Returns an error if the timer thread could not be spawned.
    ///
    /// # Panics
    ///
    /// Panics if `rate_hz` is not positive.
    pub fn start(
        shared: Arc<SharedState>,
        params: Arc<HarmonicParams>,
        rate_hz: f64,
    ) -> io::Result<(Self, Output<DisplaySnapshot>)> {
        let initial = DisplaySnapshot::capture(&shared, &params);
        let (mut input, output) = triple_buffer(&initial);

        let mut timer = TimerThread::new("harmonic-display", move || {
            input.write(DisplaySnapshot::capture(&shared, &params));
        });
        timer.start_hz(rate_hz)?;

        log::debug!("display feed started at {rate_hz} Hz");

        Ok((Self { timer }, output))
    }

    pub fn stop(&mut self) {
        self.timer.stop();
    }

    pub const fn is_running(&self) -> bool {
        self.timer.is_running()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::TrackedPitch;
    use crate::params::ParamId;
    use std::time::{Duration, Instant};

    #[test]
    fn test_feed_follows_shared_state() {
        let shared = Arc::new(SharedState::new(TrackedPitch::default()));
        let params = Arc::new(HarmonicParams::new());

        let (mut feed, mut output) =
            DisplayFeed::start(Arc::clone(&shared), Arc::clone(&params), 100.0)
                .unwrap();
        assert!(feed.is_running());
        assert_eq!(output.read().fundamental_hz, 100.0);

        shared.pitch.sr_rel(TrackedPitch { freq_hz: 110.0, cycle_samples: 436 });
        params.set(ParamId::Fundamental, 9.0).unwrap();

        let start = Instant::now();
        while start.elapsed() < Duration::from_secs(5) {
            let snapshot = output.read();
            if snapshot.cycle_samples == 436 && snapshot.params.fundamental_db == 9.0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        let snapshot = *output.read();
        assert_eq!(snapshot.fundamental_hz, 110.0);
        assert_eq!(snapshot.params.fundamental_db, 9.0);

        feed.stop();
        assert!(!feed.is_running());
    }
}
