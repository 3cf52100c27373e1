//! Time-domain pitch tracking.
//!
//! The period search slides a short reference window (the head of the
//! capture) across the rest of the capture, scoring each lag by the sum of
//! absolute differences (SAD). The first pronounced dip in the score is the
//! period. [`PitchTracker`] then decides whether the resulting candidate is
//! trustworthy enough to replace the tracked pitch.

use crate::settings::*;
use crate::util::period_in_samples;
use bytemuck::NoUninit;

/// The tracked fundamental and its period, published together.
///
/// This is 8 bytes with 8-byte alignment so that it can be stored in a
/// lock-free `Atomic<TrackedPitch>`, which guarantees the two fields are
/// never observed out of step.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C, align(8))]
pub struct TrackedPitch {
    pub freq_hz: f32,
    /// Always at least `1`.
    pub cycle_samples: u32,
}

// safety: two 4-byte fields filling an 8-byte aligned struct, no padding.
unsafe impl NoUninit for TrackedPitch {}

impl TrackedPitch {
    /// A pitch of `freq_hz` with the matching period at `sample_rate`.
    pub fn from_freq(freq_hz: f32, sample_rate: f64) -> Self {
        Self { freq_hz, cycle_samples: period_in_samples(freq_hz, sample_rate) }
    }
}

impl Default for TrackedPitch {
    fn default() -> Self {
        Self::from_freq(INITIAL_FREQ_HZ, 48000.0)
    }
}

/// Parameters of the SAD period search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchSearch {
    /// Length of the reference window taken from the head of the capture.
    pub reference_len: usize,
    /// The first lag considered.
    pub min_lag: usize,
    /// Absolute margin by which a dip must beat the current best.
    pub dip_margin: f32,
    /// Margin relative to the reference window's energy.
    pub relative_dip_margin: f32,
}

impl Default for PitchSearch {
    fn default() -> Self {
        Self {
            reference_len: REFERENCE_WINDOW_SIZE,
            min_lag: MIN_SEARCH_LAG,
            dip_margin: DIP_MARGIN,
            relative_dip_margin: RELATIVE_DIP_MARGIN,
        }
    }
}

/// Searches `window` for its dominant period and returns it in samples.
///
/// A lag is only taken if its score is a local minimum at most
/// [`MAX_DIP_WIDTH`] lags wide, and beats the best dip so far by the search
/// margin. This keeps later multiples of the period, which score about as
/// well as the period itself, from displacing it.
///
/// A flat-bottomed minimum is skipped. Below about 94 Hz at 48 kHz the
/// half-cycle of a square is longer than the reference window, and a
/// reference that sits inside one half-cycle matches a whole run of lags
/// equally well. The first of those is not the period.
///
/// Returns `None` if the window is too short, the reference window does not
/// vary, or no dip qualifies.
pub fn find_period(window: &[f32], search: &PitchSearch) -> Option<usize> {
    let s = search.reference_len;
    let end = window.len().checked_sub(s)?;

    if search.min_lag + 2 > end {
        return None;
    }

    let (reference, _) = window.split_at(s);
    if !varies(reference) {
        return None;
    }

    let energy: f32 = reference.iter().map(|x| x.abs()).sum();
    let margin = search.dip_margin.max(search.relative_dip_margin * energy);
    let flat = FLAT_SCORE_TOLERANCE * energy;

    let sad = |lag: usize| -> f32 {
        reference
            .iter()
            .zip(&window[lag..lag + s])
            .map(|(a, b)| (a - b).abs())
            .sum()
    };

    let mut best_lag = None;
    let mut best_score = f32::INFINITY;

    // the score of the previous lag, how many equal scores end there, and
    // whether that run was reached by falling
    let mut centre = sad(search.min_lag);
    let mut width = 1;
    let mut falling = false;

    for lag in (search.min_lag + 1)..end {
        let after = sad(lag);

        if (after - centre).abs() <= flat {
            width += 1;
        }
        else if after > centre {
            if falling && width <= MAX_DIP_WIDTH && centre < best_score - margin
            {
                best_lag = Some(lag - width);
                best_score = centre;
            }

            falling = false;
            width = 1;
        }
        else {
            falling = true;
            width = 1;
        }

        centre = after;
    }

    best_lag
}

/// Whether `reference` holds anything but a constant.
fn varies(reference: &[f32]) -> bool {
    let (lo, hi) = reference
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &x| {
            (lo.min(x), hi.max(x))
        });

    hi > lo
}

/// Thresholds deciding whether a period candidate replaces the tracked pitch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchTrackerConfig {
    pub search: PitchSearch,
    /// Average volume (input units) which must be exceeded.
    pub volume_gate: f32,
    /// A candidate lag within this many samples of the current period is
    /// treated as jitter.
    pub min_sample_shift: u32,
    pub min_freq_hz: f32,
    pub max_freq_hz: f32,
    /// Consecutive candidates within this many Hz confirm one another.
    pub stability_tolerance_hz: f32,
    /// Tolerance of the octave error guard.
    pub octave_tolerance_hz: f32,
    /// How many consecutive agreeing passes an octave jump needs before it is
    /// believed.
    pub octave_confirmations: u32,
}

impl Default for PitchTrackerConfig {
    fn default() -> Self {
        Self {
            search: PitchSearch::default(),
            volume_gate: VOLUME_GATE,
            min_sample_shift: MIN_SAMPLE_SHIFT,
            min_freq_hz: MIN_TRACKED_FREQ_HZ,
            max_freq_hz: MAX_TRACKED_FREQ_HZ,
            stability_tolerance_hz: STABILITY_TOLERANCE_HZ,
            octave_tolerance_hz: OCTAVE_TOLERANCE_HZ,
            octave_confirmations: OCTAVE_CONFIRMATIONS,
        }
    }
}

/// Why a candidate was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The input is too quiet to trust.
    BelowVolumeGate,
    /// The search found no qualifying dip.
    NoPeriodFound,
    /// The candidate period is too close to the current one to matter.
    WithinJitter,
    /// The candidate lies outside the trackable range.
    OutOfRange,
    /// The candidate is an octave away from the tracked pitch and has not
    /// persisted long enough.
    OctaveError,
    /// The candidate has not yet been confirmed by a second pass.
    Unconfirmed,
}

/// The outcome of one analysis pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PitchDecision {
    Accepted(TrackedPitch),
    Rejected(RejectReason),
}

/// Turns period candidates into pitch updates, with hysteresis.
///
/// A candidate is accepted only if the volume gate passes, it moves the
/// period by more than the jitter threshold, it is within range, and it
/// agrees with the previous pass's candidate. Candidates an octave away from
/// the tracked pitch must agree across more passes than that before they are
/// accepted.
#[derive(Debug, Clone)]
pub struct PitchTracker {
    config: PitchTrackerConfig,
    last_seen_hz: f32,
    /// How many consecutive passes have produced agreeing candidates,
    /// including the latest.
    streak: u32,
}

impl PitchTracker {
    pub fn new(config: PitchTrackerConfig) -> Self {
        Self { config, last_seen_hz: 0.0, streak: 0 }
    }

    pub const fn config(&self) -> &PitchTrackerConfig {
        &self.config
    }

    /// The most recent in-range candidate, accepted or not.
    pub const fn last_seen_hz(&self) -> f32 {
        self.last_seen_hz
    }

    /// Runs the period search over `window` and applies the acceptance
    /// policy against the `current` tracked pitch.
    pub fn analyse(
        &mut self,
        window: &[f32],
        current: TrackedPitch,
        average_volume: f32,
        sample_rate: f64,
    ) -> PitchDecision {
        if average_volume <= self.config.volume_gate {
            return PitchDecision::Rejected(RejectReason::BelowVolumeGate);
        }

        match find_period(window, &self.config.search) {
            Some(lag) => self.consider(lag, current, sample_rate),
            None => PitchDecision::Rejected(RejectReason::NoPeriodFound),
        }
    }

    /// Applies the acceptance policy to a lag found by the period search.
    /// The volume gate is assumed to have passed.
    pub fn consider(
        &mut self,
        lag: usize,
        current: TrackedPitch,
        sample_rate: f64,
    ) -> PitchDecision {
        use RejectReason as R;
        let cfg = &self.config;

        // lags are bounded by the capture length, far below u32::MAX
        let lag = u32::try_from(lag).unwrap_or(u32::MAX).max(1);

        if lag.abs_diff(current.cycle_samples) <= cfg.min_sample_shift {
            return PitchDecision::Rejected(R::WithinJitter);
        }

        let candidate = (sample_rate / f64::from(lag)) as f32;

        if !(cfg.min_freq_hz..=cfg.max_freq_hz).contains(&candidate) {
            return PitchDecision::Rejected(R::OutOfRange);
        }

        if (candidate - self.last_seen_hz).abs() <= cfg.stability_tolerance_hz
        {
            self.streak = self.streak.saturating_add(1);
        }
        else {
            self.streak = 1;
        }
        self.last_seen_hz = candidate;

        if self.is_octave_jump(candidate, current.freq_hz)
            && self.streak < cfg.octave_confirmations
        {
            return PitchDecision::Rejected(R::OctaveError);
        }

        if self.streak < 2 {
            return PitchDecision::Rejected(R::Unconfirmed);
        }

        PitchDecision::Accepted(TrackedPitch {
            freq_hz: candidate,
            cycle_samples: lag,
        })
    }

    /// Clears the confirmation history.
    pub fn reset(&mut self) {
        self.last_seen_hz = 0.0;
        self.streak = 0;
    }

    fn is_octave_jump(&self, candidate: f32, tracked: f32) -> bool {
        let tol = self.config.octave_tolerance_hz;
        let halved = (2.0 * candidate - tracked).abs() <= tol;
        let doubled = (candidate - 2.0 * tracked).abs() <= 2.0 * tol;

        halved || doubled
    }
}
