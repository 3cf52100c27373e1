//! Global constants.
//!
//! These are the defaults used by [`EngineConfig`](crate::engine::EngineConfig)
//! and the parameter store. Nothing here is mutable at runtime; per-instance
//! values live in the engine.

/// The number of samples in the large capture window.
pub const CAPTURE_WINDOW_SIZE: usize = 3000;

/// The number of samples in the small reference window which is slid across
/// the large window during the pitch search.
pub const REFERENCE_WINDOW_SIZE: usize = 256;

/// The first candidate lag of the pitch search. Lags below this always match
/// the reference window closely, so they are skipped.
pub const MIN_SEARCH_LAG: usize = 8;

/// Samples are scaled by this before entering the capture window.
pub const CAPTURE_GAIN: f32 = 8.0;

/// The average volume (in input units) which must be exceeded before pitch
/// updates and synthesis are allowed.
pub const VOLUME_GATE: f32 = 0.05 / CAPTURE_GAIN;

/// The absolute margin by which a new dip must beat the current best score.
pub const DIP_MARGIN: f32 = 1.8;

/// The margin by which a new dip must beat the current best score, relative
/// to the energy of the reference window.
pub const RELATIVE_DIP_MARGIN: f32 = 0.05;

/// Neighbouring lag scores closer than this, relative to the energy of the
/// reference window, count as equal.
pub const FLAT_SCORE_TOLERANCE: f32 = 1e-4;

/// A minimum spanning more equal-scoring lags than this is flat-bottomed, and
/// is never taken as the period.
pub const MAX_DIP_WIDTH: usize = 2;

/// A new lag must differ from the current cycle length by more than this many
/// samples to be considered.
pub const MIN_SAMPLE_SHIFT: u32 = 5;

/// Two consecutive candidates within this many Hz of each other confirm one
/// another.
pub const STABILITY_TOLERANCE_HZ: f32 = 5.0;

/// A candidate is an octave below the tracked pitch if twice the candidate is
/// within this many Hz of it. Twice this tolerance is used for an octave
/// above.
pub const OCTAVE_TOLERANCE_HZ: f32 = 1.5;

/// The number of consecutive agreeing passes an octave jump needs before it
/// replaces the tracked pitch.
pub const OCTAVE_CONFIRMATIONS: u32 = 3;

/// The lowest trackable fundamental (around E1).
pub const MIN_TRACKED_FREQ_HZ: f32 = 40.0;

/// The highest trackable fundamental (around G4).
pub const MAX_TRACKED_FREQ_HZ: f32 = 392.0;

/// The fundamental assumed before the first pitch is accepted.
pub const INITIAL_FREQ_HZ: f32 = 100.0;

/// The quality factor of every harmonic peaking filter.
pub const HARMONIC_FILTER_Q: f64 = 10.0;

/// The number of harmonic bands per channel.
pub const NUM_HARMONIC_BANDS: usize = 7;

/// The number of coefficients stored per biquad (`b0, b1, b2, a1, a2`).
pub const NUM_BIQUAD_COEFS: usize = 5;

/// The channel used for pitch tracking when the input has more than one.
pub const PITCH_TRACKING_CHANNEL: usize = 1;

/// The synth gain value which represents "off".
pub const SYNTH_OFF_DB: f32 = -100.0;

/// The lowest sample rate the engine can be prepared at.
pub const MIN_SAMPLE_RATE: f64 = 8000.0;

/// The maximum size of an audio block. Larger host buffers are broken down
/// into blocks of this size.
pub const MAX_BLOCK_SIZE: usize = 1 << 10; // 1024

/// The rate at which the display snapshot is refreshed.
pub const DISPLAY_REFRESH_RATE_HZ: f64 = 10.0;

/// The depth of the analysis job queue. One volume pass, one pitch pass, and
/// one coefficient design may be pending at once.
pub const ANALYSIS_QUEUE_SIZE: usize = 3;

/// The name given to the background analysis thread.
pub const ANALYSIS_THREAD_NAME: &str = "harmonic-analysis";
