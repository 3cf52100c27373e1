//! Digital signal processors and utilities.

pub mod analysis;
pub mod filtering;
pub mod harmonic;
pub mod synthesis;
pub mod util;

pub use analysis::{
    CaptureWindow, PitchDecision, PitchTracker, PitchTrackerConfig,
    RejectReason, TrackedPitch, VolumeEstimator,
};
pub use filtering::{
    biquad::{BiquadCoefs, BiquadFilter, BiquadParams, BiquadState},
    simple::SteepLowpass,
    Filter, FilterType, BUTTERWORTH_Q,
};
pub use harmonic::{
    CoefficientSet, DesignRequest, DoubleBufferedFilterBank, FilterBankShared,
    GroupId, GroupState, HarmonicFilterChain, HarmonicFilterDesigner,
    SwapOutcome,
};
pub use synthesis::{HarmonicOscillators, SynthBlockSettings};
pub use util::*;
