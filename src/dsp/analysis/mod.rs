//! Signal analysis used for pitch tracking.

pub mod capture;
pub mod pitch;
pub mod volume;

pub use capture::CaptureWindow;
pub use pitch::{
    find_period, PitchDecision, PitchSearch, PitchTracker, PitchTrackerConfig,
    RejectReason, TrackedPitch,
};
pub use volume::VolumeEstimator;
