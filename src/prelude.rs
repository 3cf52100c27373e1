//! Project-wide exports for easy access.

pub use crate::dsp::{DesignRequest, GroupId, GroupState, TrackedPitch};
pub use crate::engine::{DisplaySnapshot, EngineConfig, HarmonicEngine};
pub use crate::error::{EngineError, EngineResult, ParamError};
pub use crate::params::{HarmonicGainParams, HarmonicParams, ParamId};
pub use crate::settings::*;
pub use crate::util::*;
pub use atomic_float::{AtomicF32, AtomicF64};
pub use std::f64::consts::{FRAC_PI_2, PI, TAU};
