//! Simple filters built from other filter types.

use super::*;

pub mod steep_lowpass;

pub use steep_lowpass::SteepLowpass;
