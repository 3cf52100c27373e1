//! Second-order biquad filter and its coefficient designs.

#![allow(clippy::must_use_candidate)]
mod coefs;
mod filter;
use super::{Filter, FilterType};

pub use coefs::BiquadCoefs;
pub use filter::*;
