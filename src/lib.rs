#![allow(
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::return_self_not_must_use,
    clippy::redundant_closure_for_method_calls
)]

// Host-facing engine, worker and display feed
pub mod engine;

// Signal processing
pub mod dsp;

// Error types
pub mod error;

// User parameters and persisted state
pub mod params;

// General utilities
pub mod util;

// Some widely-used re-exports
pub mod prelude;

// Program-wide settings
pub mod settings;

pub use engine::{EngineConfig, HarmonicEngine};
pub use error::{EngineError, EngineResult, ParamError};
pub use params::{HarmonicParams, ParamId};
