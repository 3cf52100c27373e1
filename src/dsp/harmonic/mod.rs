//! The harmonic EQ: coefficient design and the double-buffered filter bank.

pub mod designer;
pub mod filter_bank;

pub use designer::{
    Band, CoefficientSet, DesignRequest, HarmonicFilterDesigner, BANDS,
};
pub use filter_bank::{
    CoefficientSlot, DoubleBufferedFilterBank, FilterBankShared, GroupId,
    GroupState, HarmonicFilterChain, SwapOutcome,
};
