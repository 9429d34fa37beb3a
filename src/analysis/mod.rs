//! Analysis modules.
//!
//! Aggregation over the selected regions. Everything here is a pure
//! function of its inputs.

pub mod aggregator;

pub use aggregator::*;
