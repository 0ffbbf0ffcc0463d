//! Analysis modules.
//!
//! Field parsing and the aggregation pass over trip records.

pub mod aggregator;
pub mod fields;

pub use aggregator::*;
