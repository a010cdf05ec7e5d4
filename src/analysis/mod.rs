//! Analysis modules.
//!
//! Hit normalization, grouping and containment dedup live in the aggregator.

pub mod aggregator;

pub use aggregator::*;
