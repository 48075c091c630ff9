//! Analysis modules.
//!
//! Aggregation views over the sales table and the numeric helpers
//! they are built on.

pub mod aggregator;
pub mod stats;

pub use aggregator::*;
