//! Transformation module.
//!
//! Building blocks shared by the steps, plus the run orchestration:
//! - Operations: cell coercion, rounding, year and postcode keys
//! - Reshape: header-row detection, melt and pivot
//! - Join: de-duplicated reference lookups and left joins
//! - Grouper: group-by sums
//! - Pipeline: run the steps and write the manifest

pub mod grouper;
pub mod join;
pub mod operations;
pub mod pipeline;
pub mod reshape;

pub use grouper::{aggregate, sum_by, Aggregate, OrderedFloat};
pub use join::{left_join, JoinStats, Lookup};
pub use pipeline::{execute, run};
