//! Report aggregation.
//!
//! Turns loaded calculation records into a department-grouped tree that a
//! document renderer can lay out directly.

mod aggregator;
mod normalize;

pub use aggregator::{DEFAULT_UNASSIGNED_LABEL, ReportAggregator};
pub use normalize::{NormalizedDay, normalize_days};
