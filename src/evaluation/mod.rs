//! Batch evaluation of forecast records
//!
//! Each record is scored on its own (CRPS, MAE of the implied mean, PIT);
//! the collection is then summarized with the configured aggregation policy,
//! bootstrap confidence intervals, rank-sum tests and PIT diagnostics.

mod evaluator;
mod scoring;

pub use evaluator::{Evaluator, GroupBreakdown, GroupComparison};
pub use scoring::{forecast_cdf, score_event, ScoredEvent, SkippedRecord};
