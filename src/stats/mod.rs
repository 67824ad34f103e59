//! Statistical utilities
//!
//! Provides:
//! - Descriptive summaries and quantiles
//! - Aggregation policies for CRPS/MAE skill ratios
//! - Seeded percentile bootstrap confidence intervals
//! - Mann-Whitney rank-sum test
//! - Normal CDF helpers

mod aggregation;
mod bootstrap;
mod distribution;
mod rank_sum;
mod summary;

pub use aggregation::{ratios, AggregationPolicy};
pub use bootstrap::{bootstrap_mean, bootstrap_ratio, bootstrap_statistic, BootstrapConfig, ConfidenceInterval};
pub use distribution::{erf, normal_cdf, normal_pdf, two_sided_p_value};
pub use rank_sum::{mann_whitney_u, RankSumTest};
pub use summary::{median, quantile, sorted_copy, StatsSummary};
