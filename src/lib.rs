//! Market Calibration - calibration statistics for market-implied forecasts
//!
//! This crate scores forecast distributions read off prediction-market quote
//! ladders against realized outcomes:
//! - Exact CRPS of piecewise-linear CDFs, with the step-function null that
//!   reduces CRPS to MAE
//! - Quote ladder to CDF construction (outer bounds, monotone repair)
//! - PIT histograms and KS uniformity checks
//! - Aggregation of CRPS/MAE ratios, bootstrap confidence intervals and
//!   rank-sum tests
//!
//! # Modules
//!
//! ## Core
//! - [`crps`] - Piecewise-linear CDFs and the exact CRPS evaluator
//! - [`ladder`] - Market quotes to knot sequences
//! - [`metrics`] - MAE, PIT and PIT diagnostics
//! - [`stats`] - Summaries, aggregation, bootstrap, rank-sum tests
//!
//! ## Pipeline
//! - [`data`] - Forecast records and JSON/CSV loading
//! - [`evaluation`] - Batch scoring and summary statistics
//! - [`report`] - Terminal and JSON reports
//! - [`config`] - Evaluation configuration
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```
//! use market_calibration::crps::{evaluate, crps_step};
//!
//! let knots = [(-5.0, 0.0), (-1.0, 0.1587), (0.0, 0.5), (1.0, 0.8413), (5.0, 1.0)];
//! let score = evaluate(&knots, 1.0).unwrap();
//! // The step-function null at the median scores |0 - 1| = 1
//! assert!(score < crps_step(0.0, 1.0).unwrap());
//! ```

// Core error handling
pub mod error;

// Scoring core
pub mod crps;
pub mod ladder;
pub mod metrics;
pub mod stats;

// Pipeline
pub mod config;
pub mod data;
pub mod evaluation;
pub mod report;

// Interface
pub mod cli;

pub use error::{CalibrationError, Result};

/// Prelude for common imports
pub mod prelude {
    pub use crate::config::EvaluationConfig;
    pub use crate::crps::{crps, crps_step, evaluate, Knot, PiecewiseCdf};
    pub use crate::data::{ForecastLoader, ForecastRecord};
    pub use crate::error::{CalibrationError, Result};
    pub use crate::evaluation::{score_event, Evaluator, ScoredEvent};
    pub use crate::ladder::{BoundsPolicy, LadderBuilder, LadderConfig, Quote, QuoteKind};
    pub use crate::report::EvaluationReport;
    pub use crate::stats::{AggregationPolicy, BootstrapConfig};
}
