//! Piecewise CRPS evaluation
//!
//! Provides:
//! - [`PiecewiseCdf`] - validated knot sequence with linear interpolation
//! - [`crps`] / [`evaluate`] - exact CRPS by segment-wise integration
//! - [`segment_integral`] - the closed-form primitive every segment reduces to
//!
//! For the step-function null (all mass at `m`) the score equals `|m - y|`
//! exactly, so CRPS against that null is the MAE of the point forecast.

mod cdf;
mod evaluator;

pub use cdf::{Knot, PiecewiseCdf, PROBABILITY_TOLERANCE};
pub use evaluator::{crps, crps_step, evaluate, segment_integral};
