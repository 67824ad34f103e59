//! Forecast scoring metrics
//!
//! - MAE of a point forecast
//! - PIT value of a CDF forecast
//! - PIT histogram and KS uniformity diagnostics

mod pit;

pub use pit::{ks_uniform, PitConfig, PitDiagnostics, PitHistogram, UNIFORM_VARIANCE};

use crate::crps::PiecewiseCdf;

/// Mean absolute error of a single point forecast
pub fn mae(point: f64, realized: f64) -> f64 {
    (point - realized).abs()
}

/// Probability integral transform: forecast CDF evaluated at the outcome
pub fn pit(cdf: &PiecewiseCdf, realized: f64) -> f64 {
    cdf.cdf(realized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mae() {
        assert_eq!(mae(3.0, 1.0), 2.0);
        assert_eq!(mae(-1.0, 1.0), 2.0);
    }

    #[test]
    fn test_pit_of_median() {
        let cdf = PiecewiseCdf::from_pairs(&[(-1.0, 0.0), (0.0, 0.5), (1.0, 1.0)]).unwrap();
        assert_eq!(pit(&cdf, 0.0), 0.5);
        assert_eq!(pit(&cdf, 1.0), 1.0);
    }
}
