//! Exact CRPS for piecewise-linear CDFs
//!
//! CRPS(F, y) = integral over x of (F(x) - 1{x >= y})^2. Between two knots the
//! difference `F(x) - 1{x >= y}` is linear, so each segment reduces to the
//! closed-form integral of a squared linear function.

use super::cdf::{Knot, PiecewiseCdf};
use crate::error::{CalibrationError, Result};

/// Integral of `a(x)^2` over a segment of width `dx` where `a` runs linearly from `a0` to `a1`.
///
/// `dx * (a0^2 + a0*a1 + a1^2) / 3`. Zero-width or malformed segments
/// contribute nothing.
#[inline]
pub fn segment_integral(a0: f64, a1: f64, dx: f64) -> f64 {
    if !(dx > 0.0) || !dx.is_finite() {
        return 0.0;
    }
    dx * (a0 * a0 + a0 * a1 + a1 * a1) / 3.0
}

/// Contribution of one segment `[left.x, right.x]` for outcome `y`
fn segment_contribution(left: Knot, right: Knot, y: f64) -> f64 {
    let dx = right.x - left.x;
    if !(dx > 0.0) {
        return 0.0;
    }

    if y <= left.x {
        // Indicator already 1 on the whole segment
        segment_integral(left.f - 1.0, right.f - 1.0, dx)
    } else if y >= right.x {
        segment_integral(left.f, right.f, dx)
    } else {
        let f_y = left.f + (y - left.x) / dx * (right.f - left.f);
        segment_integral(left.f, f_y, y - left.x) + segment_integral(f_y - 1.0, right.f - 1.0, right.x - y)
    }
}

/// CRPS of a validated CDF against a realized outcome
pub fn crps(cdf: &PiecewiseCdf, realized: f64) -> Result<f64> {
    if !realized.is_finite() {
        return Err(CalibrationError::invalid(format!(
            "realized value {} is not finite",
            realized
        )));
    }
    if !cdf.contains(realized) {
        let (lo, hi) = cdf.support();
        return Err(CalibrationError::invalid(format!(
            "realized value {} outside support [{}, {}]",
            realized, lo, hi
        )));
    }

    let score: f64 = cdf
        .knots()
        .windows(2)
        .map(|pair| segment_contribution(pair[0], pair[1], realized))
        .sum();

    Ok(score.max(0.0))
}

/// Score an ordered `(x, F)` knot sequence against a realized outcome.
///
/// `[(m, 0), (m, 1)]` is a point mass at `m`: its support is `[m, m]`, so
/// only `y = m` is admissible and scores 0. Use [`crps_step`] or
/// [`PiecewiseCdf::step`] to score a point forecast against other outcomes.
pub fn evaluate(knots: &[(f64, f64)], realized: f64) -> Result<f64> {
    let cdf = PiecewiseCdf::from_pairs(knots)?;
    crps(&cdf, realized)
}

/// CRPS of the step-function null at `m`; identical to `|m - y|`.
///
/// Fails with `InvalidInput` when `m` and `y` are so far apart that the
/// support width overflows.
pub fn crps_step(m: f64, realized: f64) -> Result<f64> {
    let lower = m.min(realized) - 1.0;
    let upper = m.max(realized) + 1.0;
    let null = PiecewiseCdf::step(m, lower, upper)?;
    crps(&null, realized)
}
