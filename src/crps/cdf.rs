//! Piecewise-linear forecast CDF

use crate::error::{CalibrationError, Result};
use serde::{Deserialize, Serialize};

/// Slack allowed when checking probabilities read from market data
pub const PROBABILITY_TOLERANCE: f64 = 1e-9;

/// One vertex `(x, F)` of a piecewise-linear CDF
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Knot {
    /// Location on the outcome axis
    pub x: f64,
    /// Cumulative probability at `x`
    pub f: f64,
}

impl Knot {
    pub fn new(x: f64, f: f64) -> Self {
        Self { x, f }
    }
}

impl From<(f64, f64)> for Knot {
    fn from((x, f): (f64, f64)) -> Self {
        Self { x, f }
    }
}

/// Forecast CDF defined by ordered knots, linearly interpolated between them.
///
/// The first knot carries `F = 0` and the last `F = 1`, so the support
/// `[x_0, x_n]` is finite. Two knots may share an `x`, which encodes a jump
/// of `F` at that point; this is how the step-function null is expressed.
/// A support of zero width is a point mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CdfKnots", into = "CdfKnots")]
pub struct PiecewiseCdf {
    knots: Vec<Knot>,
}

/// Serialized form of [`PiecewiseCdf`], validated on the way in
#[derive(Serialize, Deserialize)]
struct CdfKnots {
    knots: Vec<Knot>,
}

impl TryFrom<CdfKnots> for PiecewiseCdf {
    type Error = CalibrationError;

    fn try_from(raw: CdfKnots) -> Result<Self> {
        Self::new(raw.knots)
    }
}

impl From<PiecewiseCdf> for CdfKnots {
    fn from(cdf: PiecewiseCdf) -> Self {
        Self { knots: cdf.knots }
    }
}

impl PiecewiseCdf {
    /// Validate and build a CDF from ordered knots
    pub fn new(knots: Vec<Knot>) -> Result<Self> {
        if knots.len() < 2 {
            return Err(CalibrationError::invalid(format!(
                "a CDF needs at least 2 knots, got {}",
                knots.len()
            )));
        }

        for (i, k) in knots.iter().enumerate() {
            if !k.x.is_finite() || !k.f.is_finite() {
                return Err(CalibrationError::invalid(format!(
                    "knot {} is not finite: ({}, {})",
                    i, k.x, k.f
                )));
            }
            if k.f < -PROBABILITY_TOLERANCE || k.f > 1.0 + PROBABILITY_TOLERANCE {
                return Err(CalibrationError::invalid(format!(
                    "knot {} has F = {} outside [0, 1]",
                    i, k.f
                )));
            }
        }

        for (i, pair) in knots.windows(2).enumerate() {
            if pair[1].x < pair[0].x {
                return Err(CalibrationError::invalid(format!(
                    "knots not sorted: x[{}] = {} > x[{}] = {}",
                    i,
                    pair[0].x,
                    i + 1,
                    pair[1].x
                )));
            }
            if pair[1].f < pair[0].f - PROBABILITY_TOLERANCE {
                return Err(CalibrationError::invalid(format!(
                    "F decreases between knots {} and {}: {} -> {}",
                    i,
                    i + 1,
                    pair[0].f,
                    pair[1].f
                )));
            }
        }

        let first = knots[0];
        let last = knots[knots.len() - 1];
        if first.f.abs() > PROBABILITY_TOLERANCE {
            return Err(CalibrationError::invalid(format!(
                "F at the lower bound must be 0, got {}",
                first.f
            )));
        }
        if (last.f - 1.0).abs() > PROBABILITY_TOLERANCE {
            return Err(CalibrationError::invalid(format!(
                "F at the upper bound must be 1, got {}",
                last.f
            )));
        }
        if !(last.x - first.x).is_finite() {
            return Err(CalibrationError::invalid(format!(
                "support [{}, {}] is too wide to integrate",
                first.x, last.x
            )));
        }

        // Snap tolerance noise so F is exactly monotone in [0, 1]
        let n = knots.len();
        let mut running = 0.0_f64;
        let knots = knots
            .into_iter()
            .enumerate()
            .map(|(i, k)| {
                let f = if i == 0 {
                    0.0
                } else if i == n - 1 {
                    1.0
                } else {
                    k.f.clamp(running, 1.0)
                };
                running = f;
                Knot { x: k.x, f }
            })
            .collect();

        Ok(Self { knots })
    }

    /// Build from `(x, F)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(pairs.iter().copied().map(Knot::from).collect())
    }

    /// Step-function null: all probability mass at `m`, support `[lower, upper]`
    pub fn step(m: f64, lower: f64, upper: f64) -> Result<Self> {
        if !(m.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(CalibrationError::invalid("step bounds must be finite"));
        }
        if m < lower || m > upper {
            return Err(CalibrationError::invalid(format!(
                "step location {} outside [{}, {}]",
                m, lower, upper
            )));
        }

        let mut knots = Vec::with_capacity(4);
        if lower < m {
            knots.push(Knot::new(lower, 0.0));
        }
        knots.push(Knot::new(m, 0.0));
        knots.push(Knot::new(m, 1.0));
        if upper > m {
            knots.push(Knot::new(upper, 1.0));
        }
        Self::new(knots)
    }

    /// Ordered knots
    pub fn knots(&self) -> &[Knot] {
        &self.knots
    }

    /// Number of knots
    pub fn len(&self) -> usize {
        self.knots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.knots.is_empty()
    }

    /// Support `[x_0, x_n]`
    pub fn support(&self) -> (f64, f64) {
        (self.knots[0].x, self.knots[self.knots.len() - 1].x)
    }

    /// Whether `y` lies inside the support
    pub fn contains(&self, y: f64) -> bool {
        let (lo, hi) = self.support();
        y >= lo && y <= hi
    }

    /// Right-continuous evaluation of F
    pub fn cdf(&self, x: f64) -> f64 {
        // Number of knots at or left of x
        let idx = self.knots.partition_point(|k| k.x <= x);
        if idx == 0 {
            return 0.0;
        }
        if idx == self.knots.len() {
            return 1.0;
        }

        let left = self.knots[idx - 1];
        let right = self.knots[idx];
        let width = right.x - left.x;
        let t = (x - left.x) / width;
        left.f + t * (right.f - left.f)
    }

    /// Implied mean `x_n - integral of F over the support`
    pub fn mean(&self) -> f64 {
        let area: f64 = self
            .knots
            .windows(2)
            .map(|pair| {
                let dx = pair[1].x - pair[0].x;
                if dx > 0.0 {
                    dx * (pair[0].f + pair[1].f) / 2.0
                } else {
                    0.0
                }
            })
            .sum();
        self.support().1 - area
    }

    /// Insert a knot at `x` lying on the current interpolant.
    ///
    /// The function itself is unchanged; only the segmentation is finer.
    pub fn refine(&self, x: f64) -> Result<Self> {
        if !x.is_finite() || !self.contains(x) {
            return Err(CalibrationError::invalid(format!(
                "refinement point {} outside support {:?}",
                x,
                self.support()
            )));
        }

        let idx = self.knots.partition_point(|k| k.x <= x);
        if idx > 0 && self.knots[idx - 1].x == x {
            return Ok(self.clone());
        }

        let mut knots = self.knots.clone();
        knots.insert(idx, Knot::new(x, self.cdf(x)));
        Ok(Self { knots })
    }
}
