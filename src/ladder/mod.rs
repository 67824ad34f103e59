//! Market quote ladders
//!
//! Turns a set of strike quotes into the knot sequence of a forecast CDF:
//! quotes are converted to cumulative probabilities, sorted, merged per
//! strike, repaired to be monotone and closed off with explicit outer bounds.

mod config;
pub mod isotonic;

pub use config::{BoundsPolicy, LadderConfig, QuoteKind};

use crate::crps::{Knot, PiecewiseCdf, PROBABILITY_TOLERANCE};
use crate::error::{CalibrationError, Result};
use serde::{Deserialize, Serialize};

/// A quoted probability at one strike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub strike: f64,
    pub probability: f64,
}

impl Quote {
    pub fn new(strike: f64, probability: f64) -> Self {
        Self { strike, probability }
    }
}

/// Builds forecast CDFs from quote ladders
#[derive(Debug, Clone, Default)]
pub struct LadderBuilder {
    config: LadderConfig,
}

impl LadderBuilder {
    pub fn new(config: LadderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    /// Build the knot sequence; `realized` is only used when `cover_outcome` is set
    pub fn knots(&self, quotes: &[Quote], realized: Option<f64>) -> Result<Vec<Knot>> {
        if quotes.is_empty() {
            return Err(CalibrationError::invalid("quote ladder is empty"));
        }

        let mut points: Vec<(f64, f64)> = Vec::with_capacity(quotes.len());
        for q in quotes {
            if !q.strike.is_finite() || !q.probability.is_finite() {
                return Err(CalibrationError::invalid(format!(
                    "non-finite quote ({}, {})",
                    q.strike, q.probability
                )));
            }
            if q.probability < -PROBABILITY_TOLERANCE || q.probability > 1.0 + PROBABILITY_TOLERANCE {
                return Err(CalibrationError::invalid(format!(
                    "quote probability {} at strike {} outside [0, 1]",
                    q.probability, q.strike
                )));
            }
            let p = q.probability.clamp(0.0, 1.0);
            points.push((q.strike, self.config.quote_kind.to_cumulative(p)));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Merge quotes at the same strike
        let mut strikes: Vec<f64> = Vec::with_capacity(points.len());
        let mut probs: Vec<f64> = Vec::with_capacity(points.len());
        let mut weights: Vec<f64> = Vec::with_capacity(points.len());
        for (strike, p) in points {
            match strikes.last() {
                Some(&last) if last == strike => {
                    let i = probs.len() - 1;
                    probs[i] = (probs[i] * weights[i] + p) / (weights[i] + 1.0);
                    weights[i] += 1.0;
                }
                _ => {
                    strikes.push(strike);
                    probs.push(p);
                    weights.push(1.0);
                }
            }
        }

        if !isotonic::is_monotone(&probs) {
            tracing::debug!(n_strikes = strikes.len(), "repairing non-monotone quote ladder");
            probs = isotonic::pava(&probs, &weights);
        }

        let min_strike = strikes[0];
        let max_strike = strikes[strikes.len() - 1];
        let padding = self.config.bounds.padding(max_strike - min_strike)?;
        let mut lower = min_strike - padding;
        let mut upper = max_strike + padding;

        if self.config.cover_outcome {
            if let Some(y) = realized.filter(|y| y.is_finite()) {
                lower = lower.min(y);
                upper = upper.max(y);
            }
        }

        let mut knots = Vec::with_capacity(strikes.len() + 2);
        knots.push(Knot::new(lower, 0.0));
        knots.extend(strikes.iter().zip(probs.iter()).map(|(&x, &f)| Knot::new(x, f)));
        knots.push(Knot::new(upper, 1.0));
        Ok(knots)
    }

    /// Build and validate the forecast CDF
    pub fn build(&self, quotes: &[Quote], realized: Option<f64>) -> Result<PiecewiseCdf> {
        PiecewiseCdf::new(self.knots(quotes, realized)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_quotes() -> Vec<Quote> {
        vec![
            Quote::new(-2.0, 0.0228),
            Quote::new(-1.0, 0.1587),
            Quote::new(0.0, 0.5),
            Quote::new(1.0, 0.8413),
            Quote::new(2.0, 0.9772),
        ]
    }

    #[test]
    fn test_fixed_bounds_reproduce_reference_ladder() {
        let builder = LadderBuilder::new(
            LadderConfig::default().with_bounds(BoundsPolicy::Fixed { padding: 3.0 }),
        );
        let knots = builder.knots(&normal_quotes(), None).unwrap();
        assert_eq!(knots.len(), 7);
        assert_eq!(knots[0], Knot::new(-5.0, 0.0));
        assert_eq!(knots[6], Knot::new(5.0, 1.0));
    }

    #[test]
    fn test_above_quotes_are_complemented() {
        let builder = LadderBuilder::new(LadderConfig::default().with_quote_kind(QuoteKind::Above));
        let quotes = vec![Quote::new(10.0, 0.8), Quote::new(20.0, 0.3)];
        let knots = builder.knots(&quotes, None).unwrap();
        assert!((knots[1].f - 0.2).abs() < 1e-12);
        assert!((knots[2].f - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_unsorted_and_duplicate_strikes() {
        let builder = LadderBuilder::default();
        let quotes = vec![
            Quote::new(3.0, 0.9),
            Quote::new(1.0, 0.2),
            Quote::new(2.0, 0.4),
            Quote::new(2.0, 0.6),
        ];
        let knots = builder.knots(&quotes, None).unwrap();
        let strikes: Vec<f64> = knots.iter().map(|k| k.x).collect();
        assert_eq!(&strikes[1..4], &[1.0, 2.0, 3.0]);
        assert!((knots[2].f - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_non_monotone_quotes_repaired() {
        let builder = LadderBuilder::default();
        let quotes = vec![Quote::new(1.0, 0.3), Quote::new(2.0, 0.5), Quote::new(3.0, 0.4)];
        let cdf = builder.build(&quotes, None).unwrap();
        let f: Vec<f64> = cdf.knots().iter().map(|k| k.f).collect();
        assert!(isotonic::is_monotone(&f));
        assert!((f[2] - 0.45).abs() < 1e-12);
    }

    #[test]
    fn test_cover_outcome_widens_bounds() {
        let builder = LadderBuilder::new(
            LadderConfig::default().with_bounds(BoundsPolicy::Fixed { padding: 1.0 }),
        );
        let cdf = builder.build(&normal_quotes(), Some(7.5)).unwrap();
        assert_eq!(cdf.support(), (-3.0, 7.5));

        let strict = LadderBuilder::new(builder.config().clone().with_cover_outcome(false));
        assert_eq!(strict.build(&normal_quotes(), Some(7.5)).unwrap().support(), (-3.0, 3.0));
    }

    #[test]
    fn test_range_fraction_uses_min_padding_for_single_strike() {
        let builder = LadderBuilder::default();
        let cdf = builder.build(&[Quote::new(5.0, 0.5)], None).unwrap();
        assert_eq!(cdf.support(), (4.0, 6.0));
    }

    #[test]
    fn test_invalid_quotes() {
        let builder = LadderBuilder::default();
        assert!(builder.knots(&[], None).is_err());
        assert!(builder.knots(&[Quote::new(1.0, 1.5)], None).is_err());
        assert!(builder.knots(&[Quote::new(f64::NAN, 0.5)], None).is_err());

        let zero_padding = LadderBuilder::new(
            LadderConfig::default().with_bounds(BoundsPolicy::Fixed { padding: 0.0 }),
        );
        assert!(matches!(
            zero_padding.knots(&normal_quotes(), None),
            Err(CalibrationError::ConfigError(_))
        ));
    }
}
