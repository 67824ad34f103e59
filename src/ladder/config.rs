//! Quote ladder configuration

use crate::error::{CalibrationError, Result};
use serde::{Deserialize, Serialize};

/// What a quoted probability refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteKind {
    /// P(X <= strike)
    Below,
    /// P(X > strike), e.g. "above K" contracts
    Above,
}

impl QuoteKind {
    /// Convert a quoted probability into a cumulative probability at the strike
    pub fn to_cumulative(self, probability: f64) -> f64 {
        match self {
            QuoteKind::Below => probability,
            QuoteKind::Above => 1.0 - probability,
        }
    }
}

impl std::str::FromStr for QuoteKind {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "below" | "cdf" => Ok(QuoteKind::Below),
            "above" | "survival" => Ok(QuoteKind::Above),
            other => Err(CalibrationError::ConfigError(format!(
                "unknown quote kind '{}', expected 'below' or 'above'",
                other
            ))),
        }
    }
}

/// How far the outer truncation bounds sit beyond the extreme strikes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Constant padding on both sides
    Fixed { padding: f64 },
    /// Padding proportional to the strike range, never below `min_padding`
    RangeFraction { fraction: f64, min_padding: f64 },
}

impl BoundsPolicy {
    /// Padding for a ladder whose strikes span `range`
    pub fn padding(&self, range: f64) -> Result<f64> {
        let padding = match *self {
            BoundsPolicy::Fixed { padding } => padding,
            BoundsPolicy::RangeFraction { fraction, min_padding } => {
                if !(fraction >= 0.0) {
                    return Err(CalibrationError::ConfigError(format!(
                        "bounds fraction must be non-negative, got {}",
                        fraction
                    )));
                }
                (fraction * range).max(min_padding)
            }
        };

        if !(padding > 0.0) || !padding.is_finite() {
            return Err(CalibrationError::ConfigError(format!(
                "bounds padding must be positive and finite, got {}",
                padding
            )));
        }
        Ok(padding)
    }
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy::RangeFraction {
            fraction: 0.5,
            min_padding: 1.0,
        }
    }
}

/// Configuration for turning market quotes into a knot sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LadderConfig {
    /// Meaning of the quoted probabilities
    pub quote_kind: QuoteKind,
    /// Outer bound placement
    pub bounds: BoundsPolicy,
    /// Widen the bounds so the realized outcome lies inside the support
    pub cover_outcome: bool,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            quote_kind: QuoteKind::Below,
            bounds: BoundsPolicy::default(),
            cover_outcome: true,
        }
    }
}

impl LadderConfig {
    pub fn with_quote_kind(mut self, kind: QuoteKind) -> Self {
        self.quote_kind = kind;
        self
    }

    pub fn with_bounds(mut self, bounds: BoundsPolicy) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_cover_outcome(mut self, cover: bool) -> Self {
        self.cover_outcome = cover;
        self
    }
}
