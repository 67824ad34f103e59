//! Probability Integral Transform diagnostics

use crate::error::{CalibrationError, Result};
use crate::stats::{sorted_copy, StatsSummary};
use serde::{Deserialize, Serialize};

/// PIT configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PitConfig {
    /// Number of equal-width histogram bins on [0, 1]
    pub n_bins: usize,
    /// Significance level of the KS uniformity check
    pub ks_alpha: f64,
}

impl Default for PitConfig {
    fn default() -> Self {
        Self {
            n_bins: 10,
            ks_alpha: 0.05,
        }
    }
}

impl PitConfig {
    pub fn with_bins(mut self, n_bins: usize) -> Self {
        self.n_bins = n_bins.max(2);
        self
    }

    pub fn with_ks_alpha(mut self, alpha: f64) -> Self {
        self.ks_alpha = alpha.clamp(0.001, 0.5);
        self
    }
}

/// PIT histogram data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitHistogram {
    /// Bin edges (n_bins + 1)
    pub bin_edges: Vec<f64>,
    /// Number of PIT values in each bin
    pub counts: Vec<usize>,
    /// Count / (n * bin width); 1.0 everywhere for a calibrated forecast
    pub densities: Vec<f64>,
}

impl PitHistogram {
    /// Bin PIT values; a value of exactly 1.0 lands in the last bin
    pub fn from_values(values: &[f64], n_bins: usize) -> Self {
        let n_bins = n_bins.max(1);
        let bin_width = 1.0 / n_bins as f64;

        let bin_edges: Vec<f64> = (0..=n_bins).map(|i| i as f64 * bin_width).collect();
        let mut counts = vec![0usize; n_bins];
        for &v in values {
            let idx = ((v.clamp(0.0, 1.0) / bin_width) as usize).min(n_bins - 1);
            counts[idx] += 1;
        }

        let n = values.len().max(1) as f64;
        let densities = counts.iter().map(|&c| c as f64 / (n * bin_width)).collect();

        Self {
            bin_edges,
            counts,
            densities,
        }
    }
}

/// Calibration diagnostics of a collection of PIT values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitDiagnostics {
    pub n: usize,
    /// Mean PIT (0.5 under calibration)
    pub mean: f64,
    /// PIT variance (1/12 under calibration; larger means overconfident)
    pub variance: f64,
    pub histogram: PitHistogram,
    /// One-sample KS distance to U(0, 1)
    pub ks_statistic: f64,
    /// Asymptotic critical value at `ks_alpha`
    pub ks_critical: f64,
    pub ks_alpha: f64,
    /// KS statistic exceeds the critical value
    pub uniform_rejected: bool,
}

/// Variance of U(0, 1)
pub const UNIFORM_VARIANCE: f64 = 1.0 / 12.0;

impl PitDiagnostics {
    pub fn from_values(values: &[f64], config: &PitConfig) -> Result<Self> {
        if values.is_empty() {
            return Err(CalibrationError::InsufficientData("no PIT values".to_string()));
        }
        if values.iter().any(|v| !v.is_finite() || *v < 0.0 || *v > 1.0) {
            return Err(CalibrationError::invalid("PIT values must lie in [0, 1]"));
        }

        let n = values.len();
        let summary = StatsSummary::from_values(values);
        let variance = values.iter().map(|v| (v - summary.mean).powi(2)).sum::<f64>() / n as f64;

        let ks_statistic = ks_uniform(values);
        let ks_critical = ks_critical_value(config.ks_alpha, n);

        Ok(Self {
            n,
            mean: summary.mean,
            variance,
            histogram: PitHistogram::from_values(values, config.n_bins),
            ks_statistic,
            ks_critical,
            ks_alpha: config.ks_alpha,
            uniform_rejected: ks_statistic > ks_critical,
        })
    }

    /// Ratio of PIT variance to the uniform variance
    pub fn dispersion(&self) -> f64 {
        self.variance / UNIFORM_VARIANCE
    }
}

/// Kolmogorov-Smirnov distance between the empirical CDF of `values` and U(0, 1)
pub fn ks_uniform(values: &[f64]) -> f64 {
    let sorted = sorted_copy(values);
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let above = (i as f64 + 1.0) / n - v;
            let below = v - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}

/// Asymptotic one-sample KS critical value
fn ks_critical_value(alpha: f64, n: usize) -> f64 {
    let c_alpha = match alpha {
        a if a <= 0.01 => 1.63,
        a if a <= 0.05 => 1.36,
        a if a <= 0.10 => 1.22,
        _ => 1.07,
    };
    c_alpha / (n as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_histogram_edges_and_last_bin() {
        let hist = PitHistogram::from_values(&[0.0, 0.05, 0.5, 1.0], 4);
        assert_eq!(hist.bin_edges.len(), 5);
        assert_eq!(hist.counts, vec![2, 0, 1, 1]);
        assert!((hist.densities[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_uniform_grid_is_calibrated() {
        let values: Vec<f64> = (0..200).map(|i| (i as f64 + 0.5) / 200.0).collect();
        let diag = PitDiagnostics::from_values(&values, &PitConfig::default()).unwrap();
        assert!((diag.mean - 0.5).abs() < 1e-9);
        assert!((diag.dispersion() - 1.0).abs() < 0.01);
        assert!(diag.ks_statistic <= 0.0025 + 1e-12);
        assert!(!diag.uniform_rejected);
        assert!(diag.histogram.counts.iter().all(|&c| c == 20));
    }

    #[test]
    fn test_clustered_pit_rejected() {
        // Overconfident forecasts push PIT to the extremes
        let values: Vec<f64> = (0..100).map(|i| if i % 2 == 0 { 0.01 } else { 0.99 }).collect();
        let diag = PitDiagnostics::from_values(&values, &PitConfig::default()).unwrap();
        assert!(diag.dispersion() > 2.0);
        assert!(diag.uniform_rejected);
    }

    #[test]
    fn test_invalid_pit_values() {
        assert!(PitDiagnostics::from_values(&[], &PitConfig::default()).is_err());
        assert!(PitDiagnostics::from_values(&[1.2], &PitConfig::default()).is_err());
    }
}
