//! Descriptive statistics

use serde::{Deserialize, Serialize};

/// Statistics summary of a sample
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    /// Number of observations
    pub count: usize,
    /// Average value
    pub mean: f64,
    /// Median value
    pub median: f64,
    /// Sample standard deviation (n - 1 denominator)
    pub std_dev: f64,
    /// Minimum value
    pub min: f64,
    /// Maximum value
    pub max: f64,
}

impl StatsSummary {
    /// Create a summary from a slice of values
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let std_dev = if count > 1 {
            let variance = values.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
            variance.sqrt()
        } else {
            0.0
        };

        let sorted = sorted_copy(values);
        let median = quantile(&sorted, 0.5).unwrap_or(mean);

        Self {
            count,
            mean,
            median,
            std_dev,
            min,
            max,
        }
    }

    /// Standard error of the mean
    pub fn std_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.std_dev / (self.count as f64).sqrt()
        }
    }
}

/// Sorted copy of a sample, NaN last
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Quantile of a sorted sample by linear interpolation between order statistics
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let t = pos - lo as f64;
    Some(sorted[lo] + t * (sorted[hi] - sorted[lo]))
}

/// Median of an unsorted sample
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(&sorted_copy(values), 0.5)
}
