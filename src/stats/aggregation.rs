//! Aggregation of per-event CRPS/MAE ratios

use super::summary::median;
use crate::error::{CalibrationError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// How per-event scores are summarized into one skill ratio.
///
/// There is no default: the choice changes the answer and must be made by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// mean_i(crps_i / mae_i)
    MeanOfRatios,
    /// mean(crps) / mean(mae)
    RatioOfMeans,
    /// median_i(crps_i / mae_i)
    MedianOfRatios,
}

impl AggregationPolicy {
    pub const ALL: [AggregationPolicy; 3] = [
        AggregationPolicy::MeanOfRatios,
        AggregationPolicy::RatioOfMeans,
        AggregationPolicy::MedianOfRatios,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            AggregationPolicy::MeanOfRatios => "mean_of_ratios",
            AggregationPolicy::RatioOfMeans => "ratio_of_means",
            AggregationPolicy::MedianOfRatios => "median_of_ratios",
        }
    }

    /// Aggregate paired CRPS and MAE scores
    pub fn aggregate(&self, crps: &Array1<f64>, mae: &Array1<f64>) -> Result<f64> {
        if crps.len() != mae.len() {
            return Err(CalibrationError::invalid(format!(
                "CRPS and MAE must have same length ({} vs {})",
                crps.len(),
                mae.len()
            )));
        }
        if crps.is_empty() {
            return Err(CalibrationError::InsufficientData("no scored events".to_string()));
        }

        match self {
            AggregationPolicy::RatioOfMeans => {
                let mean_mae = mae.mean().unwrap_or(0.0);
                if !(mean_mae > 0.0) {
                    return Err(CalibrationError::InsufficientData(
                        "mean MAE is zero, ratio of means undefined".to_string(),
                    ));
                }
                Ok(crps.mean().unwrap_or(0.0) / mean_mae)
            }
            AggregationPolicy::MeanOfRatios => {
                let r = ratios(crps, mae);
                if r.is_empty() {
                    return Err(no_ratios());
                }
                Ok(r.iter().sum::<f64>() / r.len() as f64)
            }
            AggregationPolicy::MedianOfRatios => median(&ratios(crps, mae)).ok_or_else(no_ratios),
        }
    }
}

impl std::fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for AggregationPolicy {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "mean_of_ratios" => Ok(AggregationPolicy::MeanOfRatios),
            "ratio_of_means" => Ok(AggregationPolicy::RatioOfMeans),
            "median_of_ratios" => Ok(AggregationPolicy::MedianOfRatios),
            other => Err(CalibrationError::ConfigError(format!(
                "unknown aggregation policy '{}', expected mean-of-ratios, ratio-of-means or median-of-ratios",
                other
            ))),
        }
    }
}

/// Per-event ratios `crps / mae`, skipping events where MAE is zero
pub fn ratios(crps: &Array1<f64>, mae: &Array1<f64>) -> Vec<f64> {
    crps.iter()
        .zip(mae.iter())
        .filter(|(_, &m)| m > 0.0)
        .map(|(&c, &m)| c / m)
        .collect()
}

fn no_ratios() -> CalibrationError {
    CalibrationError::InsufficientData("every event has zero MAE, ratios undefined".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_policies_differ() {
        let crps = array![1.0, 1.0, 6.0];
        let mae = array![2.0, 4.0, 6.0];
        let mean_of = AggregationPolicy::MeanOfRatios.aggregate(&crps, &mae).unwrap();
        let ratio_of = AggregationPolicy::RatioOfMeans.aggregate(&crps, &mae).unwrap();
        let median_of = AggregationPolicy::MedianOfRatios.aggregate(&crps, &mae).unwrap();
        assert!((mean_of - (0.5 + 0.25 + 1.0) / 3.0).abs() < 1e-12);
        assert!((ratio_of - 8.0 / 12.0).abs() < 1e-12);
        assert!((median_of - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_mae_excluded_from_ratios() {
        let crps = array![0.1, 1.0];
        let mae = array![0.0, 2.0];
        assert_eq!(ratios(&crps, &mae), vec![0.5]);
        assert!((AggregationPolicy::MeanOfRatios.aggregate(&crps, &mae).unwrap() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_undefined_aggregates() {
        let crps = array![0.1, 0.2];
        let mae = array![0.0, 0.0];
        for policy in AggregationPolicy::ALL {
            assert!(matches!(
                policy.aggregate(&crps, &mae),
                Err(CalibrationError::InsufficientData(_))
            ));
        }
        let empty: Array1<f64> = Array1::zeros(0);
        assert!(AggregationPolicy::RatioOfMeans.aggregate(&empty, &empty).is_err());
        assert!(AggregationPolicy::RatioOfMeans.aggregate(&array![1.0], &array![1.0, 2.0]).is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("mean-of-ratios".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::MeanOfRatios);
        assert_eq!("RATIO_OF_MEANS".parse::<AggregationPolicy>().unwrap(), AggregationPolicy::RatioOfMeans);
        assert!("average".parse::<AggregationPolicy>().is_err());
    }
}
