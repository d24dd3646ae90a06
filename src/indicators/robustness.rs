//! Robustness indicators over a sampled distribution.
//!
//! Each sample is a one-component vector, so the indicators fit the common
//! [`Indicator`] signature. Lower objective values are better.

use super::Indicator;
use crate::error::{MoeaError, Result};
use crate::utils::{Interpolator, LinearInterpolator};

fn samples(points: &[Vec<f64>], name: &str) -> Result<Vec<f64>> {
    if points.is_empty() {
        return Err(MoeaError::configuration(format!(
            "{name} indicator needs at least one sample"
        )));
    }
    points
        .iter()
        .map(|p| {
            MoeaError::check_len(name, 1, p.len())?;
            Ok(p[0])
        })
        .collect()
}

/// The value not exceeded with the given confidence: the empirical
/// `confidence`-quantile, linearly interpolated between order statistics.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceIndicator {
    confidence: f64,
}

impl ConfidenceIndicator {
    /// Creates the indicator; `confidence` must lie in `[0, 1]`.
    pub fn new(confidence: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(MoeaError::configuration(format!(
                "confidence must lie in [0, 1], got {confidence}"
            )));
        }
        Ok(Self { confidence })
    }

    /// Quantile of raw samples.
    pub fn quantile(&self, values: &[f64]) -> Result<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        match sorted.len() {
            0 => Err(MoeaError::configuration("confidence indicator needs at least one sample")),
            1 => Ok(sorted[0]),
            n => {
                let levels: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
                let table = LinearInterpolator::new(levels, sorted)?;
                Ok(table.interpolate(self.confidence))
            }
        }
    }
}

impl Default for ConfidenceIndicator {
    fn default() -> Self {
        Self { confidence: 0.9 }
    }
}

impl Indicator for ConfidenceIndicator {
    fn name(&self) -> &str {
        "confidence"
    }

    fn evaluate(&self, points: &[Vec<f64>]) -> Result<f64> {
        self.quantile(&samples(points, self.name())?)
    }
}

/// Fraction of samples not exceeding a threshold.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdIndicator {
    threshold: f64,
}

impl ThresholdIndicator {
    /// Creates the indicator.
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Indicator for ThresholdIndicator {
    fn name(&self) -> &str {
        "threshold"
    }

    fn evaluate(&self, points: &[Vec<f64>]) -> Result<f64> {
        let values = samples(points, self.name())?;
        let hits = values.iter().filter(|&&v| v <= self.threshold).count();
        Ok(hits as f64 / values.len() as f64)
    }
}

/// Mean of the samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectationIndicator;

impl Indicator for ExpectationIndicator {
    fn name(&self) -> &str {
        "expectation"
    }

    fn evaluate(&self, points: &[Vec<f64>]) -> Result<f64> {
        let values = samples(points, self.name())?;
        Ok(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dist(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test]
    fn test_confidence_quantile() {
        let d = dist(&[4.0, 0.0, 2.0, 1.0, 3.0]);
        let median = ConfidenceIndicator::new(0.5).unwrap();
        assert!((median.evaluate(&d).unwrap() - 2.0).abs() < 1e-12);
        let q = ConfidenceIndicator::new(0.9).unwrap();
        assert!((q.evaluate(&d).unwrap() - 3.6).abs() < 1e-12);
        assert!(ConfidenceIndicator::new(1.5).is_err());
    }

    #[test]
    fn test_threshold_and_expectation() {
        let d = dist(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ThresholdIndicator::new(2.5).evaluate(&d).unwrap(), 0.5);
        assert_eq!(ExpectationIndicator.evaluate(&d).unwrap(), 2.5);
    }

    #[test]
    fn test_bad_samples() {
        assert!(ExpectationIndicator.evaluate(&[]).is_err());
        assert!(matches!(
            ExpectationIndicator.evaluate(&[vec![1.0, 2.0]]),
            Err(MoeaError::Dimensionality { .. })
        ));
    }
}
