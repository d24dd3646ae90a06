//! Quality indicators.
//!
//! - [`crowding_distance`]: per-solution diversity within one front
//! - [`hypervolume`] / [`hypervolume_contributions`]: dominated volume
//! - [`Indicator`]: common interface for set-level indicators, with
//!   [`Hypervolume`] and the robustness indicators over a sampled
//!   distribution ([`ConfidenceIndicator`], [`ThresholdIndicator`],
//!   [`ExpectationIndicator`])
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Zitzler & Thiele (1998), "Multiobjective Optimization Using Evolutionary
//!   Algorithms: A Comparative Case Study"
//! - While et al. (2006), "A Faster Algorithm for Calculating Hypervolume"

mod crowding;
mod hypervolume;
mod robustness;

pub use crowding::crowding_distance;
pub use hypervolume::{hypervolume, hypervolume_contributions};
pub use robustness::{ConfidenceIndicator, ExpectationIndicator, ThresholdIndicator};

use crate::error::Result;

/// A pure function from a set of objective vectors to a scalar.
pub trait Indicator: Send + Sync {
    /// Identifier of the indicator.
    fn name(&self) -> &str;

    /// Computes the indicator. Inputs are never modified.
    fn evaluate(&self, points: &[Vec<f64>]) -> Result<f64>;
}

/// [`hypervolume`] as an [`Indicator`].
///
/// # Example
///
/// ```
/// use u_moea::indicators::{Hypervolume, Indicator};
///
/// let hv = Hypervolume::with_reference(vec![2.0, 2.0]);
/// assert_eq!(hv.evaluate(&[vec![1.0, 1.0]]).unwrap(), 1.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Hypervolume {
    reference: Option<Vec<f64>>,
}

impl Hypervolume {
    /// Hypervolume against each set's own nadir.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hypervolume against a fixed reference point.
    pub fn with_reference(reference: Vec<f64>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    /// The fixed reference point, if any.
    pub fn reference(&self) -> Option<&[f64]> {
        self.reference.as_deref()
    }
}

impl Indicator for Hypervolume {
    fn name(&self) -> &str {
        "hypervolume"
    }

    fn evaluate(&self, points: &[Vec<f64>]) -> Result<f64> {
        hypervolume(points, self.reference.as_deref())
    }
}
