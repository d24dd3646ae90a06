//! Radial basis functions and RBF interpolation.
//!
//! Kernels map a distance to a weight. Each takes a positive scale `r0` at
//! construction and is pure afterwards. [`RbfInterpolator`] fits kernel
//! weights to scattered samples and predicts at new points.
//!
//! # References
//!
//! - Press et al. (2007), *Numerical Recipes*, 3rd ed., §3.7.1

use crate::error::{MoeaError, Result};
use nalgebra::{DMatrix, DVector};

/// A radial kernel.
pub trait RadialBasis: Send + Sync {
    /// Weight at distance `r`.
    fn rbf(&self, r: f64) -> f64;
}

fn check_scale(name: &str, r0: f64) -> Result<f64> {
    if r0 > 0.0 && r0.is_finite() {
        Ok(r0)
    } else {
        Err(MoeaError::configuration(format!(
            "{name} scale must be positive and finite, got {r0}"
        )))
    }
}

/// `exp(-(r/r0)^2 / 2)`.
#[derive(Debug, Clone, Copy)]
pub struct GaussianRbf {
    r0: f64,
}

impl GaussianRbf {
    /// Creates the kernel.
    pub fn new(r0: f64) -> Result<Self> {
        Ok(Self {
            r0: check_scale("gaussian", r0)?,
        })
    }
}

impl RadialBasis for GaussianRbf {
    fn rbf(&self, r: f64) -> f64 {
        let s = r / self.r0;
        (-0.5 * s * s).exp()
    }
}

/// `sqrt(r^2 + r0^2)`.
#[derive(Debug, Clone, Copy)]
pub struct MultiquadricRbf {
    r0: f64,
}

impl MultiquadricRbf {
    /// Creates the kernel.
    pub fn new(r0: f64) -> Result<Self> {
        Ok(Self {
            r0: check_scale("multiquadric", r0)?,
        })
    }
}

impl RadialBasis for MultiquadricRbf {
    fn rbf(&self, r: f64) -> f64 {
        (r * r + self.r0 * self.r0).sqrt()
    }
}

/// `1 / sqrt(r^2 + r0^2)`.
#[derive(Debug, Clone, Copy)]
pub struct InverseMultiquadricRbf {
    r0: f64,
}

impl InverseMultiquadricRbf {
    /// Creates the kernel.
    pub fn new(r0: f64) -> Result<Self> {
        Ok(Self {
            r0: check_scale("inverse multiquadric", r0)?,
        })
    }
}

impl RadialBasis for InverseMultiquadricRbf {
    fn rbf(&self, r: f64) -> f64 {
        1.0 / (r * r + self.r0 * self.r0).sqrt()
    }
}

/// `r^2 ln(r / r0)`, and 0 for `r <= 0`.
#[derive(Debug, Clone, Copy)]
pub struct ThinPlateRbf {
    r0: f64,
}

impl ThinPlateRbf {
    /// Creates the kernel.
    pub fn new(r0: f64) -> Result<Self> {
        Ok(Self {
            r0: check_scale("thin-plate", r0)?,
        })
    }
}

impl RadialBasis for ThinPlateRbf {
    fn rbf(&self, r: f64) -> f64 {
        if r <= 0.0 {
            0.0
        } else {
            r * r * (r / self.r0).ln()
        }
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Scattered-data interpolator `y(x) = Σ w_i φ(|x - x_i|)`.
///
/// In normalized mode the prediction is divided by `Σ φ(|x - x_i|)`.
///
/// # Example
///
/// ```
/// use u_moea::utils::{GaussianRbf, RbfInterpolator};
///
/// let points = vec![vec![0.0], vec![1.0], vec![2.0]];
/// let values = vec![0.0, 1.0, 4.0];
/// let rbf = RbfInterpolator::fit(points, &values, GaussianRbf::new(1.0).unwrap(), false).unwrap();
/// assert!((rbf.interpolate(&[1.0]).unwrap() - 1.0).abs() < 1e-9);
/// ```
#[derive(Debug, Clone)]
pub struct RbfInterpolator<K: RadialBasis> {
    points: Vec<Vec<f64>>,
    weights: Vec<f64>,
    kernel: K,
    normalized: bool,
}

impl<K: RadialBasis> RbfInterpolator<K> {
    /// Fits weights so the interpolator reproduces `values` at `points`.
    ///
    /// The kernel system is solved with column-pivoted QR. A singular system
    /// (for instance repeated sample points) falls back to the SVD
    /// least-squares solution.
    pub fn fit(points: Vec<Vec<f64>>, values: &[f64], kernel: K, normalized: bool) -> Result<Self> {
        MoeaError::check_len("rbf samples", points.len(), values.len())?;
        let Some(first) = points.first() else {
            return Err(MoeaError::configuration("rbf interpolation needs at least one sample"));
        };
        let dim = first.len();
        for p in &points {
            MoeaError::check_len("rbf sample point", dim, p.len())?;
        }

        let n = points.len();
        let phi = DMatrix::from_fn(n, n, |i, j| kernel.rbf(distance(&points[i], &points[j])));
        let rhs = DVector::from_fn(n, |i, _| {
            if normalized {
                phi.row(i).sum() * values[i]
            } else {
                values[i]
            }
        });

        let solution = match phi.clone().col_piv_qr().solve(&rhs) {
            Some(w) if w.iter().all(|v| v.is_finite()) => w,
            _ => phi
                .svd(true, true)
                .solve(&rhs, 1e-12)
                .map_err(|e| MoeaError::configuration(format!("rbf system unsolvable: {e}")))?,
        };

        Ok(Self {
            points,
            weights: solution.iter().copied().collect(),
            kernel,
            normalized,
        })
    }

    /// Dimension of the input space.
    pub fn dimension(&self) -> usize {
        self.points[0].len()
    }

    /// Fitted weights.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Predicts at `x`.
    ///
    /// In normalized mode a point where every kernel weight vanishes
    /// predicts 0.
    pub fn interpolate(&self, x: &[f64]) -> Result<f64> {
        MoeaError::check_len("rbf query", self.dimension(), x.len())?;
        let mut sum = 0.0;
        let mut sum_w = 0.0;
        for (p, w) in self.points.iter().zip(&self.weights) {
            let k = self.kernel.rbf(distance(x, p));
            sum_w += w * k;
            sum += k;
        }
        Ok(if self.normalized {
            if sum == 0.0 {
                0.0
            } else {
                sum_w / sum
            }
        } else {
            sum_w
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernels() {
        let g = GaussianRbf::new(2.0).unwrap();
        assert_eq!(g.rbf(0.0), 1.0);
        assert!((g.rbf(2.0) - (-0.5f64).exp()).abs() < 1e-12);

        let m = MultiquadricRbf::new(3.0).unwrap();
        assert_eq!(m.rbf(4.0), 5.0);

        let im = InverseMultiquadricRbf::new(3.0).unwrap();
        assert!((im.rbf(4.0) - 0.2).abs() < 1e-12);

        let t = ThinPlateRbf::new(1.0).unwrap();
        assert_eq!(t.rbf(0.0), 0.0);
        assert_eq!(t.rbf(-1.0), 0.0);
        assert!((t.rbf(std::f64::consts::E) - std::f64::consts::E.powi(2)).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_scale() {
        assert!(GaussianRbf::new(0.0).is_err());
        assert!(ThinPlateRbf::new(-1.0).is_err());
        assert!(MultiquadricRbf::new(f64::NAN).is_err());
    }

    #[test]
    fn test_reproduces_samples_2d() {
        let points = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![0.5, 0.5],
        ];
        let values: Vec<f64> = points.iter().map(|p| p[0] + 2.0 * p[1]).collect();
        let rbf = RbfInterpolator::fit(
            points.clone(),
            &values,
            MultiquadricRbf::new(1.0).unwrap(),
            false,
        )
        .unwrap();
        for (p, v) in points.iter().zip(&values) {
            let y = rbf.interpolate(p).unwrap();
            assert!((y - v).abs() < 1e-8, "at {p:?}: {y} vs {v}");
        }
    }

    #[test]
    fn test_normalized_reproduces_samples() {
        let points = vec![vec![0.0], vec![1.0], vec![3.0]];
        let values = vec![2.0, -1.0, 5.0];
        let rbf =
            RbfInterpolator::fit(points.clone(), &values, GaussianRbf::new(1.5).unwrap(), true)
                .unwrap();
        for (p, v) in points.iter().zip(&values) {
            assert!((rbf.interpolate(p).unwrap() - v).abs() < 1e-8);
        }
    }

    #[test]
    fn test_query_dimension_checked() {
        let rbf = RbfInterpolator::fit(
            vec![vec![0.0, 0.0], vec![1.0, 1.0]],
            &[0.0, 1.0],
            GaussianRbf::new(1.0).unwrap(),
            false,
        )
        .unwrap();
        assert!(matches!(
            rbf.interpolate(&[0.0]),
            Err(MoeaError::Dimensionality { .. })
        ));
    }

    #[test]
    fn test_repeated_points_do_not_fail() {
        let rbf = RbfInterpolator::fit(
            vec![vec![0.0], vec![0.0], vec![1.0]],
            &[1.0, 1.0, 2.0],
            GaussianRbf::new(1.0).unwrap(),
            false,
        )
        .unwrap();
        assert!(rbf.interpolate(&[0.5]).unwrap().is_finite());
    }
}
