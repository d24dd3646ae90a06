//! One-dimensional table interpolation.
//!
//! A [`SampleTable`] holds monotonic x samples with their y values and finds
//! the bracketing interval for a query. Consecutive queries that land close
//! to each other switch from bisection to a hunting search starting at the
//! previous interval.
//!
//! # References
//!
//! - Press et al. (2007), *Numerical Recipes*, 3rd ed., §3.1–3.3

use crate::error::{MoeaError, Result};
use std::cell::Cell;

/// Monotonic samples with a cached search position.
#[derive(Debug, Clone)]
pub struct SampleTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
    points: usize,
    last: Cell<usize>,
    correlated: Cell<bool>,
    hunt_span: usize,
}

impl SampleTable {
    /// Creates a table whose interpolation formula uses `points` samples.
    ///
    /// # Errors
    /// Fails when the lengths differ, there are fewer than `max(points, 2)`
    /// samples, or x is not monotonic (equal neighbours are allowed).
    pub fn new(xs: Vec<f64>, ys: Vec<f64>, points: usize) -> Result<Self> {
        MoeaError::check_len("interpolation samples", xs.len(), ys.len())?;
        let points = points.max(2);
        if xs.len() < points {
            return Err(MoeaError::configuration(format!(
                "interpolation needs at least {points} samples, got {}",
                xs.len()
            )));
        }
        if xs.iter().any(|x| x.is_nan()) {
            return Err(MoeaError::configuration("interpolation x values contain NaN"));
        }
        let ascending = xs.windows(2).all(|w| w[0] <= w[1]);
        let descending = xs.windows(2).all(|w| w[0] >= w[1]);
        if !ascending && !descending {
            return Err(MoeaError::configuration("interpolation x values must be monotonic"));
        }

        let hunt_span = ((xs.len() as f64).powf(0.25) as usize).max(1);
        Ok(Self {
            xs,
            ys,
            points,
            last: Cell::new(0),
            correlated: Cell::new(false),
            hunt_span,
        })
    }

    /// Sample x values.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Sample y values.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    fn ascending(&self) -> bool {
        self.xs[self.xs.len() - 1] >= self.xs[0]
    }

    /// Index of the first of `points` samples bracketing `x`.
    pub fn index(&self, x: f64) -> usize {
        if self.correlated.get() {
            self.hunt(x)
        } else {
            self.locate(x)
        }
    }

    fn finish(&self, jl: usize) -> usize {
        let n = self.xs.len();
        let jsav = self.last.get();
        self.correlated.set(jl.abs_diff(jsav) <= self.hunt_span);
        self.last.set(jl);
        let start = jl.saturating_sub((self.points - 2) >> 1);
        start.min(n - self.points)
    }

    fn locate(&self, x: f64) -> usize {
        let ascending = self.ascending();
        let mut jl = 0;
        let mut ju = self.xs.len() - 1;
        while ju - jl > 1 {
            let jm = (ju + jl) >> 1;
            if (x >= self.xs[jm]) == ascending {
                jl = jm;
            } else {
                ju = jm;
            }
        }
        self.finish(jl)
    }

    fn hunt(&self, x: f64) -> usize {
        let n = self.xs.len();
        let ascending = self.ascending();
        let mut jl = self.last.get();
        let mut ju;
        let mut inc = 1;

        if jl > n - 1 {
            jl = 0;
            ju = n - 1;
        } else if (x >= self.xs[jl]) == ascending {
            loop {
                ju = jl + inc;
                if ju >= n - 1 {
                    ju = n - 1;
                    break;
                } else if (x < self.xs[ju]) == ascending {
                    break;
                }
                jl = ju;
                inc += inc;
            }
        } else {
            ju = jl;
            loop {
                if jl <= inc {
                    jl = 0;
                    break;
                }
                jl -= inc;
                if (x >= self.xs[jl]) == ascending {
                    break;
                }
                ju = jl;
                inc += inc;
            }
        }

        while ju - jl > 1 {
            let jm = (ju + jl) >> 1;
            if (x >= self.xs[jm]) == ascending {
                jl = jm;
            } else {
                ju = jm;
            }
        }
        self.finish(jl)
    }
}

/// Table interpolation scheme.
pub trait Interpolator {
    /// Underlying samples.
    fn table(&self) -> &SampleTable;

    /// Interpolates at `x` from the interval starting at sample `j`.
    fn base_interpolate(&self, j: usize, x: f64) -> f64;

    /// Interpolates at `x`.
    fn interpolate(&self, x: f64) -> f64 {
        let j = self.table().index(x);
        self.base_interpolate(j, x)
    }
}

/// Piecewise-constant interpolation: the value of the sample on the left.
///
/// Queries at or beyond the last sample return the last value.
///
/// # Example
///
/// ```
/// use u_moea::utils::{Interpolator, ZeroOrderInterpolator};
///
/// let z = ZeroOrderInterpolator::new(vec![0.0, 1.0, 2.0], vec![10.0, 20.0, 30.0]).unwrap();
/// assert_eq!(z.interpolate(0.7), 10.0);
/// assert_eq!(z.interpolate(1.5), 20.0);
/// assert_eq!(z.interpolate(2.0), 30.0);
/// ```
#[derive(Debug, Clone)]
pub struct ZeroOrderInterpolator {
    table: SampleTable,
}

impl ZeroOrderInterpolator {
    /// Creates the interpolator.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        Ok(Self {
            table: SampleTable::new(xs, ys, 2)?,
        })
    }
}

impl Interpolator for ZeroOrderInterpolator {
    fn table(&self) -> &SampleTable {
        &self.table
    }

    fn base_interpolate(&self, j: usize, x: f64) -> f64 {
        let t = &self.table;
        let past_right = if t.ascending() {
            x >= t.xs[j + 1]
        } else {
            x <= t.xs[j + 1]
        };
        if past_right {
            t.ys[j + 1]
        } else {
            t.ys[j]
        }
    }
}

/// Piecewise-linear interpolation, extrapolating from the end intervals.
///
/// Equal neighbouring x values fall back to the left sample's y.
///
/// # Example
///
/// ```
/// use u_moea::utils::{Interpolator, LinearInterpolator};
///
/// let l = LinearInterpolator::new(vec![0.0, 2.0], vec![1.0, 5.0]).unwrap();
/// assert_eq!(l.interpolate(1.0), 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    table: SampleTable,
}

impl LinearInterpolator {
    /// Creates the interpolator.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        Ok(Self {
            table: SampleTable::new(xs, ys, 2)?,
        })
    }
}

impl Interpolator for LinearInterpolator {
    fn table(&self) -> &SampleTable {
        &self.table
    }

    fn base_interpolate(&self, j: usize, x: f64) -> f64 {
        let t = &self.table;
        let (x0, x1) = (t.xs[j], t.xs[j + 1]);
        if x0 == x1 {
            return t.ys[j];
        }
        t.ys[j] + (x - x0) / (x1 - x0) * (t.ys[j + 1] - t.ys[j])
    }
}
