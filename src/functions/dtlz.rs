//! DTLZ scalable many-objective benchmarks.

use super::{minimised_outputs, unit_inputs};
use crate::error::{MoeaError, Result};
use crate::representation::{ElementProperties, Function};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Dtlz1,
    Dtlz2,
}

/// DTLZ1 (linear front, multimodal `g`) or DTLZ2 (spherical front).
///
/// `m` objectives over `n = m + k - 1` variables; the last `k` variables
/// feed the distance function `g`, and the front lies at `x_i = 0.5` for
/// those. On the front, DTLZ1 objectives sum to 0.5 and DTLZ2 objectives
/// have unit Euclidean norm.
///
/// # Examples
///
/// ```
/// use u_moea::functions::Dtlz;
/// use u_moea::representation::Function;
///
/// let f = Dtlz::dtlz2(3, 2).unwrap();
/// let out = f.compute(&[0.3, 0.7, 0.5, 0.5]).unwrap();
/// let norm: f64 = out.iter().map(|v| v * v).sum();
/// assert!((norm - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Dtlz {
    variant: Variant,
    name: &'static str,
    m: usize,
    inputs: Vec<ElementProperties>,
    outputs: Vec<ElementProperties>,
}

impl Dtlz {
    fn build(variant: Variant, name: &'static str, m: usize, k: usize) -> Result<Self> {
        if m < 2 || k < 1 {
            return Err(MoeaError::configuration(format!(
                "{name} needs m >= 2 and k >= 1, got m = {m}, k = {k}"
            )));
        }
        Ok(Self {
            variant,
            name,
            m,
            inputs: unit_inputs(m + k - 1),
            outputs: minimised_outputs(m),
        })
    }

    /// DTLZ1 with `m` objectives and `k` distance variables (usually 5).
    pub fn dtlz1(m: usize, k: usize) -> Result<Self> {
        Self::build(Variant::Dtlz1, "DTLZ1", m, k)
    }

    /// DTLZ2 with `m` objectives and `k` distance variables (usually 10).
    pub fn dtlz2(m: usize, k: usize) -> Result<Self> {
        Self::build(Variant::Dtlz2, "DTLZ2", m, k)
    }

    /// Number of objectives.
    pub fn objectives(&self) -> usize {
        self.m
    }
}

impl Function for Dtlz {
    fn name(&self) -> &str {
        self.name
    }

    fn inputs(&self) -> &[ElementProperties] {
        &self.inputs
    }

    fn outputs(&self) -> &[ElementProperties] {
        &self.outputs
    }

    fn compute(&self, x: &[f64]) -> Result<Vec<f64>> {
        let m = self.m;
        let (position, distance) = x.split_at(m - 1);

        let out = match self.variant {
            Variant::Dtlz1 => {
                let k = distance.len() as f64;
                let g = 100.0
                    * (k + distance
                        .iter()
                        .map(|&v| (v - 0.5).powi(2) - (20.0 * PI * (v - 0.5)).cos())
                        .sum::<f64>());
                (0..m)
                    .map(|j| {
                        let mut f = 0.5 * (1.0 + g);
                        f *= position[..m - 1 - j].iter().product::<f64>();
                        if j > 0 {
                            f *= 1.0 - position[m - 1 - j];
                        }
                        f
                    })
                    .collect()
            }
            Variant::Dtlz2 => {
                let g: f64 = distance.iter().map(|&v| (v - 0.5).powi(2)).sum();
                (0..m)
                    .map(|j| {
                        let mut f = 1.0 + g;
                        f *= position[..m - 1 - j]
                            .iter()
                            .map(|&v| (v * PI / 2.0).cos())
                            .product::<f64>();
                        if j > 0 {
                            f *= (position[m - 1 - j] * PI / 2.0).sin();
                        }
                        f
                    })
                    .collect()
            }
        };
        Ok(out)
    }
}
