//! ZDT two-objective benchmarks.

use super::{minimised_outputs, unit_inputs};
use crate::error::{MoeaError, Result};
use crate::representation::{ElementProperties, Function};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Zdt1,
    Zdt2,
    Zdt3,
}

/// ZDT1 (convex front), ZDT2 (concave front) or ZDT3 (disconnected front).
///
/// With `g = 1 + 9 * sum(x_2..x_n) / (n - 1)`:
///
/// | Variant | f_2 |
/// |---|---|
/// | ZDT1 | `g (1 - sqrt(f_1 / g))` |
/// | ZDT2 | `g (1 - (f_1 / g)^2)` |
/// | ZDT3 | `g (1 - sqrt(f_1 / g) - (f_1 / g) sin(10 pi f_1))` |
///
/// and `f_1 = x_1`. The Pareto front lies at `x_2 = .. = x_n = 0`.
///
/// # Examples
///
/// ```
/// use u_moea::functions::Zdt;
/// use u_moea::representation::Function;
///
/// let f = Zdt::zdt1(3).unwrap();
/// assert_eq!(f.compute(&[0.25, 0.0, 0.0]).unwrap(), vec![0.25, 0.5]);
/// ```
#[derive(Debug, Clone)]
pub struct Zdt {
    variant: Variant,
    name: &'static str,
    inputs: Vec<ElementProperties>,
    outputs: Vec<ElementProperties>,
}

impl Zdt {
    fn build(variant: Variant, name: &'static str, n: usize) -> Result<Self> {
        if n < 2 {
            return Err(MoeaError::configuration(format!(
                "{name} needs at least 2 variables, got {n}"
            )));
        }
        Ok(Self {
            variant,
            name,
            inputs: unit_inputs(n),
            outputs: minimised_outputs(2),
        })
    }

    /// ZDT1 with `n` variables.
    pub fn zdt1(n: usize) -> Result<Self> {
        Self::build(Variant::Zdt1, "ZDT1", n)
    }

    /// ZDT2 with `n` variables.
    pub fn zdt2(n: usize) -> Result<Self> {
        Self::build(Variant::Zdt2, "ZDT2", n)
    }

    /// ZDT3 with `n` variables.
    pub fn zdt3(n: usize) -> Result<Self> {
        Self::build(Variant::Zdt3, "ZDT3", n)
    }
}

impl Function for Zdt {
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
        let n = x.len();
        let f1 = x[0];
        let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / (n - 1) as f64;
        let ratio = f1 / g;
        let h = match self.variant {
            Variant::Zdt1 => 1.0 - ratio.sqrt(),
            Variant::Zdt2 => 1.0 - ratio * ratio,
            Variant::Zdt3 => 1.0 - ratio.sqrt() - ratio * (10.0 * PI * f1).sin(),
        };
        Ok(vec![f1, g * h])
    }
}
