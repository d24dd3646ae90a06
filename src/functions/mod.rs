//! Benchmark test functions.
//!
//! All variables are real and lie in `[0, 1]`; inputs are named `x_1 ..
//! x_n` and minimised outputs `f_1 .. f_m`.
//!
//! # References
//!
//! - Zitzler, Deb & Thiele (2000), "Comparison of Multiobjective Evolutionary
//!   Algorithms: Empirical Results"
//! - Deb, Thiele, Laumanns & Zitzler (2002), "Scalable Multi-Objective
//!   Optimization Test Problems"

mod dtlz;
mod zdt;

pub use dtlz::Dtlz;
pub use zdt::Zdt;

use crate::representation::{Bounds, ElementProperties};

fn unit_inputs(n: usize) -> Vec<ElementProperties> {
    (1..=n)
        .map(|i| {
            ElementProperties::new(format!("x_{i}"))
                .with_description(format!("Decision variable n.{i}"))
                .with_bounds(Bounds::UNIT)
        })
        .collect()
}

fn minimised_outputs(m: usize) -> Vec<ElementProperties> {
    (1..=m)
        .map(|i| {
            ElementProperties::new(format!("f_{i}"))
                .with_description(format!("Objective function n.{i}"))
                .minimize()
        })
        .collect()
}
