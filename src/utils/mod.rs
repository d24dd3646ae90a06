//! Numerical utilities.
//!
//! - [`interpolation`]: table interpolation with bracketing search
//! - [`rbf`]: radial basis kernels and scattered-data interpolation
//! - [`lattice`]: simplex-lattice reference points

pub mod interpolation;
pub mod lattice;
pub mod rbf;

pub use interpolation::{Interpolator, LinearInterpolator, SampleTable, ZeroOrderInterpolator};
pub use lattice::{lattice_for_size, lattice_size, simplex_lattice};
pub use rbf::{
    GaussianRbf, InverseMultiquadricRbf, MultiquadricRbf, RadialBasis, RbfInterpolator,
    ThinPlateRbf,
};
