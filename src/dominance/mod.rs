//! Dominance relations and dominance ranking.
//!
//! A [`DominanceRelation`] compares two objective vectors (minimization) and
//! answers with a three-valued [`Dominance`]. Ranking functions in
//! [`sorting`] build fronts on top of any relation.
//!
//! # Relations
//!
//! - [`ParetoDominance`]: classic Pareto dominance, with a strong variant
//! - [`EpsilonDominance`]: additive ε-dominance
//! - [`ReferencePointDominance`]: r-dominance around a weighted reference point
//! - [`Preferability`]: goal-based preferability
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic Algorithm: NSGA-II"
//! - Laumanns et al. (2002), "Combining Convergence and Diversity in Evolutionary
//!   Multiobjective Optimization"
//! - Ben Said, Bechikh & Ghédira (2010), "The r-Dominance: A New Dominance
//!   Relation for Interactive Evolutionary Multicriteria Decision Making"
//! - Fonseca & Fleming (1998), "Multiobjective Optimization and Multiple
//!   Constraint Handling with Evolutionary Algorithms, Part I"

mod relations;
pub mod sorting;

pub use relations::{EpsilonDominance, ParetoDominance, Preferability, ReferencePointDominance};
pub use sorting::{
    compare_constrained, dominance_count, non_dominated_sort, non_dominated_sort_by,
    NondominatedSortResult,
};

use crate::error::Result;

/// Outcome of comparing `a` against `b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dominance {
    /// `a` is strictly better than `b`.
    Better,
    /// `b` is strictly better than `a`.
    Worse,
    /// Neither is better.
    Incomparable,
}

impl Dominance {
    /// The outcome with `a` and `b` swapped.
    pub fn reverse(self) -> Self {
        match self {
            Dominance::Better => Dominance::Worse,
            Dominance::Worse => Dominance::Better,
            Dominance::Incomparable => Dominance::Incomparable,
        }
    }
}

/// Auxiliary data for relations that need it.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationParameters {
    /// No parameters.
    None,
    /// Per-objective ε values.
    Epsilon(Vec<f64>),
    /// Reference point, per-objective weights and significance threshold δ.
    Reference {
        /// Preferred point in objective space.
        point: Vec<f64>,
        /// Non-negative per-objective weights.
        weights: Vec<f64>,
        /// Threshold δ in `[0, 1]`.
        threshold: f64,
    },
    /// Per-objective goal values.
    Goals(Vec<f64>),
}

/// A strategy comparing two objective vectors.
///
/// Implementations are stateless apart from the configuration given at
/// construction or through [`define_parameters`](Self::define_parameters),
/// must be irreflexive (`is_better_than(a, a)` is `Incomparable`) and must be
/// antisymmetric (`Better` one way implies `Worse` the other way).
pub trait DominanceRelation: Send + Sync {
    /// Identifier of the relation.
    fn name(&self) -> &str;

    /// Number of objectives the relation was built for.
    fn dimension(&self) -> usize;

    /// Compares `a` against `b`.
    ///
    /// Fails with [`MoeaError::Dimensionality`](crate::error::MoeaError::Dimensionality)
    /// when either vector does not have [`dimension`](Self::dimension) entries.
    fn is_better_than(&self, a: &[f64], b: &[f64]) -> Result<Dominance>;

    /// Supplies auxiliary parameters.
    ///
    /// Fails on parameters the relation does not understand and on vectors
    /// whose length differs from [`dimension`](Self::dimension).
    fn define_parameters(&mut self, parameters: &RelationParameters) -> Result<()>;
}
