//! Built-in dominance relations.

use super::{Dominance, DominanceRelation, RelationParameters};
use crate::error::{MoeaError, Result};

fn check_pair(name: &str, dim: usize, a: &[f64], b: &[f64]) -> Result<()> {
    MoeaError::check_len(name, dim, a.len())?;
    MoeaError::check_len(name, dim, b.len())
}

fn check_parameter(name: &str, dim: usize, v: &[f64]) -> Result<()> {
    MoeaError::check_len(&format!("{name} parameters"), dim, v.len())
}

/// Pareto comparison (minimization).
pub(crate) fn pareto_cmp(a: &[f64], b: &[f64]) -> Dominance {
    let mut a_better_in_some = false;
    let mut b_better_in_some = false;

    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va < vb {
            a_better_in_some = true;
        } else if vb < va {
            b_better_in_some = true;
        }
    }

    match (a_better_in_some, b_better_in_some) {
        (true, false) => Dominance::Better,
        (false, true) => Dominance::Worse,
        _ => Dominance::Incomparable,
    }
}

fn strong_cmp(a: &[f64], b: &[f64]) -> Dominance {
    if a.iter().zip(b).all(|(x, y)| x < y) {
        Dominance::Better
    } else if a.iter().zip(b).all(|(x, y)| y < x) {
        Dominance::Worse
    } else {
        Dominance::Incomparable
    }
}

/// Pareto dominance.
///
/// `a` dominates `b` when it is no worse in every objective and strictly
/// better in at least one. The strong variant requires strict improvement in
/// every objective.
///
/// # Examples
///
/// ```
/// use u_moea::dominance::{Dominance, DominanceRelation, ParetoDominance};
///
/// let pareto = ParetoDominance::new(2);
/// assert_eq!(pareto.is_better_than(&[1.0, 2.0], &[1.0, 3.0]).unwrap(), Dominance::Better);
/// assert_eq!(pareto.is_better_than(&[1.0, 3.0], &[2.0, 1.0]).unwrap(), Dominance::Incomparable);
///
/// let strong = ParetoDominance::strong(2);
/// assert_eq!(strong.is_better_than(&[1.0, 2.0], &[1.0, 3.0]).unwrap(), Dominance::Incomparable);
/// assert!(pareto.is_better_than(&[1.0], &[1.0, 2.0]).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ParetoDominance {
    dim: usize,
    strong: bool,
}

impl ParetoDominance {
    /// Standard Pareto dominance over `dim` objectives.
    pub fn new(dim: usize) -> Self {
        Self { dim, strong: false }
    }

    /// Strong Pareto dominance over `dim` objectives.
    pub fn strong(dim: usize) -> Self {
        Self { dim, strong: true }
    }
}

impl DominanceRelation for ParetoDominance {
    fn name(&self) -> &str {
        if self.strong {
            "pareto-strong"
        } else {
            "pareto"
        }
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_better_than(&self, a: &[f64], b: &[f64]) -> Result<Dominance> {
        check_pair(self.name(), self.dim, a, b)?;
        Ok(if self.strong {
            strong_cmp(a, b)
        } else {
            pareto_cmp(a, b)
        })
    }

    fn define_parameters(&mut self, parameters: &RelationParameters) -> Result<()> {
        match parameters {
            RelationParameters::None => Ok(()),
            other => Err(MoeaError::configuration(format!(
                "{} takes no parameters, got {other:?}",
                self.name()
            ))),
        }
    }
}

/// Additive ε-dominance.
///
/// `a` ε-dominates `b` when `a_i + ε_i <= b_i` for every objective, with
/// strict inequality in at least one. With all ε at zero this is Pareto
/// dominance; larger ε demand a larger margin before `a` counts as better.
#[derive(Debug, Clone)]
pub struct EpsilonDominance {
    epsilon: Vec<f64>,
}

impl EpsilonDominance {
    /// ε-dominance over `dim` objectives with all ε set to zero.
    pub fn new(dim: usize) -> Self {
        Self {
            epsilon: vec![0.0; dim],
        }
    }

    /// ε-dominance with the given per-objective ε.
    pub fn with_epsilon(epsilon: Vec<f64>) -> Result<Self> {
        let mut rel = Self::new(epsilon.len());
        rel.define_parameters(&RelationParameters::Epsilon(epsilon))?;
        Ok(rel)
    }

    /// Per-objective ε.
    pub fn epsilon(&self) -> &[f64] {
        &self.epsilon
    }

    fn dominates(&self, a: &[f64], b: &[f64]) -> bool {
        let mut strict = false;
        for ((&x, &y), &e) in a.iter().zip(b).zip(&self.epsilon) {
            if x + e > y {
                return false;
            }
            if x + e < y {
                strict = true;
            }
        }
        strict
    }
}

impl DominanceRelation for EpsilonDominance {
    fn name(&self) -> &str {
        "epsilon"
    }

    fn dimension(&self) -> usize {
        self.epsilon.len()
    }

    fn is_better_than(&self, a: &[f64], b: &[f64]) -> Result<Dominance> {
        check_pair(self.name(), self.dimension(), a, b)?;
        Ok(match (self.dominates(a, b), self.dominates(b, a)) {
            (true, false) => Dominance::Better,
            (false, true) => Dominance::Worse,
            _ => Dominance::Incomparable,
        })
    }

    fn define_parameters(&mut self, parameters: &RelationParameters) -> Result<()> {
        match parameters {
            RelationParameters::Epsilon(eps) => {
                check_parameter(self.name(), self.dimension(), eps)?;
                if eps.iter().any(|&e| !(e >= 0.0)) {
                    return Err(MoeaError::configuration(format!(
                        "epsilon values must be non-negative, got {eps:?}"
                    )));
                }
                self.epsilon.clone_from(eps);
                Ok(())
            }
            RelationParameters::None => Ok(()),
            other => Err(MoeaError::configuration(format!(
                "epsilon dominance expects epsilon values, got {other:?}"
            ))),
        }
    }
}

/// r-dominance around a weighted reference point.
///
/// Pareto dominance decides whenever it can. Between mutually non-dominated
/// vectors, `a` is better when its weighted Euclidean distance to the
/// reference point is smaller than `b`'s by more than the relative
/// threshold δ: `(d(a) - d(b)) / max(d(a), d(b)) < -δ`.
///
/// Until parameters are defined the relation behaves like Pareto dominance.
#[derive(Debug, Clone)]
pub struct ReferencePointDominance {
    dim: usize,
    point: Option<Vec<f64>>,
    weights: Vec<f64>,
    threshold: f64,
}

impl ReferencePointDominance {
    /// r-dominance over `dim` objectives, no reference point yet.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            point: None,
            weights: vec![1.0; dim],
            threshold: 0.0,
        }
    }

    fn distance(&self, point: &[f64], v: &[f64]) -> f64 {
        v.iter()
            .zip(point)
            .zip(&self.weights)
            .map(|((x, g), w)| w * (x - g) * (x - g))
            .sum::<f64>()
            .sqrt()
    }
}

impl DominanceRelation for ReferencePointDominance {
    fn name(&self) -> &str {
        "reference"
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_better_than(&self, a: &[f64], b: &[f64]) -> Result<Dominance> {
        check_pair(self.name(), self.dim, a, b)?;
        let pareto = pareto_cmp(a, b);
        let point = match (&self.point, pareto) {
            (Some(p), Dominance::Incomparable) => p,
            _ => return Ok(pareto),
        };

        let da = self.distance(point, a);
        let db = self.distance(point, b);
        let scale = da.max(db);
        if scale <= 0.0 {
            return Ok(Dominance::Incomparable);
        }
        let d = (da - db) / scale;
        Ok(if d < -self.threshold {
            Dominance::Better
        } else if d > self.threshold {
            Dominance::Worse
        } else {
            Dominance::Incomparable
        })
    }

    fn define_parameters(&mut self, parameters: &RelationParameters) -> Result<()> {
        match parameters {
            RelationParameters::Reference {
                point,
                weights,
                threshold,
            } => {
                check_parameter(self.name(), self.dim, point)?;
                check_parameter(self.name(), self.dim, weights)?;
                if weights.iter().any(|&w| !(w >= 0.0)) {
                    return Err(MoeaError::configuration("reference weights must be non-negative"));
                }
                if !(0.0..=1.0).contains(threshold) {
                    return Err(MoeaError::configuration(format!(
                        "reference threshold must lie in [0, 1], got {threshold}"
                    )));
                }
                self.point = Some(point.clone());
                self.weights.clone_from(weights);
                self.threshold = *threshold;
                Ok(())
            }
            RelationParameters::None => Ok(()),
            other => Err(MoeaError::configuration(format!(
                "reference dominance expects a reference point, got {other:?}"
            ))),
        }
    }
}

/// Goal-based preferability.
///
/// For `u` compared with `v`, split the objectives into those where `u`
/// meets its goal and those where it does not. `u` is preferable when it
/// Pareto-dominates `v` on the missed objectives, or ties them exactly and
/// then either `v` misses a goal `u` meets or `u` Pareto-dominates `v` on
/// the met objectives. With every goal at `+inf` this is Pareto dominance.
#[derive(Debug, Clone)]
pub struct Preferability {
    goals: Vec<f64>,
}

impl Preferability {
    /// Preferability over `dim` objectives with unreachable-free goals (`+inf`).
    pub fn new(dim: usize) -> Self {
        Self {
            goals: vec![f64::INFINITY; dim],
        }
    }

    /// Preferability with the given goals.
    pub fn with_goals(goals: Vec<f64>) -> Result<Self> {
        let mut rel = Self::new(goals.len());
        rel.define_parameters(&RelationParameters::Goals(goals))?;
        Ok(rel)
    }

    fn preferable(&self, u: &[f64], v: &[f64]) -> bool {
        let mut missed_u = Vec::new();
        let mut missed_v = Vec::new();
        let mut met_u = Vec::new();
        let mut met_v = Vec::new();
        let mut v_misses_met_goal = false;

        for ((&x, &y), &g) in u.iter().zip(v).zip(&self.goals) {
            if x > g {
                missed_u.push(x);
                missed_v.push(y);
            } else {
                met_u.push(x);
                met_v.push(y);
                if y > g {
                    v_misses_met_goal = true;
                }
            }
        }

        match pareto_cmp(&missed_u, &missed_v) {
            Dominance::Better => true,
            _ if missed_u == missed_v => {
                v_misses_met_goal || pareto_cmp(&met_u, &met_v) == Dominance::Better
            }
            _ => false,
        }
    }
}

impl DominanceRelation for Preferability {
    fn name(&self) -> &str {
        "preferability"
    }

    fn dimension(&self) -> usize {
        self.goals.len()
    }

    fn is_better_than(&self, a: &[f64], b: &[f64]) -> Result<Dominance> {
        check_pair(self.name(), self.dimension(), a, b)?;
        Ok(match (self.preferable(a, b), self.preferable(b, a)) {
            (true, false) => Dominance::Better,
            (false, true) => Dominance::Worse,
            _ => Dominance::Incomparable,
        })
    }

    fn define_parameters(&mut self, parameters: &RelationParameters) -> Result<()> {
        match parameters {
            RelationParameters::Goals(goals) => {
                check_parameter(self.name(), self.dimension(), goals)?;
                self.goals.clone_from(goals);
                Ok(())
            }
            RelationParameters::None => Ok(()),
            other => Err(MoeaError::configuration(format!(
                "preferability expects goals, got {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn relations(dim: usize) -> Vec<Box<dyn DominanceRelation>> {
        let mut reference = ReferencePointDominance::new(dim);
        reference
            .define_parameters(&RelationParameters::Reference {
                point: vec![0.5; dim],
                weights: vec![1.0; dim],
                threshold: 0.1,
            })
            .unwrap();
        vec![
            Box::new(ParetoDominance::new(dim)),
            Box::new(ParetoDominance::strong(dim)),
            Box::new(EpsilonDominance::with_epsilon(vec![0.05; dim]).unwrap()),
            Box::new(reference),
            Box::new(Preferability::with_goals(vec![0.4; dim]).unwrap()),
        ]
    }

    #[test]
    fn test_pareto_basic() {
        let p = ParetoDominance::new(3);
        assert_eq!(
            p.is_better_than(&[1.0, 1.0, 1.0], &[1.0, 1.0, 1.0]).unwrap(),
            Dominance::Incomparable
        );
        assert_eq!(
            p.is_better_than(&[2.0, 1.0, 1.0], &[1.0, 1.0, 1.0]).unwrap(),
            Dominance::Worse
        );
    }

    #[test]
    fn test_epsilon_margin() {
        let e = EpsilonDominance::with_epsilon(vec![0.5, 0.5]).unwrap();
        // Pareto-better but within the margin
        assert_eq!(
            e.is_better_than(&[1.0, 1.0], &[1.2, 1.2]).unwrap(),
            Dominance::Incomparable
        );
        assert_eq!(
            e.is_better_than(&[1.0, 1.0], &[1.5, 2.0]).unwrap(),
            Dominance::Better
        );
        assert!(EpsilonDominance::with_epsilon(vec![-0.1]).is_err());
    }

    #[test]
    fn test_reference_prefers_closer_point() {
        let mut r = ReferencePointDominance::new(2);
        r.define_parameters(&RelationParameters::Reference {
            point: vec![0.0, 0.0],
            weights: vec![1.0, 1.0],
            threshold: 0.0,
        })
        .unwrap();
        assert_eq!(
            r.is_better_than(&[1.0, 1.0], &[0.0, 3.0]).unwrap(),
            Dominance::Better
        );
        // Pareto still decides when it can
        assert_eq!(
            r.is_better_than(&[2.0, 2.0], &[1.0, 1.0]).unwrap(),
            Dominance::Worse
        );
    }

    #[test]
    fn test_reference_parameter_dimension_checked() {
        let mut r = ReferencePointDominance::new(2);
        let err = r
            .define_parameters(&RelationParameters::Reference {
                point: vec![0.0],
                weights: vec![1.0, 1.0],
                threshold: 0.1,
            })
            .unwrap_err();
        assert!(matches!(err, MoeaError::Dimensionality { expected: 2, found: 1, .. }));
        assert!(ParetoDominance::new(2)
            .define_parameters(&RelationParameters::Goals(vec![0.0, 0.0]))
            .is_err());
    }

    #[test]
    fn test_preferability_goals() {
        let p = Preferability::with_goals(vec![1.0, 1.0]).unwrap();
        // a meets both goals, b misses one: a preferable despite being incomparable
        assert_eq!(
            p.is_better_than(&[0.9, 0.2], &[0.1, 1.5]).unwrap(),
            Dominance::Better
        );
        // both meet all goals: plain Pareto
        assert_eq!(
            p.is_better_than(&[0.5, 0.5], &[0.4, 0.6]).unwrap(),
            Dominance::Incomparable
        );
        // both miss the same goal: decided on the missed objective
        assert_eq!(
            p.is_better_than(&[2.0, 0.9], &[3.0, 0.1]).unwrap(),
            Dominance::Better
        );
    }

    proptest! {
        #[test]
        fn prop_antisymmetric_and_irreflexive(
            a in prop::collection::vec(0.0f64..1.0, 3),
            b in prop::collection::vec(0.0f64..1.0, 3),
        ) {
            for rel in relations(3) {
                let ab = rel.is_better_than(&a, &b).unwrap();
                let ba = rel.is_better_than(&b, &a).unwrap();
                prop_assert_eq!(ab, ba.reverse(), "{} not antisymmetric", rel.name());
                prop_assert_eq!(
                    rel.is_better_than(&a, &a).unwrap(),
                    Dominance::Incomparable,
                    "{} not irreflexive",
                    rel.name()
                );
            }
        }
    }
}
