//! Real-coded variation: simulated binary crossover and polynomial mutation.
//!
//! Both operators work variable by variable on the decision vector's raw
//! values and rebuild children through the problem's declarations, so
//! integer kinds are rounded and bounds are clamped once at creation.
//! Ordinal and nominal variables are never interpolated: crossover swaps
//! them between the children, mutation resets them to a random category.
//!
//! # References
//!
//! - Deb & Agrawal (1995), "Simulated Binary Crossover for Continuous Search Space"
//! - Deb & Goyal (1996), "A Combined Genetic Adaptive Search (GeneAS) for
//!   Engineering Design"

use crate::error::{MoeaError, Result};
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::representation::{Bounds, ElementType, Problem, SolutionId, SolutionSet, Tag};
use rand::Rng;

const EPS: f64 = 1e-14;

/// SBX spread factor for one child.
fn sbx_beta_q(u: f64, beta: f64, eta: f64) -> f64 {
    let alpha = 2.0 - beta.powf(-(eta + 1.0));
    if u <= 1.0 / alpha {
        (u * alpha).powf(1.0 / (eta + 1.0))
    } else {
        (1.0 / (2.0 - u * alpha)).powf(1.0 / (eta + 1.0))
    }
}

/// Crosses two values of one variable.
///
/// Bounded variables use Deb's bounded SBX, where each child's spread is
/// limited by the distance of the nearer parent to its bound; unbounded
/// variables use the original unbounded form. Both children share one
/// uniform draw and are swapped with probability 0.5.
pub(crate) fn sbx_pair<R: Rng>(a: f64, b: f64, bounds: Option<&Bounds>, eta: f64, rng: &mut R) -> (f64, f64) {
    if (a - b).abs() <= EPS {
        return (a, b);
    }
    let u = rng.random::<f64>();
    let (y1, y2) = if a < b { (a, b) } else { (b, a) };
    let (c1, c2) = match bounds {
        Some(bd) => {
            let span = y2 - y1;
            let bq1 = sbx_beta_q(u, 1.0 + 2.0 * (y1 - bd.lower()) / span, eta);
            let bq2 = sbx_beta_q(u, 1.0 + 2.0 * (bd.upper() - y2) / span, eta);
            (
                bd.clamp(0.5 * ((y1 + y2) - bq1 * span)),
                bd.clamp(0.5 * ((y1 + y2) + bq2 * span)),
            )
        }
        None => {
            let bq = if u <= 0.5 {
                (2.0 * u).powf(1.0 / (eta + 1.0))
            } else {
                (1.0 / (2.0 * (1.0 - u))).powf(1.0 / (eta + 1.0))
            };
            (
                0.5 * ((1.0 + bq) * y1 + (1.0 - bq) * y2),
                0.5 * ((1.0 - bq) * y1 + (1.0 + bq) * y2),
            )
        }
    };
    if rng.random_bool(0.5) {
        (c2, c1)
    } else {
        (c1, c2)
    }
}

/// Deb's bounded polynomial perturbation of `y`, clamped to `bounds`.
pub(crate) fn polynomial_mutate<R: Rng>(y: f64, bounds: &Bounds, eta: f64, rng: &mut R) -> f64 {
    let width = bounds.width();
    if width <= 0.0 {
        return y;
    }
    let d1 = (y - bounds.lower()) / width;
    let d2 = (bounds.upper() - y) / width;
    let u = rng.random::<f64>();
    let power = 1.0 / (eta + 1.0);
    let dq = if u < 0.5 {
        let v = 2.0 * u + (1.0 - 2.0 * u) * (1.0 - d1).powf(eta + 1.0);
        v.powf(power) - 1.0
    } else {
        let v = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * (1.0 - d2).powf(eta + 1.0);
        1.0 - v.powf(power)
    };
    bounds.clamp(y + dq * width)
}

fn check_rate(key: &str, v: f64) -> Result<f64> {
    if (0.0..=1.0).contains(&v) {
        Ok(v)
    } else {
        Err(MoeaError::configuration(format!(
            "property `{key}` must lie in [0, 1], got {v}"
        )))
    }
}

fn check_eta(key: &str, v: f64) -> Result<f64> {
    if v >= 0.0 && v.is_finite() {
        Ok(v)
    } else {
        Err(MoeaError::configuration(format!(
            "property `{key}` must be a non-negative number, got {v}"
        )))
    }
}

const SBX_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("probability", PropertyKind::Real, "Probability that a pair is crossed"),
    PropertyDescriptor::new("eta", PropertyKind::Real, "Distribution index"),
    PropertyDescriptor::new("per_variable", PropertyKind::Real, "Probability that a variable is crossed"),
    PropertyDescriptor::new("offspring_per_pair", PropertyKind::Int, "Children kept per pair (1 or 2)"),
    PropertyDescriptor::new("max_offspring", PropertyKind::Int, "Cap on children per generation; 0 is unlimited"),
];

/// Simulated binary crossover.
///
/// Every mating-pool set is read as consecutive parent pairs. A pair is
/// crossed with `probability`; within a crossed pair each variable is
/// recombined with `per_variable`. Uncrossed pairs yield copies of the
/// parents (evaluation included).
///
/// Reads: `mating-pool`. Publishes: `offspring`.
#[derive(Debug, Clone)]
pub struct SbxCrossover {
    name: String,
    probability: f64,
    eta: f64,
    per_variable: f64,
    offspring_per_pair: usize,
    max_offspring: Option<usize>,
}

impl SbxCrossover {
    /// SBX with the given pair probability and distribution index.
    pub fn new(probability: f64, eta: f64) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            eta: eta.max(0.0),
            ..Self::default()
        }
    }

    /// Sets the per-variable crossover probability (clamped to `[0, 1]`).
    pub fn with_per_variable(mut self, p: f64) -> Self {
        self.per_variable = p.clamp(0.0, 1.0);
        self
    }

    /// Keeps one or two children per pair.
    pub fn with_offspring_per_pair(mut self, n: usize) -> Self {
        self.offspring_per_pair = n.clamp(1, 2);
        self
    }

    /// Stops after `n` children in one generation.
    pub fn with_max_offspring(mut self, n: usize) -> Self {
        self.max_offspring = Some(n);
        self
    }
}

impl Default for SbxCrossover {
    fn default() -> Self {
        Self {
            name: "crossover".into(),
            probability: 0.9,
            eta: 15.0,
            per_variable: 0.5,
            offspring_per_pair: 2,
            max_offspring: None,
        }
    }
}

impl Configurable for SbxCrossover {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        SBX_PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "probability" => Ok(self.probability.into()),
            "eta" => Ok(self.eta.into()),
            "per_variable" => Ok(self.per_variable.into()),
            "offspring_per_pair" => Ok(self.offspring_per_pair.into()),
            "max_offspring" => Ok(self.max_offspring.unwrap_or(0).into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "probability" => self.probability = check_rate(key, value.into_real(key)?)?,
            "eta" => self.eta = check_eta(key, value.into_real(key)?)?,
            "per_variable" => self.per_variable = check_rate(key, value.into_real(key)?)?,
            "offspring_per_pair" => {
                let n = value.into_usize(key)?;
                if !(1..=2).contains(&n) {
                    return Err(MoeaError::configuration(format!(
                        "property `{key}` must be 1 or 2, got {n}"
                    )));
                }
                self.offspring_per_pair = n;
            }
            "max_offspring" => {
                let n = value.into_usize(key)?;
                self.max_offspring = (n > 0).then_some(n);
            }
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for SbxCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Direction
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::MATING_POOL]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::OFFSPRING]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let pool = ctx.input(&Tag::MATING_POOL);
        let limit = self.max_offspring.unwrap_or(usize::MAX);
        let mut set = SolutionSet::new(self.name.clone()).with_tag(Tag::OFFSPRING);

        'pairs: for pair in pool.iter().flat_map(|s| s.ids().chunks_exact(2)) {
            let (pa, pb) = (pair[0], pair[1]);
            let children: [SolutionId; 2] = if ctx.rng.random_bool(self.probability) {
                let xa = ctx.store.get(pa).decision_values();
                let xb = ctx.store.get(pb).decision_values();
                let mut ca = xa.clone();
                let mut cb = xb.clone();
                for (i, decl) in ctx.problem.decision_properties().iter().enumerate() {
                    if !ctx.rng.random_bool(self.per_variable) {
                        continue;
                    }
                    if decl.kind().is_categorical() {
                        if ctx.rng.random_bool(0.5) {
                            ca[i] = xb[i];
                            cb[i] = xa[i];
                        }
                    } else {
                        (ca[i], cb[i]) = sbx_pair(xa[i], xb[i], decl.bounds(), self.eta, ctx.rng);
                    }
                }
                let da = ctx.problem.decision_from_values(&ca)?;
                let db = ctx.problem.decision_from_values(&cb)?;
                [
                    ctx.store.create(da, ctx.generation),
                    ctx.store.create(db, ctx.generation),
                ]
            } else {
                [ctx.store.duplicate(pa), ctx.store.duplicate(pb)]
            };

            for child in children.into_iter().take(self.offspring_per_pair) {
                if set.len() >= limit {
                    break 'pairs;
                }
                set.push(child);
            }
        }

        ctx.publish(set);
        Ok(())
    }
}

const PM_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("eta", PropertyKind::Real, "Distribution index"),
    PropertyDescriptor::new(
        "probability",
        PropertyKind::Real,
        "Per-variable mutation probability; 0 means 1/n",
    ),
];

/// Polynomial mutation.
///
/// Each variable mutates with `probability` (default `1/n` for `n`
/// decision variables). A solution with at least one changed variable is
/// replaced by a new, unevaluated one; untouched solutions pass through.
/// Unbounded real variables are left unchanged.
///
/// Reads: `offspring`. Publishes: `mutated`.
#[derive(Debug, Clone)]
pub struct PolynomialMutation {
    name: String,
    eta: f64,
    probability: Option<f64>,
    dimension: usize,
}

impl PolynomialMutation {
    /// Mutation with distribution index `eta` and the default rate.
    pub fn new(eta: f64) -> Self {
        Self {
            eta: eta.max(0.0),
            ..Self::default()
        }
    }

    /// Fixes the per-variable rate (clamped to `[0, 1]`).
    pub fn with_probability(mut self, p: f64) -> Self {
        self.probability = Some(p.clamp(0.0, 1.0));
        self
    }

    fn rate(&self) -> f64 {
        self.probability
            .unwrap_or_else(|| 1.0 / self.dimension.max(1) as f64)
    }
}

impl Default for PolynomialMutation {
    fn default() -> Self {
        Self {
            name: "mutation".into(),
            eta: 20.0,
            probability: None,
            dimension: 0,
        }
    }
}

impl Configurable for PolynomialMutation {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        PM_PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "eta" => Ok(self.eta.into()),
            "probability" => Ok(self.probability.unwrap_or(0.0).into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "eta" => self.eta = check_eta(key, value.into_real(key)?)?,
            "probability" => {
                let p = check_rate(key, value.into_real(key)?)?;
                self.probability = (p > 0.0).then_some(p);
            }
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for PolynomialMutation {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Direction
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::OFFSPRING]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::MUTATED]
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        self.dimension = problem.decision_dim();
        Ok(())
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = super::collect(ctx, &Tag::OFFSPRING);
        let rate = self.rate();
        let mut set = SolutionSet::new(self.name.clone()).with_tag(Tag::MUTATED);

        for id in ids {
            let mut x = ctx.store.get(id).decision_values();
            let mut changed = false;
            for (i, decl) in ctx.problem.decision_properties().iter().enumerate() {
                if !ctx.rng.random_bool(rate) {
                    continue;
                }
                let Some(bounds) = decl.bounds() else {
                    continue;
                };
                let v = if decl.kind().is_categorical() {
                    let lo = bounds.lower().ceil() as i64;
                    let hi = bounds.upper().floor() as i64;
                    if hi <= lo {
                        continue;
                    }
                    ctx.rng.random_range(lo..=hi) as f64
                } else {
                    let v = polynomial_mutate(x[i], bounds, self.eta, ctx.rng);
                    if decl.kind() == ElementType::Integer {
                        v.round()
                    } else {
                        v
                    }
                };
                if v != x[i] {
                    x[i] = v;
                    changed = true;
                }
            }

            if changed {
                let decision = ctx.problem.decision_from_values(&x)?;
                set.push(ctx.store.create(decision, ctx.generation));
            } else {
                set.push(id);
            }
        }

        ctx.publish(set);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::testing::Harness;
    use crate::random::create_rng;
    use crate::representation::{ElementProperties, Function};

    #[test]
    fn test_sbx_pair_stays_in_bounds_and_preserves_mean() {
        let mut rng = create_rng(7);
        let b = Bounds::UNIT;
        for _ in 0..500 {
            let (c1, c2) = sbx_pair(0.2, 0.7, Some(&b), 15.0, &mut rng);
            assert!((0.0..=1.0).contains(&c1) && (0.0..=1.0).contains(&c2));
        }
        // unbounded children are symmetric around the parents' mean
        let (c1, c2) = sbx_pair(1.0, 3.0, None, 15.0, &mut rng);
        assert!(((c1 + c2) / 2.0 - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_sbx_identical_parents() {
        let mut rng = create_rng(1);
        assert_eq!(sbx_pair(0.4, 0.4, Some(&Bounds::UNIT), 15.0, &mut rng), (0.4, 0.4));
    }

    #[test]
    fn test_polynomial_mutation_in_bounds() {
        let mut rng = create_rng(3);
        let b = Bounds::new(-2.0, 5.0).unwrap();
        for y in [-2.0, 0.0, 5.0] {
            for _ in 0..200 {
                assert!(b.contains(polynomial_mutate(y, &b, 20.0, &mut rng)));
            }
        }
    }

    #[test]
    fn test_crossover_creates_children() {
        let mut h = Harness::zdt1(3);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.store.create(h.problem.decision_from_values(&[0.1, 0.9, 0.3]).unwrap(), 0);
        let c = h.solution(&[2.0, 2.0]);
        let d = h.solution(&[3.0, 3.0]);
        h.board.insert(
            Tag::MATING_POOL,
            vec![
                SolutionSet::from_ids("p0", [a, b]).with_tag(Tag::MATING_POOL),
                SolutionSet::from_ids("p1", [c, d]).with_tag(Tag::MATING_POOL),
            ],
        );

        let mut sbx = SbxCrossover::new(1.0, 15.0).with_per_variable(1.0);
        let out = h.run(&mut sbx);
        assert_eq!(out[0].len(), 4);
        for id in out[0].iter() {
            assert!(![a, b, c, d].contains(&id));
            assert!(!h.store.get(id).is_evaluated());
        }

        let mut capped = SbxCrossover::new(1.0, 15.0).with_max_offspring(3);
        assert_eq!(h.run(&mut capped)[0].len(), 3);
        let mut single = SbxCrossover::new(1.0, 15.0).with_offspring_per_pair(1);
        assert_eq!(h.run(&mut single)[0].len(), 2);
    }

    #[test]
    fn test_no_crossover_copies_parents() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[2.0, 2.0]);
        h.put(Tag::MATING_POOL, &[a, b]);
        let out = h.run(&mut SbxCrossover::new(0.0, 15.0));
        let objs: Vec<_> = out[0].iter().map(|id| h.store.get(id).objectives().unwrap().to_vec()).collect();
        assert_eq!(objs, vec![vec![1.0, 1.0], vec![2.0, 2.0]]);
    }

    #[test]
    fn test_mutation_replaces_changed_solutions() {
        let mut h = Harness::zdt1(4);
        let ids: Vec<_> = (0..3).map(|i| h.solution(&[i as f64, 0.0])).collect();
        h.put(Tag::OFFSPRING, &ids);

        let out = h.run(&mut PolynomialMutation::default().with_probability(1.0));
        for (new, old) in out[0].iter().zip(&ids) {
            assert_ne!(new, *old);
            assert!(!h.store.get(new).is_evaluated());
        }

        let out = h.run(&mut PolynomialMutation::default().with_probability(0.0));
        assert_eq!(out[0].ids(), ids.as_slice());
    }

    struct Categorical {
        inputs: Vec<ElementProperties>,
        outputs: Vec<ElementProperties>,
    }

    impl Function for Categorical {
        fn name(&self) -> &str {
            "categorical"
        }
        fn inputs(&self) -> &[ElementProperties] {
            &self.inputs
        }
        fn outputs(&self) -> &[ElementProperties] {
            &self.outputs
        }
        fn compute(&self, x: &[f64]) -> Result<Vec<f64>> {
            Ok(vec![x[0], -x[0]])
        }
    }

    #[test]
    fn test_categorical_values_stay_whole() {
        let problem = Problem::builder()
            .function(Categorical {
                inputs: vec![ElementProperties::new("colour")
                    .with_kind(ElementType::Nominal)
                    .with_bounds(Bounds::new(0.0, 4.0).unwrap())],
                outputs: vec![
                    ElementProperties::new("f1").minimize(),
                    ElementProperties::new("f2").minimize(),
                ],
            })
            .build()
            .unwrap();
        let mut h = Harness::new(problem);
        let ids: Vec<_> = (0..10)
            .map(|i| {
                let x = h.problem.decision_from_values(&[(i % 5) as f64]).unwrap();
                h.store.create(x, 0)
            })
            .collect();
        h.put(Tag::OFFSPRING, &ids);
        let out = h.run(&mut PolynomialMutation::default().with_probability(1.0));
        for id in out[0].iter() {
            let v = h.store.get(id).decision_values()[0];
            assert_eq!(v, v.round());
            assert!((0.0..=4.0).contains(&v));
        }
    }

    #[test]
    fn test_properties() {
        let mut pm = PolynomialMutation::default();
        assert_eq!(pm.property("eta").unwrap(), PropertyValue::Real(20.0));
        assert!(pm.set_property("probability", PropertyValue::Real(1.5)).is_err());
        pm.set_property("probability", PropertyValue::Real(0.25)).unwrap();
        assert_eq!(pm.property("probability").unwrap(), PropertyValue::Real(0.25));

        let mut sbx = SbxCrossover::default();
        assert!(sbx.set_property("offspring_per_pair", 3usize.into()).is_err());
        sbx.set_property("eta", PropertyValue::Int(10)).unwrap();
        assert_eq!(sbx.property("eta").unwrap(), PropertyValue::Real(10.0));
    }
}
