//! Population initialisation.

use crate::error::{MoeaError, Result};
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::random::{shuffle, MoeaRng};
use crate::representation::{merge_ids, Bounds, Problem, SolutionSet, Tag};
use rand::Rng;

/// How random decision vectors are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sampling {
    /// Independent uniform draws within bounds.
    #[default]
    Uniform,
    /// Latin hypercube: each variable's range is split into `size` strata
    /// and every stratum is used exactly once.
    LatinHypercube,
}

impl Sampling {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Sampling::Uniform => "uniform",
            Sampling::LatinHypercube => "lhs",
        }
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        match text {
            "uniform" => Ok(Sampling::Uniform),
            "lhs" | "latin-hypercube" => Ok(Sampling::LatinHypercube),
            other => Err(MoeaError::configuration(format!(
                "unknown sampling `{other}`, expected `uniform` or `lhs`"
            ))),
        }
    }
}

const PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("size", PropertyKind::Int, "Number of solutions created in generation 0"),
    PropertyDescriptor::new("sampling", PropertyKind::Text, "`uniform` or `lhs`"),
];

/// Creates the first population and recycles the previous generation's
/// survivors afterwards.
///
/// In generation 0 the user-supplied seed vectors come first, followed by
/// random vectors until `size` solutions exist. Once the
/// `for-next-iteration` feedback set exists, its members are forwarded
/// instead.
///
/// Reads (feedback): `for-next-iteration`. Publishes: `for-evaluation`.
///
/// Every decision variable must be bounded.
#[derive(Debug, Clone)]
pub struct RandomInit {
    name: String,
    size: usize,
    sampling: Sampling,
    seeds: Vec<Vec<f64>>,
    bounds: Vec<Bounds>,
}

impl RandomInit {
    /// Creates an initialiser for `size` solutions.
    pub fn new(size: usize) -> Self {
        Self {
            name: "initialisation".into(),
            size,
            sampling: Sampling::Uniform,
            seeds: Vec::new(),
            bounds: Vec::new(),
        }
    }

    /// Renames the node.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the sampling scheme.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Adds user-supplied decision vectors to the first population.
    pub fn with_seeds(mut self, seeds: Vec<Vec<f64>>) -> Self {
        self.seeds = seeds;
        self
    }

    fn sample(&self, count: usize, rng: &mut MoeaRng) -> Vec<Vec<f64>> {
        let mut out = vec![vec![0.0; self.bounds.len()]; count];
        if count == 0 {
            return out;
        }
        match self.sampling {
            Sampling::Uniform => {
                for x in &mut out {
                    for (v, b) in x.iter_mut().zip(&self.bounds) {
                        *v = b.lower() + rng.random::<f64>() * b.width();
                    }
                }
            }
            Sampling::LatinHypercube => {
                for (i, b) in self.bounds.iter().enumerate() {
                    let mut strata: Vec<usize> = (0..count).collect();
                    shuffle(&mut strata, rng);
                    for (x, &s) in out.iter_mut().zip(&strata) {
                        let u = (s as f64 + rng.random::<f64>()) / count as f64;
                        x[i] = b.lower() + u * b.width();
                    }
                }
            }
        }
        out
    }
}

impl Configurable for RandomInit {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "size" => Ok(self.size.into()),
            "sampling" => Ok(self.sampling.as_str().into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "size" => self.size = value.into_usize(key)?,
            "sampling" => self.sampling = Sampling::parse(&value.into_text(key)?)?,
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for RandomInit {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Initialisation
    }

    fn input_tags(&self) -> Vec<Tag> {
        Vec::new()
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::FOR_EVALUATION]
    }

    fn feedback_tags(&self) -> Vec<Tag> {
        vec![Tag::FOR_NEXT_ITERATION]
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        self.bounds = problem
            .decision_properties()
            .iter()
            .map(|p| {
                p.bounds().copied().ok_or_else(|| {
                    MoeaError::configuration(format!(
                        "decision variable `{}` needs bounds for random initialisation",
                        p.name()
                    ))
                })
            })
            .collect::<Result<_>>()?;
        for seed in &self.seeds {
            MoeaError::check_len("seed decision vector", problem.decision_dim(), seed.len())?;
        }
        Ok(())
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        if let Some(previous) = ctx.feedback(&Tag::FOR_NEXT_ITERATION) {
            let ids = merge_ids(previous);
            ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::FOR_EVALUATION));
            return Ok(());
        }

        let mut vectors: Vec<Vec<f64>> = self.seeds.iter().take(self.size).cloned().collect();
        let missing = self.size - vectors.len();
        vectors.extend(self.sample(missing, ctx.rng));

        let mut set = SolutionSet::new(self.name.clone()).with_tag(Tag::FOR_EVALUATION);
        for values in vectors {
            let decision = ctx.problem.decision_from_values(&values)?;
            set.push(ctx.store.create(decision, ctx.generation));
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

    #[test]
    fn test_creates_bounded_population() {
        let mut h = Harness::zdt1(4);
        let mut init = RandomInit::new(12);
        let out = h.run(&mut init);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), 12);
        for id in out[0].iter() {
            let s = h.store.get(id);
            assert!(!s.is_evaluated());
            assert!(s.decision_values().iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_latin_hypercube_covers_strata() {
        let mut h = Harness::zdt1(3);
        let mut init = RandomInit::new(10).with_sampling(Sampling::LatinHypercube);
        let out = h.run(&mut init);
        for var in 0..3 {
            let mut strata: Vec<usize> = out[0]
                .iter()
                .map(|id| (h.store.get(id).decision_values()[var] * 10.0).floor() as usize)
                .collect();
            strata.sort_unstable();
            assert_eq!(strata, (0..10).collect::<Vec<_>>(), "variable {var}");
        }
    }

    #[test]
    fn test_seeds_come_first() {
        let mut h = Harness::zdt1(2);
        let mut init = RandomInit::new(3).with_seeds(vec![vec![0.25, 0.75]]);
        let out = h.run(&mut init);
        let first = out[0].ids()[0];
        assert_eq!(h.store.get(first).decision_values(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_bad_seed_length() {
        let h = Harness::zdt1(2);
        let mut init = RandomInit::new(3).with_seeds(vec![vec![0.25]]);
        assert!(matches!(
            init.attach(&h.problem),
            Err(MoeaError::Dimensionality { .. })
        ));
    }

    #[test]
    fn test_forwards_feedback() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        h.put(Tag::FOR_NEXT_ITERATION, &[a]);
        let out = h.run(&mut RandomInit::new(5));
        assert_eq!(out[0].ids(), &[a]);
    }

    #[test]
    fn test_properties() {
        let mut init = RandomInit::new(5);
        init.set_property("sampling", "lhs".into()).unwrap();
        assert_eq!(init.property("sampling").unwrap(), PropertyValue::from("lhs"));
        assert!(init.set_property("sampling", "grid".into()).is_err());
        assert!(init.set_property("size", PropertyValue::Real(1.0)).is_err());
    }
}
