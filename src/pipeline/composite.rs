//! A sub-pipeline packaged as a single node.

use super::graph::Pipeline;
use super::node::{NodeContext, NodeKind, Operator};
use crate::error::{MoeaError, Result};
use crate::property::Configurable;
use crate::representation::{Problem, Tag};

/// Wraps a chain of nodes so it appears as one node to the outer pipeline.
///
/// The declared inputs are copied from the outer board into the inner one
/// before each run; the declared outputs are republished afterwards. The
/// inner nodes stay reachable through [`Pipeline::node_mut`] for property
/// access.
///
/// # Examples
///
/// ```
/// use u_moea::operators::{PolynomialMutation, SbxCrossover};
/// use u_moea::pipeline::Composite;
/// use u_moea::representation::Tag;
///
/// let variation = Composite::new(
///     "variation",
///     vec![Tag::MATING_POOL],
///     vec![Tag::MUTATED],
///     vec![Box::new(SbxCrossover::default()), Box::new(PolynomialMutation::default())],
/// )
/// .unwrap();
/// assert_eq!(variation.sub_pipeline_len(), 2);
/// ```
#[derive(Debug)]
pub struct Composite {
    name: String,
    inputs: Vec<Tag>,
    outputs: Vec<Tag>,
    inner: Pipeline,
}

impl Composite {
    /// Builds the composite; every output must be produced inside.
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<Tag>,
        outputs: Vec<Tag>,
        nodes: Vec<Box<dyn Operator>>,
    ) -> Result<Self> {
        let name = name.into();
        let inner = Pipeline::with_external(nodes, inputs.clone())?;
        if let Some(missing) = outputs.iter().find(|t| !inner.produces(t)) {
            return Err(MoeaError::configuration(format!(
                "composite `{name}` declares output `{missing}` that no inner node produces"
            )));
        }
        Ok(Self {
            name,
            inputs,
            outputs,
            inner,
        })
    }

    /// Number of top-level inner nodes.
    pub fn sub_pipeline_len(&self) -> usize {
        self.inner.len()
    }
}

impl Configurable for Composite {}

impl Operator for Composite {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Composite
    }

    fn input_tags(&self) -> Vec<Tag> {
        self.inputs.clone()
    }

    fn output_tags(&self) -> Vec<Tag> {
        self.outputs.clone()
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        self.inner.attach(problem)
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        for tag in &self.inputs {
            self.inner.supply(tag, ctx.input(tag).to_vec())?;
        }
        {
            let mut env = ctx.env();
            self.inner.run_generation(&mut env)?;
        }
        for tag in &self.outputs {
            for set in self.inner.sets(tag).unwrap_or_default() {
                ctx.publish(set.clone());
            }
        }
        Ok(())
    }

    fn sub_pipeline(&self) -> Option<&Pipeline> {
        Some(&self.inner)
    }

    fn sub_pipeline_mut(&mut self) -> Option<&mut Pipeline> {
        Some(&mut self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LogManager;
    use crate::pipeline::Stub;
    use crate::pipeline::RunEnv;
    use crate::random::create_rng;
    use crate::representation::{SolutionSet, SolutionStore};

    #[test]
    fn test_output_must_be_produced() {
        let r = Composite::new(
            "c",
            vec![Tag::MATING_POOL],
            vec![Tag::MUTATED],
            vec![Stub::new("x", &[Tag::MATING_POOL], &[Tag::OFFSPRING])],
        );
        assert!(matches!(r, Err(MoeaError::Configuration(_))));
    }

    #[test]
    fn test_runs_inside_outer_pipeline() {
        let inner = Composite::new(
            "c",
            vec![Tag::MATING_POOL],
            vec![Tag::MUTATED],
            vec![
                Stub::new("cross", &[Tag::MATING_POOL], &[Tag::OFFSPRING]),
                Stub::new("mutate", &[Tag::OFFSPRING], &[Tag::MUTATED]),
            ],
        )
        .unwrap();
        let mut outer = Pipeline::new(vec![
            Stub::new("select", &[], &[Tag::MATING_POOL]),
            Box::new(inner),
        ])
        .unwrap();

        let problem = Problem::builder()
            .function(crate::functions::Zdt::zdt1(2).unwrap())
            .build()
            .unwrap();
        let mut store = SolutionStore::new();
        let mut rng = create_rng(1);
        let mut log = LogManager::new();
        let mut evaluations = 0;
        let mut env = RunEnv {
            problem: &problem,
            store: &mut store,
            rng: &mut rng,
            log: &mut log,
            evaluations: &mut evaluations,
            generation: 0,
            parallel: false,
        };
        outer.run_generation(&mut env).unwrap();

        let mutated: &[SolutionSet] = outer.sets(&Tag::MUTATED).unwrap();
        let pool = outer.sets(&Tag::MATING_POOL).unwrap();
        assert_eq!(mutated[0].ids(), pool[0].ids());

        let d = outer.describe();
        assert_eq!(d[1].kind, NodeKind::Composite);
        assert_eq!(d[1].children.len(), 2);
        assert!(outer.node_mut("mutate").is_some());
    }
}
