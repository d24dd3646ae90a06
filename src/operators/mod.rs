//! Concrete pipeline nodes.
//!
//! | Kind | Nodes |
//! |---|---|
//! | Initialisation | [`RandomInit`] |
//! | Evaluator | [`Evaluator`] |
//! | Fitness | [`NonDominanceRanking`], [`MogaRanking`], [`CrowdingDistance`], [`ReferencePointNiching`], [`AverageFitness`], [`SharedFitness`] |
//! | Filtration | [`EliteSelection`], [`TournamentSelection`], [`StochasticUniversalSampling`], [`SmsEmoaReduce`], [`MergeForNextIteration`] |
//! | Archive | [`NonDominatedArchive`] |
//! | Direction | [`SbxCrossover`], [`PolynomialMutation`] |
//!
//! Every node reads and writes default tags (see each type) and exposes its
//! parameters as properties.
//!
//! # References
//!
//! - Deb & Agrawal (1995), "Simulated Binary Crossover for Continuous Search Space"
//! - Deb & Goyal (1996), "A Combined Genetic Adaptive Search (GeneAS) for
//!   Engineering Design"
//! - Baker (1987), "Reducing Bias and Inefficiency in the Selection Algorithm"
//! - Fonseca & Fleming (1993), "Genetic Algorithms for Multiobjective
//!   Optimization: Formulation, Discussion and Generalization"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting Approach"
//! - Beume, Naujoks & Emmerich (2007), "SMS-EMOA: Multiobjective Selection
//!   Based on Dominated Hypervolume"

mod archive;
mod evaluation;
mod fitness;
mod initialisation;
mod niching;
mod selection;
mod variation;

pub use archive::NonDominatedArchive;
pub use evaluation::Evaluator;
pub use fitness::{AverageFitness, CrowdingDistance, MogaRanking, NonDominanceRanking, SharedFitness};
pub use initialisation::{RandomInit, Sampling};
pub use niching::ReferencePointNiching;
pub use selection::{
    EliteSelection, MergeForNextIteration, SmsEmoaReduce, StochasticUniversalSampling,
    TournamentSelection,
};
pub use variation::{PolynomialMutation, SbxCrossover};

use crate::dominance::{DominanceRelation, ParetoDominance};
use crate::error::{MoeaError, Result};
use crate::pipeline::NodeContext;
use crate::representation::{merge_ids, Problem, SolutionId, SolutionStore, Tag};
use std::cmp::Ordering;

/// Members of every set published under `tag`, first occurrence kept.
fn collect(ctx: &NodeContext<'_>, tag: &Tag) -> Vec<SolutionId> {
    merge_ids(ctx.input(tag))
}

/// Objective vectors of `ids`; every member must be evaluated.
fn evaluated(store: &SolutionStore, ids: &[SolutionId]) -> Result<Vec<Vec<f64>>> {
    ids.iter()
        .map(|&id| {
            store
                .get(id)
                .objectives()
                .map(<[f64]>::to_vec)
                .ok_or_else(|| MoeaError::configuration(format!("solution {id} is not evaluated")))
        })
        .collect()
}

/// Selection preference: rank ascending, diversity descending, score
/// descending. Missing values sort last.
fn preference(store: &SolutionStore, a: SolutionId, b: SolutionId) -> Ordering {
    let fa = store.get(a).fitness;
    let fb = store.get(b).fitness;
    let rank = |r: Option<usize>| r.unwrap_or(usize::MAX);
    let high = |v: Option<f64>| v.unwrap_or(f64::NEG_INFINITY);
    rank(fa.rank)
        .cmp(&rank(fb.rank))
        .then_with(|| high(fb.diversity).total_cmp(&high(fa.diversity)))
        .then_with(|| high(fb.score).total_cmp(&high(fa.score)))
}

/// The configured relation, or Pareto dominance sized for `problem`.
fn bind_relation(
    relation: &mut Option<Box<dyn DominanceRelation>>,
    problem: &Problem,
) -> Result<()> {
    let dim = problem.objective_dim();
    match relation {
        Some(r) => MoeaError::check_len("dominance relation", dim, r.dimension()),
        None => {
            *relation = Some(Box::new(ParetoDominance::new(dim)));
            Ok(())
        }
    }
}

/// Fails unless a relation has been bound by `attach`.
fn bound(relation: &Option<Box<dyn DominanceRelation>>) -> Result<&dyn DominanceRelation> {
    relation
        .as_deref()
        .ok_or_else(|| MoeaError::configuration("node used before attach"))
}

/// Splits `ids` into fronts by rank (missing ranks last).
fn fronts_by_rank(store: &SolutionStore, ids: &[SolutionId]) -> Vec<Vec<SolutionId>> {
    let mut sorted = ids.to_vec();
    sorted.sort_by_key(|&id| (store.get(id).fitness.rank.unwrap_or(usize::MAX), id));
    let mut fronts: Vec<Vec<SolutionId>> = Vec::new();
    let mut last = None;
    for id in sorted {
        let r = store.get(id).fitness.rank;
        if last != Some(r) {
            fronts.push(Vec::new());
            last = Some(r);
        }
        if let Some(front) = fronts.last_mut() {
            front.push(id);
        }
    }
    fronts
}

#[cfg(test)]
pub(crate) mod testing {
    //! Shared fixtures for operator tests.

    use crate::functions::Zdt;
    use crate::log::LogManager;
    use crate::pipeline::{NodeContext, Operator, RunEnv, SetBoard};
    use crate::random::{create_rng, MoeaRng};
    use crate::representation::{Problem, SolutionId, SolutionSet, SolutionStore, Tag};

    /// Everything a node needs to run outside a pipeline.
    pub struct Harness {
        pub problem: Problem,
        pub store: SolutionStore,
        pub rng: MoeaRng,
        pub log: LogManager,
        pub evaluations: usize,
        pub board: SetBoard,
        pub generation: usize,
    }

    impl Harness {
        pub fn new(problem: Problem) -> Self {
            Self {
                problem,
                store: SolutionStore::new(),
                rng: create_rng(42),
                log: LogManager::new(),
                evaluations: 0,
                board: SetBoard::new(),
                generation: 0,
            }
        }

        pub fn zdt1(n: usize) -> Self {
            Self::new(Problem::builder().function(Zdt::zdt1(n).unwrap()).build().unwrap())
        }

        /// Adds an evaluated solution with the given objectives.
        pub fn solution(&mut self, objectives: &[f64]) -> SolutionId {
            let decision = self
                .problem
                .decision_from_values(&vec![0.5; self.problem.decision_dim()])
                .unwrap();
            let id = self.store.create(decision, self.generation);
            self.store
                .get_mut(id)
                .set_evaluation(objectives.to_vec(), Vec::new(), 0.0);
            id
        }

        /// Publishes one set under `tag`.
        pub fn put(&mut self, tag: Tag, ids: &[SolutionId]) {
            let set = SolutionSet::from_ids(tag.as_str().to_string(), ids.iter().copied())
                .with_tag(tag.clone());
            self.board.insert(tag, vec![set]);
        }

        /// Runs `node` once and files its outputs.
        pub fn run(&mut self, node: &mut dyn Operator) -> Vec<SolutionSet> {
            node.attach(&self.problem).unwrap();
            self.try_run(node).unwrap()
        }

        pub fn try_run(&mut self, node: &mut dyn Operator) -> crate::error::Result<Vec<SolutionSet>> {
            let mut env = RunEnv {
                problem: &self.problem,
                store: &mut self.store,
                rng: &mut self.rng,
                log: &mut self.log,
                evaluations: &mut self.evaluations,
                generation: self.generation,
                parallel: false,
            };
            let outputs = {
                let mut ctx = NodeContext::new(&mut env, &self.board);
                node.evaluate_node(&mut ctx)?;
                ctx.into_outputs()
            };
            self.board
                .accept(node.name(), &node.output_tags(), outputs.clone())?;
            Ok(outputs)
        }
    }
}
