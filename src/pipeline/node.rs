//! The operator capability and its execution context.

use super::board::SetBoard;
use crate::error::Result;
use crate::log::LogManager;
use crate::property::Configurable;
use crate::random::MoeaRng;
use crate::representation::{Problem, SolutionSet, SolutionStore, Tag};
use super::graph::Pipeline;
use std::fmt;

/// Role of a node in the pipeline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    /// Creates candidate solutions.
    Initialisation,
    /// Fills objective vectors.
    Evaluator,
    /// Attaches ranks, diversity or scalar fitness.
    Fitness,
    /// Selects a subset.
    Filtration,
    /// Maintains a set across generations.
    Archive,
    /// Produces new candidates from existing ones (crossover, mutation).
    Direction,
    /// Wraps a sub-pipeline.
    Composite,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Mutable run state shared by every node of one generation.
pub struct RunEnv<'a> {
    /// The sealed problem.
    pub problem: &'a Problem,
    /// Owner of all solutions.
    pub store: &'a mut SolutionStore,
    /// The run's random stream.
    pub rng: &'a mut MoeaRng,
    /// Record collector.
    pub log: &'a mut LogManager,
    /// Cumulative evaluation count.
    pub evaluations: &'a mut usize,
    /// Current generation index.
    pub generation: usize,
    /// Whether evaluators may run in parallel.
    pub parallel: bool,
}

/// What a node sees while it is evaluated.
///
/// Inputs are read from `board`, which holds the sets published by the
/// other nodes. Outputs are handed back with [`publish`](Self::publish).
pub struct NodeContext<'a> {
    /// The sealed problem.
    pub problem: &'a Problem,
    /// Owner of all solutions.
    pub store: &'a mut SolutionStore,
    /// Published sets of the surrounding pipeline.
    pub board: &'a SetBoard,
    /// The run's random stream.
    pub rng: &'a mut MoeaRng,
    /// Record collector.
    pub log: &'a mut LogManager,
    /// Cumulative evaluation count.
    pub evaluations: &'a mut usize,
    /// Current generation index.
    pub generation: usize,
    /// Whether evaluators may run in parallel.
    pub parallel: bool,
    outputs: Vec<SolutionSet>,
}

impl<'a> NodeContext<'a> {
    /// Creates a context over `env` reading from `board`.
    pub fn new(env: &'a mut RunEnv<'_>, board: &'a SetBoard) -> Self {
        Self {
            problem: env.problem,
            store: &mut *env.store,
            board,
            rng: &mut *env.rng,
            log: &mut *env.log,
            evaluations: &mut *env.evaluations,
            generation: env.generation,
            parallel: env.parallel,
            outputs: Vec::new(),
        }
    }

    /// Sets tagged `tag`.
    ///
    /// # Panics
    /// Panics if the producer of `tag` has not run yet.
    pub fn input(&self, tag: &Tag) -> &'a [SolutionSet] {
        self.board
            .get(tag)
            .unwrap_or_else(|| panic!("input `{tag}` read before its producer ran"))
    }

    /// Sets tagged `tag`, or `None` before its producer first runs.
    pub fn feedback(&self, tag: &Tag) -> Option<&'a [SolutionSet]> {
        self.board.get(tag)
    }

    /// Publishes an output set.
    pub fn publish(&mut self, set: SolutionSet) {
        self.outputs.push(set);
    }

    /// Reborrows the run state, for nodes that drive a sub-pipeline.
    pub fn env(&mut self) -> RunEnv<'_> {
        RunEnv {
            problem: self.problem,
            store: &mut *self.store,
            rng: &mut *self.rng,
            log: &mut *self.log,
            evaluations: &mut *self.evaluations,
            generation: self.generation,
            parallel: self.parallel,
        }
    }

    /// Takes the published outputs.
    pub fn into_outputs(self) -> Vec<SolutionSet> {
        self.outputs
    }
}

/// A unit of the pipeline graph.
///
/// A node declares its input and output tags at construction; those never
/// change afterwards. [`evaluate_node`](Self::evaluate_node) reads the input
/// sets from the context, transforms them and publishes output sets carrying
/// only declared tags.
///
/// Inputs listed in [`feedback_tags`](Self::feedback_tags) are read from the
/// previous generation: their producer may run later in the chain, and
/// they may be absent during the first generation.
pub trait Operator: Configurable + Send {
    /// Display name, unique within a pipeline.
    fn name(&self) -> &str;

    /// Role of the node.
    fn kind(&self) -> NodeKind;

    /// Tags this node reads.
    fn input_tags(&self) -> Vec<Tag>;

    /// Tags this node publishes.
    fn output_tags(&self) -> Vec<Tag>;

    /// Inputs carried over from the previous generation.
    fn feedback_tags(&self) -> Vec<Tag> {
        Vec::new()
    }

    /// Binds the node to a problem before the first generation.
    fn attach(&mut self, problem: &Problem) -> Result<()> {
        let _ = problem;
        Ok(())
    }

    /// Runs the node once.
    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()>;

    /// The wrapped pipeline of a composite node.
    fn sub_pipeline(&self) -> Option<&Pipeline> {
        None
    }

    /// Mutable access to the wrapped pipeline of a composite node.
    fn sub_pipeline_mut(&mut self) -> Option<&mut Pipeline> {
        None
    }
}
