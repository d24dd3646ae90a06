//! The generational control loop.
//!
//! [`Algorithm`] wires the pipeline of its variant, then pushes the
//! population through it once per generation until a budget is exhausted,
//! the run is cancelled or an evaluation fails.

use super::config::AlgorithmConfig;
use super::types::{AlgorithmKind, AlgorithmState, GenerationStats, Outcome, RunResult};
use super::wiring::wire;
use crate::error::{MoeaError, Result};
use crate::indicators::hypervolume;
use crate::log::{GenerationEntry, LogManager};
use crate::operators::Sampling;
use crate::pipeline::{NodeDescriptor, Pipeline, RunEnv};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::random::{rng_from_seed, MoeaRng};
use crate::registry::Registry;
use crate::representation::{merge_ids, Problem, Solution, SolutionId, SolutionStore, Tag};
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A multi-objective evolutionary algorithm bound to one problem.
///
/// # Examples
///
/// ```
/// use u_moea::algorithms::{Algorithm, AlgorithmConfig, AlgorithmKind, Outcome};
/// use u_moea::functions::Zdt;
/// use u_moea::representation::Problem;
///
/// let problem = Problem::builder().function(Zdt::zdt1(6).unwrap()).build().unwrap();
/// let config = AlgorithmConfig::default()
///     .with_population_size(20)
///     .with_max_generations(10)
///     .with_seed(42)
///     .with_parallel(false);
///
/// let mut nsga2 = Algorithm::new(AlgorithmKind::Nsga2, problem, config);
/// let result = nsga2.run();
/// assert_eq!(result.outcome, Outcome::Completed);
/// assert_eq!(result.generations, 10);
/// assert_eq!(result.population.len(), 20);
/// ```
pub struct Algorithm {
    kind: AlgorithmKind,
    config: AlgorithmConfig,
    problem: Problem,
    registry: Registry,
    pipeline: Option<Pipeline>,
    population_tag: Tag,
    state: AlgorithmState,
    store: SolutionStore,
    rng: MoeaRng,
    log: LogManager,
    evaluations: usize,
    generation: usize,
    history: Vec<GenerationStats>,
}

impl Algorithm {
    /// Creates an algorithm using the built-in [`Registry`].
    pub fn new(kind: AlgorithmKind, problem: Problem, config: AlgorithmConfig) -> Self {
        Self::with_registry(kind, problem, config, Registry::default())
    }

    /// Creates an algorithm resolving identifiers through `registry`.
    pub fn with_registry(
        kind: AlgorithmKind,
        problem: Problem,
        config: AlgorithmConfig,
        registry: Registry,
    ) -> Self {
        Self {
            kind,
            rng: rng_from_seed(config.seed),
            config,
            problem,
            registry,
            pipeline: None,
            population_tag: Tag::EVALUATED,
            state: AlgorithmState::Uninitialised,
            store: SolutionStore::new(),
            log: LogManager::new(),
            evaluations: 0,
            generation: 0,
            history: Vec::new(),
        }
    }

    /// Wires and validates the pipeline.
    ///
    /// A configuration error terminates the algorithm with a failure
    /// outcome and is also returned.
    pub fn initialise(&mut self) -> Result<()> {
        if self.state != AlgorithmState::Uninitialised {
            return Err(MoeaError::configuration(format!(
                "cannot initialise an algorithm in state {:?}",
                self.state
            )));
        }
        match self.wire() {
            Ok(()) => {
                self.state = AlgorithmState::Initialised;
                info!(
                    algorithm = %self.kind,
                    population = self.config.population_size,
                    objectives = self.problem.objective_dim(),
                    variables = self.problem.decision_dim(),
                    "algorithm initialised"
                );
                Ok(())
            }
            Err(e) => {
                warn!(algorithm = %self.kind, error = %e, "initialisation failed");
                self.state = AlgorithmState::Terminated(Outcome::Failure(e.clone()));
                Err(e)
            }
        }
    }

    fn wire(&mut self) -> Result<()> {
        self.config.validate()?;
        if let Some(r) = &self.config.hv_reference {
            MoeaError::check_len("hypervolume reference", self.problem.objective_dim(), r.len())?;
        }
        let mut wiring = wire(self.kind, &self.config, &self.registry, &self.problem)?;
        wiring.pipeline.attach(&self.problem)?;

        self.rng = rng_from_seed(self.config.seed);
        self.log.set_log_evaluations(self.config.log_evaluations);
        self.log.set_log_generations(self.config.log_generations);
        self.population_tag = wiring.population;
        self.pipeline = Some(wiring.pipeline);
        Ok(())
    }

    fn budget_exhausted(&self) -> bool {
        self.generation >= self.config.max_generations
            || self
                .config
                .max_evaluations
                .is_some_and(|max| self.evaluations >= max)
    }

    /// Runs one generation.
    ///
    /// Initialises first when needed. Returns `Ok(false)` without doing
    /// anything once the algorithm has terminated; exhausting a budget
    /// terminates it with [`Outcome::Completed`]. A failing evaluation
    /// terminates it with [`Outcome::Failure`] and is returned.
    pub fn step(&mut self) -> Result<bool> {
        if self.state == AlgorithmState::Uninitialised {
            self.initialise()?;
        }
        if self.state.is_terminated() {
            return Ok(false);
        }
        if self.budget_exhausted() {
            self.state = AlgorithmState::Terminated(Outcome::Completed);
            return Ok(false);
        }
        self.state = AlgorithmState::Running;

        let result = self.run_generation();
        if let Err(e) = result {
            warn!(algorithm = %self.kind, generation = self.generation, error = %e, "run failed");
            self.state = AlgorithmState::Terminated(Outcome::Failure(e.clone()));
            return Err(e);
        }
        self.generation += 1;
        if self.budget_exhausted() {
            self.state = AlgorithmState::Terminated(Outcome::Completed);
        }
        Ok(true)
    }

    fn run_generation(&mut self) -> Result<()> {
        let pipeline = self
            .pipeline
            .as_mut()
            .ok_or_else(|| MoeaError::configuration("algorithm is not initialised"))?;
        let mut env = RunEnv {
            problem: &self.problem,
            store: &mut self.store,
            rng: &mut self.rng,
            log: &mut self.log,
            evaluations: &mut self.evaluations,
            generation: self.generation,
            parallel: self.config.parallel,
        };
        pipeline.run_generation(&mut env)?;

        let keep = pipeline.referenced_ids();
        self.store.retain(&keep);

        let stats = self.generation_stats()?;
        debug!(
            generation = stats.generation,
            evaluations = stats.evaluations,
            fronts = stats.front_count,
            hypervolume = ?stats.hypervolume,
            "generation complete"
        );
        if self.log.logs_generations() {
            let mut entry = GenerationEntry::new(stats.generation, stats.evaluations, stats.population_size);
            entry.front_count = stats.front_count;
            entry.archive_size = stats.archive_size;
            entry.hypervolume = stats.hypervolume;
            self.log.log_generation(entry);
        }
        self.history.push(stats);
        Ok(())
    }

    fn published(&self, tag: &Tag) -> Option<Vec<SolutionId>> {
        let sets = self.pipeline.as_ref()?.sets(tag)?;
        Some(merge_ids(sets))
    }

    fn generation_stats(&self) -> Result<GenerationStats> {
        let population = self.published(&self.population_tag).unwrap_or_default();
        let archive = if self.config.archive {
            self.published(&Tag::ARCHIVE)
        } else {
            None
        };

        let ranks: BTreeSet<usize> = population
            .iter()
            .filter_map(|&id| self.store.get(id).fitness.rank)
            .collect();

        let hypervolume = match &self.config.hv_reference {
            Some(reference) => {
                let front = archive.as_ref().unwrap_or(&population);
                let points: Vec<Vec<f64>> = front
                    .iter()
                    .filter_map(|&id| self.store.get(id).objectives())
                    .filter(|p| p.iter().zip(reference).all(|(v, r)| v <= r))
                    .map(<[f64]>::to_vec)
                    .collect();
                Some(hypervolume(&points, Some(reference))?)
            }
            None => None,
        };

        Ok(GenerationStats {
            generation: self.generation,
            evaluations: self.evaluations,
            population_size: population.len(),
            front_count: ranks.len(),
            archive_size: archive.map(|a| a.len()),
            hypervolume,
        })
    }

    /// Runs until a budget is exhausted.
    pub fn run(&mut self) -> RunResult {
        self.run_with_cancel(None)
    }

    /// Runs with an optional cancellation flag.
    ///
    /// The flag is checked once per generation; when it is set the run
    /// stops with [`Outcome::Cancelled`] and keeps its current population.
    pub fn run_with_cancel(&mut self, cancel: Option<Arc<AtomicBool>>) -> RunResult {
        info!(algorithm = %self.kind, seed = ?self.config.seed, "run started");
        loop {
            if let Some(ref flag) = cancel {
                if flag.load(Ordering::Relaxed) && !self.state.is_terminated() {
                    self.state = AlgorithmState::Terminated(Outcome::Cancelled);
                }
            }
            match self.step() {
                Ok(true) => {}
                Ok(false) | Err(_) => break,
            }
        }
        let result = self.result();
        info!(
            algorithm = %self.kind,
            generations = result.generations,
            evaluations = result.evaluations,
            outcome = ?result.outcome,
            "run finished"
        );
        result
    }

    /// Snapshot of the current population, archive and history.
    pub fn result(&self) -> RunResult {
        let outcome = match &self.state {
            AlgorithmState::Terminated(outcome) => outcome.clone(),
            _ => Outcome::Completed,
        };
        RunResult {
            outcome,
            generations: self.generation,
            evaluations: self.evaluations,
            population: self.population().into_iter().cloned().collect(),
            archive: self.archive().map(|a| a.into_iter().cloned().collect()),
            history: self.history.clone(),
        }
    }

    /// The working population after the last completed generation.
    pub fn population(&self) -> Vec<&Solution> {
        self.published(&self.population_tag)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|id| self.store.try_get(id))
            .collect()
    }

    /// The archive, when one is kept and at least one generation ran.
    pub fn archive(&self) -> Option<Vec<&Solution>> {
        if !self.config.archive {
            return None;
        }
        let ids = self.published(&Tag::ARCHIVE)?;
        Some(ids.into_iter().filter_map(|id| self.store.try_get(id)).collect())
    }

    /// The variant.
    pub fn kind(&self) -> AlgorithmKind {
        self.kind
    }

    /// The problem being optimised.
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// The configuration.
    pub fn config(&self) -> &AlgorithmConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> &AlgorithmState {
        &self.state
    }

    /// Collected log records.
    pub fn log(&self) -> &LogManager {
        &self.log
    }

    /// Mutable access to the log, e.g. to subscribe or drain.
    pub fn log_mut(&mut self) -> &mut LogManager {
        &mut self.log
    }

    /// One entry per completed generation.
    pub fn history(&self) -> &[GenerationStats] {
        &self.history
    }

    /// Node descriptors of the wired pipeline; empty before initialisation.
    pub fn describe(&self) -> Vec<NodeDescriptor> {
        self.pipeline.as_ref().map(Pipeline::describe).unwrap_or_default()
    }

    /// The wired pipeline, for adjusting node properties between
    /// generations.
    pub fn pipeline_mut(&mut self) -> Option<&mut Pipeline> {
        self.pipeline.as_mut()
    }

    /// Function evaluations spent so far.
    pub fn used_budget(&self) -> usize {
        self.evaluations
    }

    /// Evaluations left, when an evaluation budget is set.
    pub fn remaining_budget(&self) -> Option<usize> {
        self.config
            .max_evaluations
            .map(|max| max.saturating_sub(self.evaluations))
    }

    /// Number of completed generations.
    pub fn current_generation(&self) -> usize {
        self.generation
    }
}

const PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("kind", PropertyKind::Text, "Algorithm variant (read-only)"),
    PropertyDescriptor::new("population_size", PropertyKind::Int, "Solutions per generation"),
    PropertyDescriptor::new("max_generations", PropertyKind::Int, "Generation budget"),
    PropertyDescriptor::new("max_evaluations", PropertyKind::Int, "Evaluation budget; 0 is unlimited"),
    PropertyDescriptor::new("crossover_probability", PropertyKind::Real, "Pair crossover probability"),
    PropertyDescriptor::new("crossover_eta", PropertyKind::Real, "SBX distribution index"),
    PropertyDescriptor::new("mutation_eta", PropertyKind::Real, "Mutation distribution index"),
    PropertyDescriptor::new("mutation_probability", PropertyKind::Real, "Per-variable mutation probability; 0 means 1/n"),
    PropertyDescriptor::new("tournament_size", PropertyKind::Int, "Contestants per tournament"),
    PropertyDescriptor::new("archive", PropertyKind::Bool, "Keep a non-dominated archive"),
    PropertyDescriptor::new("archive_capacity", PropertyKind::Int, "Archive size limit; 0 is unbounded"),
    PropertyDescriptor::new("hv_reference", PropertyKind::RealVec, "Hypervolume reference for generation records"),
    PropertyDescriptor::new("dominance", PropertyKind::Text, "Dominance relation identifier"),
    PropertyDescriptor::new("constraint_handling", PropertyKind::Bool, "Feasibility-first ranking"),
    PropertyDescriptor::new("sharing_alpha", PropertyKind::Real, "MOGA sharing exponent"),
    PropertyDescriptor::new("sms_reference_offset", PropertyKind::Real, "SMS-EMOA reference offset"),
    PropertyDescriptor::new("sampling", PropertyKind::Text, "`uniform` or `lhs`"),
    PropertyDescriptor::new("parallel", PropertyKind::Bool, "Parallel evaluation"),
    PropertyDescriptor::new("log_evaluations", PropertyKind::Bool, "Collect one record per function call"),
    PropertyDescriptor::new("log_generations", PropertyKind::Bool, "Collect one record per generation"),
];

fn nonzero(n: usize) -> Option<usize> {
    (n > 0).then_some(n)
}

impl Configurable for Algorithm {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        let c = &self.config;
        Ok(match key {
            "kind" => self.kind.as_str().into(),
            "population_size" => c.population_size.into(),
            "max_generations" => c.max_generations.into(),
            "max_evaluations" => c.max_evaluations.unwrap_or(0).into(),
            "crossover_probability" => c.crossover_probability.into(),
            "crossover_eta" => c.crossover_eta.into(),
            "mutation_eta" => c.mutation_eta.into(),
            "mutation_probability" => c.mutation_probability.unwrap_or(0.0).into(),
            "tournament_size" => c.tournament_size.into(),
            "archive" => c.archive.into(),
            "archive_capacity" => c.archive_capacity.unwrap_or(0).into(),
            "hv_reference" => c.hv_reference.clone().unwrap_or_default().into(),
            "dominance" => c.dominance.as_str().into(),
            "constraint_handling" => c.constraint_handling.into(),
            "sharing_alpha" => c.sharing_alpha.into(),
            "sms_reference_offset" => c.sms_reference_offset.into(),
            "sampling" => c.sampling.as_str().into(),
            "parallel" => c.parallel.into(),
            "log_evaluations" => c.log_evaluations.into(),
            "log_generations" => c.log_generations.into(),
            _ => return Err(unknown_property(key)),
        })
    }

    /// Properties can only change before [`Algorithm::initialise`]; the
    /// new value is checked by the configuration's validation.
    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        if self.state != AlgorithmState::Uninitialised {
            return Err(MoeaError::configuration(format!(
                "property `{key}` cannot change once the algorithm is initialised"
            )));
        }
        let mut c = self.config.clone();
        match key {
            "kind" => {
                return Err(MoeaError::configuration("property `kind` is read-only"));
            }
            "population_size" => c.population_size = value.into_usize(key)?,
            "max_generations" => c.max_generations = value.into_usize(key)?,
            "max_evaluations" => c.max_evaluations = nonzero(value.into_usize(key)?),
            "crossover_probability" => c.crossover_probability = value.into_real(key)?,
            "crossover_eta" => c.crossover_eta = value.into_real(key)?,
            "mutation_eta" => c.mutation_eta = value.into_real(key)?,
            "mutation_probability" => {
                let p = value.into_real(key)?;
                c.mutation_probability = (p != 0.0).then_some(p);
            }
            "tournament_size" => c.tournament_size = value.into_usize(key)?,
            "archive" => c.archive = value.into_bool(key)?,
            "archive_capacity" => c.archive_capacity = nonzero(value.into_usize(key)?),
            "hv_reference" => {
                let r = value.into_reals(key)?;
                c.hv_reference = (!r.is_empty()).then_some(r);
            }
            "dominance" => c.dominance = value.into_text(key)?,
            "constraint_handling" => c.constraint_handling = value.into_bool(key)?,
            "sharing_alpha" => c.sharing_alpha = value.into_real(key)?,
            "sms_reference_offset" => c.sms_reference_offset = value.into_real(key)?,
            "sampling" => c.sampling = Sampling::parse(&value.into_text(key)?)?,
            "parallel" => c.parallel = value.into_bool(key)?,
            "log_evaluations" => c.log_evaluations = value.into_bool(key)?,
            "log_generations" => c.log_generations = value.into_bool(key)?,
            _ => return Err(unknown_property(key)),
        }
        c.validate()?;
        self.config = c;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
