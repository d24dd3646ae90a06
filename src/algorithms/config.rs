//! Algorithm configuration.
//!
//! [`AlgorithmConfig`] holds every parameter the four algorithm variants
//! read when wiring their pipelines.

use crate::dominance::RelationParameters;
use crate::error::{MoeaError, Result};
use crate::operators::Sampling;

/// Configuration shared by all algorithm variants.
///
/// Parameters a variant does not use are ignored (for example
/// `sharing_alpha` outside MOGA).
///
/// # Defaults
///
/// ```
/// use u_moea::algorithms::AlgorithmConfig;
///
/// let config = AlgorithmConfig::default();
/// assert_eq!(config.population_size, 100);
/// assert_eq!(config.crossover_eta, 15.0);
/// assert_eq!(config.mutation_eta, 20.0);
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_moea::algorithms::AlgorithmConfig;
///
/// let config = AlgorithmConfig::default()
///     .with_population_size(40)
///     .with_max_evaluations(2_000)
///     .with_archive(true)
///     .with_hv_reference(vec![11.0, 11.0])
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct AlgorithmConfig {
    /// Number of solutions kept per generation.
    pub population_size: usize,

    /// Generation budget.
    pub max_generations: usize,

    /// Evaluation budget, checked before each generation.
    ///
    /// `None` leaves only the generation budget.
    pub max_evaluations: Option<usize>,

    /// Probability that a parent pair is recombined (0.0–1.0).
    pub crossover_probability: f64,

    /// SBX distribution index η_c.
    ///
    /// Larger values keep children closer to their parents.
    pub crossover_eta: f64,

    /// Polynomial mutation distribution index η_m.
    pub mutation_eta: f64,

    /// Per-variable mutation probability; `None` means `1/n`.
    pub mutation_probability: Option<f64>,

    /// Contestants per mating tournament.
    pub tournament_size: usize,

    /// Whether a non-dominated archive is kept.
    pub archive: bool,

    /// Archive size limit; `None` is unbounded.
    pub archive_capacity: Option<usize>,

    /// Reference point for per-generation hypervolume records.
    pub hv_reference: Option<Vec<f64>>,

    /// Dominance relation identifier, resolved through the
    /// [`Registry`](crate::registry::Registry).
    pub dominance: String,

    /// Parameters handed to the relation after creation.
    pub dominance_parameters: RelationParameters,

    /// Whether feasible solutions are ranked ahead of infeasible ones.
    pub constraint_handling: bool,

    /// Sharing-function exponent (MOGA).
    pub sharing_alpha: f64,

    /// Offset added to the worst front's nadir for SMS-EMOA reduction.
    pub sms_reference_offset: f64,

    /// How the initial population is sampled.
    pub sampling: Sampling,

    /// Decision vectors placed in the initial population before random ones.
    pub initial_population: Vec<Vec<f64>>,

    /// Random seed for reproducibility.
    ///
    /// `None` uses a random seed.
    pub seed: Option<u64>,

    /// Whether function evaluations run on the rayon pool.
    pub parallel: bool,

    /// Whether one record per function call is collected.
    pub log_evaluations: bool,

    /// Whether one record per generation is collected.
    pub log_generations: bool,
}

impl Default for AlgorithmConfig {
    fn default() -> Self {
        Self {
            population_size: 100,
            max_generations: 250,
            max_evaluations: None,
            crossover_probability: 0.9,
            crossover_eta: 15.0,
            mutation_eta: 20.0,
            mutation_probability: None,
            tournament_size: 2,
            archive: false,
            archive_capacity: None,
            hv_reference: None,
            dominance: "pareto".into(),
            dominance_parameters: RelationParameters::None,
            constraint_handling: true,
            sharing_alpha: 1.0,
            sms_reference_offset: 1.0,
            sampling: Sampling::Uniform,
            initial_population: Vec::new(),
            seed: None,
            parallel: true,
            log_evaluations: false,
            log_generations: true,
        }
    }
}

impl AlgorithmConfig {
    /// Sets the population size.
    pub fn with_population_size(mut self, n: usize) -> Self {
        self.population_size = n;
        self
    }

    /// Sets the generation budget.
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    /// Sets the evaluation budget.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = Some(n);
        self
    }

    /// Sets the pair crossover probability.
    pub fn with_crossover_probability(mut self, p: f64) -> Self {
        self.crossover_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Sets the SBX distribution index.
    pub fn with_crossover_eta(mut self, eta: f64) -> Self {
        self.crossover_eta = eta.max(0.0);
        self
    }

    /// Sets the mutation distribution index.
    pub fn with_mutation_eta(mut self, eta: f64) -> Self {
        self.mutation_eta = eta.max(0.0);
        self
    }

    /// Sets the per-variable mutation probability.
    pub fn with_mutation_probability(mut self, p: f64) -> Self {
        self.mutation_probability = Some(p.clamp(0.0, 1.0));
        self
    }

    /// Sets the tournament size.
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k;
        self
    }

    /// Enables or disables the non-dominated archive.
    pub fn with_archive(mut self, enabled: bool) -> Self {
        self.archive = enabled;
        self
    }

    /// Limits the archive size (and enables the archive).
    pub fn with_archive_capacity(mut self, capacity: usize) -> Self {
        self.archive = true;
        self.archive_capacity = Some(capacity);
        self
    }

    /// Sets the hypervolume reference point for generation records.
    pub fn with_hv_reference(mut self, reference: Vec<f64>) -> Self {
        self.hv_reference = Some(reference);
        self
    }

    /// Selects the dominance relation by registry identifier.
    pub fn with_dominance(mut self, id: impl Into<String>, parameters: RelationParameters) -> Self {
        self.dominance = id.into();
        self.dominance_parameters = parameters;
        self
    }

    /// Enables or disables feasibility-first ranking.
    pub fn with_constraint_handling(mut self, enabled: bool) -> Self {
        self.constraint_handling = enabled;
        self
    }

    /// Sets the MOGA sharing exponent.
    pub fn with_sharing_alpha(mut self, alpha: f64) -> Self {
        self.sharing_alpha = alpha;
        self
    }

    /// Sets the SMS-EMOA reference offset.
    pub fn with_sms_reference_offset(mut self, offset: f64) -> Self {
        self.sms_reference_offset = offset;
        self
    }

    /// Sets the initial sampling scheme.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }

    /// Seeds the initial population with user decision vectors.
    pub fn with_initial_population(mut self, vectors: Vec<Vec<f64>>) -> Self {
        self.initial_population = vectors;
        self
    }

    /// Sets the random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables or disables parallel evaluation.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Toggles per-call evaluation records.
    pub fn with_log_evaluations(mut self, enabled: bool) -> Self {
        self.log_evaluations = enabled;
        self
    }

    /// Toggles per-generation records.
    pub fn with_log_generations(mut self, enabled: bool) -> Self {
        self.log_generations = enabled;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.population_size < 2 {
            return Err(MoeaError::configuration("population_size must be at least 2"));
        }
        if self.max_generations == 0 {
            return Err(MoeaError::configuration("max_generations must be at least 1"));
        }
        if self.max_evaluations == Some(0) {
            return Err(MoeaError::configuration("max_evaluations must be positive or None"));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(MoeaError::configuration("crossover_probability must lie in [0, 1]"));
        }
        if let Some(p) = self.mutation_probability {
            if !(0.0..=1.0).contains(&p) {
                return Err(MoeaError::configuration("mutation_probability must lie in [0, 1]"));
            }
        }
        if !(self.crossover_eta >= 0.0 && self.mutation_eta >= 0.0) {
            return Err(MoeaError::configuration("distribution indices must be non-negative"));
        }
        if self.tournament_size == 0 {
            return Err(MoeaError::configuration("tournament_size must be at least 1"));
        }
        if self.archive_capacity == Some(0) {
            return Err(MoeaError::configuration("archive_capacity must be positive or None"));
        }
        if let Some(r) = &self.hv_reference {
            if r.is_empty() || r.iter().any(|v| !v.is_finite()) {
                return Err(MoeaError::configuration(
                    "hv_reference must be a non-empty vector of finite values",
                ));
            }
        }
        if self.dominance.is_empty() {
            return Err(MoeaError::configuration("dominance identifier must not be empty"));
        }
        if !(self.sharing_alpha > 0.0 && self.sharing_alpha.is_finite()) {
            return Err(MoeaError::configuration("sharing_alpha must be positive"));
        }
        if !(self.sms_reference_offset > 0.0 && self.sms_reference_offset.is_finite()) {
            return Err(MoeaError::configuration("sms_reference_offset must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlgorithmConfig::default();
        assert_eq!(config.population_size, 100);
        assert_eq!(config.max_generations, 250);
        assert_eq!(config.crossover_probability, 0.9);
        assert_eq!(config.dominance, "pareto");
        assert!(config.mutation_probability.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_clamps_rates() {
        let config = AlgorithmConfig::default()
            .with_crossover_probability(1.5)
            .with_mutation_probability(-0.2);
        assert_eq!(config.crossover_probability, 1.0);
        assert_eq!(config.mutation_probability, Some(0.0));
    }

    #[test]
    fn test_archive_capacity_enables_archive() {
        let config = AlgorithmConfig::default().with_archive_capacity(50);
        assert!(config.archive);
        assert_eq!(config.archive_capacity, Some(50));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad = [
            AlgorithmConfig::default().with_population_size(1),
            AlgorithmConfig::default().with_max_generations(0),
            AlgorithmConfig::default().with_max_evaluations(0),
            AlgorithmConfig::default().with_tournament_size(0),
            AlgorithmConfig::default().with_archive_capacity(0),
            AlgorithmConfig::default().with_hv_reference(vec![]),
            AlgorithmConfig::default().with_sharing_alpha(0.0),
            AlgorithmConfig::default().with_sms_reference_offset(-1.0),
        ];
        for config in &bad {
            assert!(
                matches!(config.validate(), Err(MoeaError::Configuration(_))),
                "expected rejection of {config:?}"
            );
        }
    }
}
