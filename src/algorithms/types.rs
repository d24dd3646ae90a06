//! Algorithm variants, run states and results.

use crate::error::{MoeaError, Result};
use crate::representation::Solution;
use std::fmt;

/// The algorithm variants. They differ only in the nodes they wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmKind {
    /// Fast non-dominated sorting with crowding distance (Deb et al., 2002).
    Nsga2,
    /// Non-dominated sorting with reference-point niching (Deb & Jain, 2014).
    Nsga3,
    /// Steady-state hypervolume-contribution reduction (Beume et al., 2007).
    SmsEmoa,
    /// Generational GA with Fonseca–Fleming ranking and fitness sharing.
    Moga,
}

impl AlgorithmKind {
    /// Lower-case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            AlgorithmKind::Nsga2 => "nsga2",
            AlgorithmKind::Nsga3 => "nsga3",
            AlgorithmKind::SmsEmoa => "sms-emoa",
            AlgorithmKind::Moga => "moga",
        }
    }

    /// Parses an identifier as produced by [`as_str`](Self::as_str).
    pub fn parse(id: &str) -> Result<Self> {
        match id {
            "nsga2" => Ok(AlgorithmKind::Nsga2),
            "nsga3" => Ok(AlgorithmKind::Nsga3),
            "sms-emoa" => Ok(AlgorithmKind::SmsEmoa),
            "moga" => Ok(AlgorithmKind::Moga),
            other => Err(MoeaError::UnknownIdentifier {
                kind: "algorithm",
                id: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A generation or evaluation budget was exhausted.
    Completed,
    /// The cancellation flag was raised.
    Cancelled,
    /// Wiring or evaluation failed; the run cannot continue.
    Failure(MoeaError),
}

/// Lifecycle of an [`Algorithm`](super::Algorithm).
///
/// `Uninitialised → Initialised → Running → Terminated`. A configuration
/// error during initialisation or a failing evaluation jumps straight to
/// `Terminated(Outcome::Failure(..))`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlgorithmState {
    /// Created; nothing wired yet.
    Uninitialised,
    /// Pipeline wired and validated against the problem.
    Initialised,
    /// At least one generation has run.
    Running,
    /// No further generations will run.
    Terminated(Outcome),
}

impl AlgorithmState {
    /// Whether the run is over.
    pub fn is_terminated(&self) -> bool {
        matches!(self, AlgorithmState::Terminated(_))
    }
}

/// Aggregates of one generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationStats {
    /// Generation index, starting at 0.
    pub generation: usize,
    /// Cumulative evaluations.
    pub evaluations: usize,
    /// Size of the working population.
    pub population_size: usize,
    /// Number of distinct ranks in the population.
    pub front_count: usize,
    /// Archive size, if an archive is kept.
    pub archive_size: Option<usize>,
    /// Hypervolume against the configured reference, if any.
    pub hypervolume: Option<f64>,
}

/// Final state of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// How the run ended.
    pub outcome: Outcome,
    /// Generations completed.
    pub generations: usize,
    /// Function evaluations spent.
    pub evaluations: usize,
    /// Final working population.
    pub population: Vec<Solution>,
    /// Final archive, if one was kept.
    pub archive: Option<Vec<Solution>>,
    /// One entry per completed generation.
    pub history: Vec<GenerationStats>,
}

impl RunResult {
    /// Whether the run ended without failure.
    pub fn is_success(&self) -> bool {
        !matches!(self.outcome, Outcome::Failure(_))
    }

    /// The archive if kept, otherwise the population.
    pub fn front(&self) -> &[Solution] {
        self.archive.as_deref().unwrap_or(&self.population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trip() {
        for kind in [
            AlgorithmKind::Nsga2,
            AlgorithmKind::Nsga3,
            AlgorithmKind::SmsEmoa,
            AlgorithmKind::Moga,
        ] {
            assert_eq!(AlgorithmKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(matches!(
            AlgorithmKind::parse("spea2"),
            Err(MoeaError::UnknownIdentifier { kind: "algorithm", .. })
        ));
    }

    #[test]
    fn test_terminated_state() {
        assert!(!AlgorithmState::Running.is_terminated());
        assert!(AlgorithmState::Terminated(Outcome::Completed).is_terminated());
    }
}
