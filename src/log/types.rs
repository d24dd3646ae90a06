//! Record types.

use crate::property::PropertyValue;
use crate::representation::Element;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// One function evaluation.
///
/// Created once, never modified afterwards.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EvaluationEntry {
    /// Wall-clock time of creation.
    pub timestamp: DateTime<Utc>,
    /// Name of the evaluated function.
    pub function: String,
    /// Generation during which the call happened.
    pub generation: usize,
    /// Inputs passed to the function.
    pub inputs: Vec<Element>,
    /// Outputs returned by the function.
    pub outputs: Vec<Element>,
    /// Additional named fields.
    pub extra: BTreeMap<String, PropertyValue>,
}

impl EvaluationEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(
        function: impl Into<String>,
        generation: usize,
        inputs: Vec<Element>,
        outputs: Vec<Element>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            function: function.into(),
            generation,
            inputs,
            outputs,
            extra: BTreeMap::new(),
        }
    }

    /// Adds an extra field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Aggregates of one completed generation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GenerationEntry {
    /// Wall-clock time of creation.
    pub timestamp: DateTime<Utc>,
    /// Generation index, starting at 0.
    pub generation: usize,
    /// Cumulative evaluations after this generation.
    pub evaluations: usize,
    /// Size of the working population.
    pub population_size: usize,
    /// Number of distinct dominance ranks in the population.
    pub front_count: usize,
    /// Archive size, if an archive is kept.
    pub archive_size: Option<usize>,
    /// Hypervolume against the configured reference, if any.
    pub hypervolume: Option<f64>,
}

impl GenerationEntry {
    /// Creates an entry stamped with the current time.
    pub fn new(generation: usize, evaluations: usize, population_size: usize) -> Self {
        Self {
            timestamp: Utc::now(),
            generation,
            evaluations,
            population_size,
            front_count: 0,
            archive_size: None,
            hypervolume: None,
        }
    }
}

/// Any record emitted by the engine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LogRecord {
    /// A function evaluation.
    Evaluation(EvaluationEntry),
    /// A completed generation.
    Generation(GenerationEntry),
}

impl LogRecord {
    /// Creation time of the record.
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            LogRecord::Evaluation(e) => e.timestamp,
            LogRecord::Generation(g) => g.timestamp,
        }
    }
}
