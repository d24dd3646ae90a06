//! Structured evaluation and generation records.
//!
//! The engine emits two record kinds:
//!
//! - [`EvaluationEntry`]: one per function call, with inputs and outputs
//! - [`GenerationEntry`]: one per completed generation, with aggregates
//!
//! [`LogManager`] collects them in memory. Consumers either pull
//! ([`records`](LogManager::records), [`drain`](LogManager::drain)) or
//! register a callback with [`subscribe`](LogManager::subscribe). Nothing is
//! written to disk; persistence is left to the consumer.
//!
//! Diagnostic messages go through `tracing` and are unrelated to this stream.

mod types;

pub use types::{EvaluationEntry, GenerationEntry, LogRecord};

use std::fmt;

/// Callback receiving every accepted record.
pub type Subscriber = Box<dyn FnMut(&LogRecord) + Send>;

/// In-memory collector of [`LogRecord`]s.
///
/// # Examples
///
/// ```
/// use u_moea::log::{GenerationEntry, LogManager, LogRecord};
/// use std::sync::{Arc, Mutex};
///
/// let seen = Arc::new(Mutex::new(0usize));
/// let counter = Arc::clone(&seen);
///
/// let mut log = LogManager::new();
/// log.subscribe(Box::new(move |_record: &LogRecord| {
///     *counter.lock().unwrap() += 1;
/// }));
/// log.log_generation(GenerationEntry::new(0, 10, 10));
///
/// assert_eq!(*seen.lock().unwrap(), 1);
/// assert_eq!(log.drain().len(), 1);
/// assert!(log.records().is_empty());
/// ```
pub struct LogManager {
    log_evaluations: bool,
    log_generations: bool,
    retain: bool,
    records: Vec<LogRecord>,
    subscribers: Vec<Subscriber>,
}

impl Default for LogManager {
    fn default() -> Self {
        Self {
            log_evaluations: true,
            log_generations: true,
            retain: true,
            records: Vec::new(),
            subscribers: Vec::new(),
        }
    }
}

impl LogManager {
    /// Creates a collector with both record kinds enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables evaluation records.
    pub fn set_log_evaluations(&mut self, enabled: bool) {
        self.log_evaluations = enabled;
    }

    /// Enables or disables generation records.
    pub fn set_log_generations(&mut self, enabled: bool) {
        self.log_generations = enabled;
    }

    /// Whether evaluation records are collected.
    pub fn logs_evaluations(&self) -> bool {
        self.log_evaluations
    }

    /// Whether generation records are collected.
    pub fn logs_generations(&self) -> bool {
        self.log_generations
    }

    /// When `false`, records are only forwarded to subscribers.
    pub fn set_retain(&mut self, retain: bool) {
        self.retain = retain;
    }

    /// Registers a callback invoked for every accepted record.
    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    /// Records one function evaluation.
    pub fn log_evaluation(&mut self, entry: EvaluationEntry) {
        if self.log_evaluations {
            self.push(LogRecord::Evaluation(entry));
        }
    }

    /// Records one generation.
    pub fn log_generation(&mut self, entry: GenerationEntry) {
        if self.log_generations {
            self.push(LogRecord::Generation(entry));
        }
    }

    fn push(&mut self, record: LogRecord) {
        for s in &mut self.subscribers {
            s(&record);
        }
        if self.retain {
            self.records.push(record);
        }
    }

    /// Collected records, oldest first.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Removes and returns the collected records.
    pub fn drain(&mut self) -> Vec<LogRecord> {
        std::mem::take(&mut self.records)
    }

    /// Collected evaluation records.
    pub fn evaluations(&self) -> impl Iterator<Item = &EvaluationEntry> {
        self.records.iter().filter_map(|r| match r {
            LogRecord::Evaluation(e) => Some(e),
            _ => None,
        })
    }

    /// Collected generation records.
    pub fn generations(&self) -> impl Iterator<Item = &GenerationEntry> {
        self.records.iter().filter_map(|r| match r {
            LogRecord::Generation(g) => Some(g),
            _ => None,
        })
    }
}

impl fmt::Debug for LogManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogManager")
            .field("log_evaluations", &self.log_evaluations)
            .field("log_generations", &self.log_generations)
            .field("records", &self.records.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::representation::Element;

    fn entry() -> EvaluationEntry {
        EvaluationEntry::new("f", 0, vec![Element::real(1.0)], vec![Element::real(2.0)])
    }

    #[test]
    fn test_toggles() {
        let mut log = LogManager::new();
        log.set_log_evaluations(false);
        log.log_evaluation(entry());
        log.log_generation(GenerationEntry::new(0, 1, 1));
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.evaluations().count(), 0);
        assert_eq!(log.generations().count(), 1);
    }

    #[test]
    fn test_forward_only() {
        let mut log = LogManager::new();
        log.set_retain(false);
        let (tx, rx) = std::sync::mpsc::channel();
        log.subscribe(Box::new(move |r: &LogRecord| {
            tx.send(r.clone()).unwrap();
        }));
        log.log_evaluation(entry());
        assert!(log.records().is_empty());
        let got = rx.try_recv().unwrap();
        assert!(matches!(got, LogRecord::Evaluation(e) if e.function == "f"));
    }
}
