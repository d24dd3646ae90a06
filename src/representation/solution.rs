//! Candidate solutions and the store that owns them.

use super::element::Element;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Stable identity of a [`Solution`].
///
/// Ids are handed out in creation order and never reused within a store,
/// so ascending id order is creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SolutionId(u64);

impl SolutionId {
    /// Raw numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SolutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Auxiliary scalars attached by fitness and archive operators.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Fitness {
    /// Dominance rank (0 = best front).
    pub rank: Option<usize>,
    /// Diversity measure, higher is more isolated.
    pub diversity: Option<f64>,
    /// Scalar fitness, higher is better.
    pub score: Option<f64>,
}

/// One candidate: a decision vector plus, once evaluated, its objectives.
#[derive(Debug, Clone)]
pub struct Solution {
    id: SolutionId,
    decision: Vec<Element>,
    objectives: Option<Vec<f64>>,
    constraints: Vec<f64>,
    violation: f64,
    /// Fitness values attached by ranking and diversity operators.
    pub fitness: Fitness,
    generation: usize,
}

impl Solution {
    /// Identity.
    pub fn id(&self) -> SolutionId {
        self.id
    }

    /// Decision vector.
    pub fn decision(&self) -> &[Element] {
        &self.decision
    }

    /// Raw decision values.
    pub fn decision_values(&self) -> Vec<f64> {
        self.decision.iter().map(Element::value).collect()
    }

    /// Objective vector in minimization space, `None` while pending.
    pub fn objectives(&self) -> Option<&[f64]> {
        self.objectives.as_deref()
    }

    /// Raw constraint values.
    pub fn constraints(&self) -> &[f64] {
        &self.constraints
    }

    /// Total constraint violation (0 when feasible).
    pub fn violation(&self) -> f64 {
        self.violation
    }

    /// Whether all constraints hold.
    pub fn is_feasible(&self) -> bool {
        self.violation <= 0.0
    }

    /// Whether the objective vector has been filled.
    pub fn is_evaluated(&self) -> bool {
        self.objectives.is_some()
    }

    /// Generation in which the solution was created.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Fills the objective and constraint vectors.
    pub fn set_evaluation(&mut self, objectives: Vec<f64>, constraints: Vec<f64>, violation: f64) {
        self.objectives = Some(objectives);
        self.constraints = constraints;
        self.violation = violation;
    }
}

/// Owner of every live [`Solution`] of a run.
///
/// Operators refer to solutions by [`SolutionId`]; the store hands out ids
/// and drops solutions no set refers to any more (see [`retain`](Self::retain)).
#[derive(Debug, Default, Clone)]
pub struct SolutionStore {
    next_id: u64,
    solutions: BTreeMap<SolutionId, Solution>,
}

impl SolutionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a pending solution and returns its id.
    pub fn create(&mut self, decision: Vec<Element>, generation: usize) -> SolutionId {
        let id = SolutionId(self.next_id);
        self.next_id += 1;
        self.solutions.insert(
            id,
            Solution {
                id,
                decision,
                objectives: None,
                constraints: Vec::new(),
                violation: 0.0,
                fitness: Fitness::default(),
                generation,
            },
        );
        id
    }

    /// Copies a solution, evaluation and fitness included, under a new id.
    ///
    /// # Panics
    /// Panics if `id` is not in the store.
    pub fn duplicate(&mut self, id: SolutionId) -> SolutionId {
        let mut copy = self.get(id).clone();
        let new_id = SolutionId(self.next_id);
        self.next_id += 1;
        copy.id = new_id;
        self.solutions.insert(new_id, copy);
        new_id
    }

    /// Looks up a solution.
    ///
    /// # Panics
    /// Panics if `id` is not in the store: every id reachable through a
    /// published set must be live.
    pub fn get(&self, id: SolutionId) -> &Solution {
        self.solutions
            .get(&id)
            .unwrap_or_else(|| panic!("solution {id} is not in the store"))
    }

    /// Mutable lookup.
    ///
    /// # Panics
    /// Panics if `id` is not in the store.
    pub fn get_mut(&mut self, id: SolutionId) -> &mut Solution {
        self.solutions
            .get_mut(&id)
            .unwrap_or_else(|| panic!("solution {id} is not in the store"))
    }

    /// Non-panicking lookup.
    pub fn try_get(&self, id: SolutionId) -> Option<&Solution> {
        self.solutions.get(&id)
    }

    /// Objective vectors of `ids`, or `None` if any is still pending.
    pub fn objectives_of(&self, ids: &[SolutionId]) -> Option<Vec<Vec<f64>>> {
        ids.iter()
            .map(|&id| self.get(id).objectives().map(<[f64]>::to_vec))
            .collect()
    }

    /// Drops every solution whose id is not in `keep`.
    pub fn retain(&mut self, keep: &BTreeSet<SolutionId>) {
        self.solutions.retain(|id, _| keep.contains(id));
    }

    /// Number of live solutions.
    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = SolutionStore::new();
        let a = store.create(vec![Element::real(1.0)], 0);
        let b = store.create(vec![Element::real(2.0)], 0);
        assert!(a < b);

        let mut keep = BTreeSet::new();
        keep.insert(b);
        store.retain(&keep);
        assert_eq!(store.len(), 1);

        let c = store.create(vec![Element::real(3.0)], 1);
        assert!(c > b, "ids must never be reused");
    }

    #[test]
    fn test_duplicate_keeps_evaluation() {
        let mut store = SolutionStore::new();
        let a = store.create(vec![Element::real(1.0)], 0);
        store.get_mut(a).set_evaluation(vec![1.0, 2.0], vec![], 0.0);
        store.get_mut(a).fitness.rank = Some(3);

        let b = store.duplicate(a);
        assert_ne!(a, b);
        assert_eq!(store.get(b).objectives(), Some(&[1.0, 2.0][..]));
        assert_eq!(store.get(b).fitness.rank, Some(3));
        assert_eq!(store.get(b).id(), b);
    }

    #[test]
    fn test_objectives_of_pending() {
        let mut store = SolutionStore::new();
        let a = store.create(vec![Element::real(1.0)], 0);
        assert!(store.objectives_of(&[a]).is_none());
        store.get_mut(a).set_evaluation(vec![0.5], vec![], 0.0);
        assert_eq!(store.objectives_of(&[a]), Some(vec![vec![0.5]]));
    }
}
