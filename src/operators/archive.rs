//! Non-dominated archive.

use super::{bind_relation, bound, collect, evaluated};
use crate::dominance::{compare_constrained, Dominance, DominanceRelation};
use crate::error::Result;
use crate::indicators::crowding_distance;
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::representation::{Problem, SolutionId, SolutionSet, SolutionStore, Tag};

const PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("capacity", PropertyKind::Int, "Maximum archive size; 0 is unbounded"),
    PropertyDescriptor::new(
        "constraint_handling",
        PropertyKind::Bool,
        "Compare feasibility before objectives",
    ),
];

/// Keeps the non-dominated union of every solution evaluated so far.
///
/// Each generation the stored members and the newly evaluated solutions
/// are pooled; solutions with an objective vector identical to an older
/// one are dropped, and only members no other member dominates survive.
/// With a capacity, the most crowded member (smallest crowding distance,
/// larger id on ties) is removed until the archive fits.
///
/// Reads: `evaluated`. Publishes: `archive`.
pub struct NonDominatedArchive {
    name: String,
    capacity: Option<usize>,
    constraint_handling: bool,
    relation: Option<Box<dyn DominanceRelation>>,
    members: Vec<SolutionId>,
}

impl NonDominatedArchive {
    /// An unbounded archive under Pareto dominance.
    pub fn new() -> Self {
        Self {
            name: "archive".into(),
            capacity: None,
            constraint_handling: true,
            relation: None,
            members: Vec::new(),
        }
    }

    /// Limits the archive size.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Compares with `relation` instead of Pareto dominance.
    pub fn with_relation(mut self, relation: Box<dyn DominanceRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Enables or disables feasibility-first comparison.
    pub fn with_constraint_handling(mut self, enabled: bool) -> Self {
        self.constraint_handling = enabled;
        self
    }

    /// Current members, ascending id.
    pub fn members(&self) -> &[SolutionId] {
        &self.members
    }

    fn filter(&self, store: &SolutionStore, mut pool: Vec<SolutionId>) -> Result<Vec<SolutionId>> {
        pool.sort_unstable();
        pool.dedup();
        let mut objectives = evaluated(store, &pool)?;

        // identical vectors: the oldest wins
        let mut keep = vec![true; pool.len()];
        for i in 0..pool.len() {
            if keep[i] && objectives[..i].iter().zip(&keep).any(|(o, &k)| k && *o == objectives[i]) {
                keep[i] = false;
            }
        }

        let relation = bound(&self.relation)?;
        let compare = |i: usize, j: usize| {
            if self.constraint_handling {
                compare_constrained(
                    relation,
                    &objectives[i],
                    store.get(pool[i]).violation(),
                    &objectives[j],
                    store.get(pool[j]).violation(),
                )
            } else {
                relation.is_better_than(&objectives[i], &objectives[j])
            }
        };
        let mut survivors = Vec::new();
        for i in 0..pool.len() {
            if !keep[i] {
                continue;
            }
            let mut dominated = false;
            for j in 0..pool.len() {
                if j != i && keep[j] && compare(j, i)? == Dominance::Better {
                    dominated = true;
                    break;
                }
            }
            if !dominated {
                survivors.push(i);
            }
        }

        let mut members: Vec<SolutionId> = survivors.iter().map(|&i| pool[i]).collect();
        objectives = survivors.into_iter().map(|i| objectives[i].clone()).collect();

        if let Some(capacity) = self.capacity {
            while members.len() > capacity {
                let crowding = crowding_distance(&objectives);
                let Some((victim, _)) = crowding
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.total_cmp(b.1).then(members[b.0].cmp(&members[a.0])))
                else {
                    break;
                };
                members.remove(victim);
                objectives.remove(victim);
            }
        }
        Ok(members)
    }
}

impl Default for NonDominatedArchive {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for NonDominatedArchive {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "capacity" => Ok(self.capacity.unwrap_or(0).into()),
            "constraint_handling" => Ok(self.constraint_handling.into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "capacity" => {
                let c = value.into_usize(key)?;
                self.capacity = (c > 0).then_some(c);
            }
            "constraint_handling" => self.constraint_handling = value.into_bool(key)?,
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for NonDominatedArchive {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Archive
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::EVALUATED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::ARCHIVE]
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        self.members.clear();
        bind_relation(&mut self.relation, problem)
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let mut pool = self.members.clone();
        pool.extend(collect(ctx, &Tag::EVALUATED));
        self.members = self.filter(ctx.store, pool)?;
        ctx.publish(SolutionSet::from_ids(self.name.clone(), self.members.iter().copied()).with_tag(Tag::ARCHIVE));
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
    fn test_keeps_non_dominated_union() {
        let mut h = Harness::zdt1(2);
        let mut archive = NonDominatedArchive::new();

        let a = h.solution(&[1.0, 4.0]);
        let b = h.solution(&[3.0, 3.0]);
        h.put(Tag::EVALUATED, &[a, b]);
        h.run(&mut archive);
        assert_eq!(archive.members(), &[a, b]);

        let c = h.solution(&[2.0, 2.0]);
        let d = h.solution(&[5.0, 5.0]);
        h.put(Tag::EVALUATED, &[c, d]);
        let out = h.try_run(&mut archive).unwrap();
        assert_eq!(out[0].ids(), &[a, c]);
    }

    #[test]
    fn test_duplicate_vectors_keep_oldest() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[1.0, 1.0]);
        h.put(Tag::EVALUATED, &[b, a]);
        let mut archive = NonDominatedArchive::new();
        h.run(&mut archive);
        assert_eq!(archive.members(), &[a]);
    }

    #[test]
    fn test_capacity_drops_most_crowded() {
        let mut h = Harness::zdt1(2);
        let ids: Vec<_> = [[0.0, 4.0], [1.0, 3.0], [1.1, 2.9], [4.0, 0.0]]
            .iter()
            .map(|p| h.solution(p))
            .collect();
        h.put(Tag::EVALUATED, &ids);
        let mut archive = NonDominatedArchive::new().with_capacity(3);
        h.run(&mut archive);
        assert_eq!(archive.members().len(), 3);
        assert!(archive.members().contains(&ids[0]));
        assert!(archive.members().contains(&ids[3]));
    }

    #[test]
    fn test_feasible_members_displace_infeasible() {
        let mut h = Harness::zdt1(2);
        let infeasible = h.solution(&[0.0, 0.0]);
        h.store.get_mut(infeasible).set_evaluation(vec![0.0, 0.0], vec![1.0], 1.0);
        let feasible = h.solution(&[5.0, 5.0]);
        h.put(Tag::EVALUATED, &[infeasible, feasible]);
        let mut archive = NonDominatedArchive::new();
        h.run(&mut archive);
        assert_eq!(archive.members(), &[feasible]);
    }

    #[test]
    fn test_capacity_property() {
        let mut archive = NonDominatedArchive::new();
        assert_eq!(archive.property("capacity").unwrap(), PropertyValue::Int(0));
        archive.set_property("capacity", 10usize.into()).unwrap();
        assert_eq!(archive.property("capacity").unwrap(), PropertyValue::Int(10));
        assert!(archive.set_property("capacity", true.into()).is_err());
    }
}
