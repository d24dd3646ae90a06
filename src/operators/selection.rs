//! Filtration: survival, mating selection and merging.

use super::{collect, evaluated, fronts_by_rank, preference};
use crate::error::{MoeaError, Result};
use crate::indicators::hypervolume_contributions;
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::random::shuffle;
use crate::representation::{merge_ids, nadir_point, SolutionId, SolutionSet, SolutionStore, Tag};
use rand::Rng;

/// Publishes one two-member set per pair under `mating-pool`.
///
/// A solution drawn twice into the same pair is duplicated, since a set
/// never holds the same id twice.
fn publish_pairs(ctx: &mut NodeContext<'_>, name: &str, pairs: Vec<(SolutionId, SolutionId)>) {
    for (i, (a, b)) in pairs.into_iter().enumerate() {
        let b = if a == b { ctx.store.duplicate(b) } else { b };
        let set = SolutionSet::from_ids(format!("{name}-pair-{i}"), [a, b]).with_tag(Tag::MATING_POOL);
        ctx.publish(set);
    }
}

/// Keeps the `size` best members by rank, then diversity, then score.
///
/// Remaining ties go to the lower [`SolutionId`].
///
/// Reads: `fitness` (configurable). Publishes: `elite`.
#[derive(Debug, Clone)]
pub struct EliteSelection {
    name: String,
    size: usize,
    input: Tag,
}

impl EliteSelection {
    /// Keeps `size` members.
    pub fn new(size: usize) -> Self {
        Self {
            name: "elite".into(),
            size,
            input: Tag::FITNESS,
        }
    }

    /// Reads candidates from `tag` instead of `fitness`.
    pub fn with_input(mut self, tag: Tag) -> Self {
        self.input = tag;
        self
    }
}

impl Configurable for EliteSelection {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::new("size", PropertyKind::Int, "Number of survivors")]
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "size" => Ok(self.size.into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "size" => self.size = value.into_usize(key)?,
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for EliteSelection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filtration
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![self.input.clone()]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::ELITE]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let mut ids = collect(ctx, &self.input);
        let store: &SolutionStore = ctx.store;
        ids.sort_by(|&a, &b| preference(store, a, b).then(a.cmp(&b)));
        ids.truncate(self.size);
        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::ELITE));
        Ok(())
    }
}

/// Binary (or k-ary) tournament mating selection.
///
/// Each tournament draws `tournament_size` members uniformly with
/// replacement and keeps the preferred one; an earlier draw wins ties.
/// Two tournaments form a pair, published as its own set.
///
/// Reads: `elite` (configurable). Publishes: `mating-pool`, one set per pair.
///
/// # Panics
///
/// Panics if the input set is empty.
#[derive(Debug, Clone)]
pub struct TournamentSelection {
    name: String,
    pair_count: usize,
    tournament_size: usize,
    input: Tag,
}

impl TournamentSelection {
    /// Draws `pair_count` pairs by binary tournament.
    pub fn new(pair_count: usize) -> Self {
        Self {
            name: "tournament".into(),
            pair_count,
            tournament_size: 2,
            input: Tag::ELITE,
        }
    }

    /// Sets the number of contestants per tournament (at least 1).
    pub fn with_tournament_size(mut self, k: usize) -> Self {
        self.tournament_size = k.max(1);
        self
    }

    /// Reads candidates from `tag` instead of `elite`.
    pub fn with_input(mut self, tag: Tag) -> Self {
        self.input = tag;
        self
    }

    fn tournament(&self, store: &SolutionStore, ids: &[SolutionId], rng: &mut impl Rng) -> SolutionId {
        let mut best = ids[rng.random_range(0..ids.len())];
        for _ in 1..self.tournament_size {
            let challenger = ids[rng.random_range(0..ids.len())];
            if preference(store, challenger, best).is_lt() {
                best = challenger;
            }
        }
        best
    }
}

impl Configurable for TournamentSelection {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor::new("pair_count", PropertyKind::Int, "Number of parent pairs"),
            PropertyDescriptor::new("tournament_size", PropertyKind::Int, "Contestants per tournament"),
        ]
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "pair_count" => Ok(self.pair_count.into()),
            "tournament_size" => Ok(self.tournament_size.into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "pair_count" => self.pair_count = value.into_usize(key)?,
            "tournament_size" => {
                let k = value.into_usize(key)?;
                if k == 0 {
                    return Err(MoeaError::configuration("tournament size must be at least 1"));
                }
                self.tournament_size = k;
            }
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for TournamentSelection {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filtration
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![self.input.clone()]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::MATING_POOL]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &self.input);
        assert!(!ids.is_empty(), "cannot select from empty population");

        let mut pairs = Vec::with_capacity(self.pair_count);
        for _ in 0..self.pair_count {
            let a = self.tournament(ctx.store, &ids, ctx.rng);
            let b = self.tournament(ctx.store, &ids, ctx.rng);
            pairs.push((a, b));
        }
        publish_pairs(ctx, &self.name, pairs);
        Ok(())
    }
}

/// Stochastic universal sampling on `score`.
///
/// `count` equally spaced pointers with one random offset sweep the
/// cumulative scores (Baker, 1987). Selected parents are shuffled and
/// paired; an odd parent out is paired with a random member. When no
/// member has a positive score, every member weighs the same.
///
/// Reads: `fitness`. Publishes: `mating-pool`, one set per pair.
///
/// # Panics
///
/// Panics if the input set is empty.
#[derive(Debug, Clone)]
pub struct StochasticUniversalSampling {
    name: String,
    count: usize,
}

impl StochasticUniversalSampling {
    /// Selects `count` parents.
    pub fn new(count: usize) -> Self {
        Self {
            name: "sus".into(),
            count,
        }
    }
}

/// Indices picked by `count` equally spaced pointers starting at `start`,
/// a fraction of the spacing in `[0, 1)`.
pub(crate) fn sus_indices(weights: &[f64], count: usize, start: f64) -> Vec<usize> {
    let total: f64 = weights.iter().sum();
    if count == 0 || weights.is_empty() || total <= 0.0 {
        return Vec::new();
    }
    let spacing = total / count as f64;
    let mut out = Vec::with_capacity(count);
    let mut cumulative = weights[0];
    let mut i = 0;
    for p in 0..count {
        let pointer = (start + p as f64) * spacing;
        while cumulative <= pointer && i + 1 < weights.len() {
            i += 1;
            cumulative += weights[i];
        }
        out.push(i);
    }
    out
}

impl Configurable for StochasticUniversalSampling {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::new("count", PropertyKind::Int, "Number of parents selected")]
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "count" => Ok(self.count.into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "count" => self.count = value.into_usize(key)?,
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for StochasticUniversalSampling {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filtration
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::FITNESS]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::MATING_POOL]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &Tag::FITNESS);
        assert!(!ids.is_empty(), "cannot select from empty population");

        let mut weights: Vec<f64> = ids
            .iter()
            .map(|&id| ctx.store.get(id).fitness.score.unwrap_or(0.0).max(0.0))
            .collect();
        if weights.iter().sum::<f64>() <= 0.0 {
            weights.fill(1.0);
        }

        let start = ctx.rng.random::<f64>();
        let mut parents: Vec<SolutionId> = sus_indices(&weights, self.count, start)
            .into_iter()
            .map(|i| ids[i])
            .collect();
        shuffle(&mut parents, ctx.rng);
        if parents.len() % 2 == 1 {
            parents.push(ids[ctx.rng.random_range(0..ids.len())]);
        }

        let pairs = parents.chunks_exact(2).map(|p| (p[0], p[1])).collect();
        publish_pairs(ctx, &self.name, pairs);
        Ok(())
    }
}

/// Steady-state hypervolume reduction: drops exactly one member.
///
/// The victim is the member of the worst front with the smallest exclusive
/// hypervolume contribution, measured against that front's nadir shifted
/// by `reference_offset`; ties drop the larger id. A worst front with a
/// single member loses that member. In generation 0 the population passes
/// through unchanged.
///
/// Reads: `ranked`. Publishes: `reduced`.
#[derive(Debug, Clone)]
pub struct SmsEmoaReduce {
    name: String,
    reference_offset: f64,
}

impl SmsEmoaReduce {
    /// Reduction with a reference offset of 1.
    pub fn new() -> Self {
        Self {
            name: "reduce".into(),
            reference_offset: 1.0,
        }
    }

    /// Sets the offset added to the worst front's nadir.
    pub fn with_reference_offset(mut self, offset: f64) -> Self {
        self.reference_offset = offset;
        self
    }

    fn victim(&self, store: &SolutionStore, worst: &[SolutionId]) -> Result<SolutionId> {
        if let [only] = worst {
            return Ok(*only);
        }
        let objectives = evaluated(store, worst)?;
        let reference: Vec<f64> = nadir_point(&objectives)
            .unwrap_or_default()
            .into_iter()
            .map(|v| v + self.reference_offset)
            .collect();
        let contributions = hypervolume_contributions(&objectives, &reference)?;
        let (i, _) = contributions
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1).then(worst[b.0].cmp(&worst[a.0])))
            .ok_or_else(|| MoeaError::configuration("empty front in reduction"))?;
        Ok(worst[i])
    }
}

impl Default for SmsEmoaReduce {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for SmsEmoaReduce {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        vec![PropertyDescriptor::new(
            "reference_offset",
            PropertyKind::Real,
            "Offset added to the worst front's nadir to form the hypervolume reference",
        )]
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "reference_offset" => Ok(self.reference_offset.into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "reference_offset" => {
                let v = value.into_real(key)?;
                if !(v > 0.0 && v.is_finite()) {
                    return Err(MoeaError::configuration(format!(
                        "reference offset must be positive, got {v}"
                    )));
                }
                self.reference_offset = v;
            }
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for SmsEmoaReduce {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filtration
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::RANKED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::REDUCED]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let mut ids = collect(ctx, &Tag::RANKED);
        if ctx.generation > 0 {
            if let Some(worst) = fronts_by_rank(ctx.store, &ids).pop() {
                let victim = self.victim(ctx.store, &worst)?;
                ids.retain(|&id| id != victim);
            }
        }
        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::REDUCED));
        Ok(())
    }
}

/// Unites its inputs into the population of the next generation.
///
/// Members keep the order of the input tags; repeated ids are dropped.
///
/// Reads: the configured tags. Publishes: `for-next-iteration`.
#[derive(Debug, Clone)]
pub struct MergeForNextIteration {
    name: String,
    inputs: Vec<Tag>,
}

impl MergeForNextIteration {
    /// Merges the sets published under `inputs`.
    pub fn new(inputs: Vec<Tag>) -> Self {
        Self {
            name: "merge".into(),
            inputs,
        }
    }
}

impl Configurable for MergeForNextIteration {}

impl Operator for MergeForNextIteration {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Filtration
    }

    fn input_tags(&self) -> Vec<Tag> {
        self.inputs.clone()
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::FOR_NEXT_ITERATION]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = merge_ids(self.inputs.iter().flat_map(|tag| ctx.input(tag)));
        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::FOR_NEXT_ITERATION));
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

    fn with_fitness(h: &mut Harness, rank: usize, diversity: f64) -> SolutionId {
        let id = h.solution(&[rank as f64, diversity]);
        let f = &mut h.store.get_mut(id).fitness;
        f.rank = Some(rank);
        f.diversity = Some(diversity);
        id
    }

    #[test]
    fn test_elite_order() {
        let mut h = Harness::zdt1(2);
        let a = with_fitness(&mut h, 1, f64::INFINITY);
        let b = with_fitness(&mut h, 0, 0.5);
        let c = with_fitness(&mut h, 0, f64::INFINITY);
        let d = with_fitness(&mut h, 0, 0.5);
        h.put(Tag::FITNESS, &[a, b, c, d]);

        let out = h.run(&mut EliteSelection::new(3));
        assert_eq!(out[0].ids(), &[c, b, d]);
        assert!(out[0].has_tag(&Tag::ELITE));
    }

    #[test]
    fn test_tournament_prefers_better() {
        let mut h = Harness::zdt1(2);
        let best = with_fitness(&mut h, 0, 1.0);
        let worst = with_fitness(&mut h, 3, 1.0);
        h.put(Tag::ELITE, &[best, worst]);

        let mut node = TournamentSelection::new(50).with_tournament_size(4);
        let out = h.run(&mut node);
        assert_eq!(out.len(), 50);
        let wins = out
            .iter()
            .flat_map(|s| s.iter())
            .filter(|&id| id == best || h.store.get(id).fitness.rank == Some(0))
            .count();
        // P(worst wins a 4-way tournament) = 1/16
        assert!(wins > 80, "best won only {wins} of 100");
        assert!(out.iter().all(|s| s.len() == 2));
    }

    #[test]
    #[should_panic(expected = "empty population")]
    fn test_tournament_empty_input_panics() {
        let mut h = Harness::zdt1(2);
        h.put(Tag::ELITE, &[]);
        h.run(&mut TournamentSelection::new(1));
    }

    #[test]
    fn test_sus_pointers() {
        // pointers at 0.5, 1.5, 2.5, 3.5 over cumulative 1, 3, 4
        assert_eq!(sus_indices(&[1.0, 2.0, 1.0], 4, 0.5), vec![0, 1, 1, 2]);
        assert_eq!(sus_indices(&[0.0, 1.0], 2, 0.0), vec![1, 1]);
        assert!(sus_indices(&[0.0, 0.0], 2, 0.3).is_empty());
    }

    #[test]
    fn test_sus_pairs_all_parents() {
        let mut h = Harness::zdt1(2);
        let ids: Vec<_> = (0..5)
            .map(|i| {
                let id = h.solution(&[i as f64, 0.0]);
                h.store.get_mut(id).fitness.score = Some(1.0);
                id
            })
            .collect();
        h.put(Tag::FITNESS, &ids);
        let out = h.run(&mut StochasticUniversalSampling::new(5));
        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|s| s.len() == 2 && s.has_tag(&Tag::MATING_POOL)));
    }

    #[test]
    fn test_reduce_removes_smallest_contribution() {
        let mut h = Harness::zdt1(2);
        h.generation = 1;
        let ids: Vec<_> = [[0.0, 3.0], [1.0, 1.9], [1.1, 1.8], [3.0, 0.0]]
            .iter()
            .map(|p| {
                let id = h.solution(p);
                h.store.get_mut(id).fitness.rank = Some(0);
                id
            })
            .collect();
        h.put(Tag::RANKED, &ids);
        let out = h.run(&mut SmsEmoaReduce::new());
        assert_eq!(out[0].len(), 3);
        assert!(!out[0].contains(ids[2]) || !out[0].contains(ids[1]));
        assert!(out[0].contains(ids[0]) && out[0].contains(ids[3]));
    }

    #[test]
    fn test_reduce_single_worst_and_first_generation() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[2.0, 2.0]);
        h.store.get_mut(a).fitness.rank = Some(0);
        h.store.get_mut(b).fitness.rank = Some(1);
        h.put(Tag::RANKED, &[a, b]);

        let out = h.run(&mut SmsEmoaReduce::new());
        assert_eq!(out[0].ids(), &[a, b]);

        h.generation = 3;
        let out = h.run(&mut SmsEmoaReduce::new());
        assert_eq!(out[0].ids(), &[a]);
    }

    #[test]
    fn test_reduce_tie_drops_larger_id() {
        let mut h = Harness::zdt1(2);
        h.generation = 1;
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[1.0, 1.0]);
        for id in [a, b] {
            h.store.get_mut(id).fitness.rank = Some(0);
        }
        h.put(Tag::RANKED, &[a, b]);
        let out = h.run(&mut SmsEmoaReduce::new());
        assert_eq!(out[0].ids(), &[a]);
    }

    #[test]
    fn test_merge_keeps_order_without_repeats() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[2.0, 2.0]);
        let c = h.solution(&[3.0, 3.0]);
        h.put(Tag::ELITE, &[a, b]);
        h.put(Tag::MUTATED, &[b, c]);
        let out = h.run(&mut MergeForNextIteration::new(vec![Tag::ELITE, Tag::MUTATED]));
        assert_eq!(out[0].ids(), &[a, b, c]);
    }
}
