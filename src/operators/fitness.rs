//! Ranking and fitness assignment.

use super::{bind_relation, bound, collect, evaluated, fronts_by_rank};
use crate::dominance::{compare_constrained, non_dominated_sort_by, Dominance, DominanceRelation};
use crate::error::{MoeaError, Result};
use crate::indicators::crowding_distance;
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::representation::{ideal_point, nadir_point, Problem, SolutionId, SolutionSet, SolutionStore, Tag};

/// Pairwise comparison of members `i` and `j` of `ids`, feasibility first
/// when `constrained`.
fn comparator<'a>(
    relation: &'a dyn DominanceRelation,
    store: &'a SolutionStore,
    ids: &'a [SolutionId],
    objectives: &'a [Vec<f64>],
    constrained: bool,
) -> impl FnMut(usize, usize) -> Result<Dominance> + 'a {
    move |i, j| {
        if constrained {
            compare_constrained(
                relation,
                &objectives[i],
                store.get(ids[i]).violation(),
                &objectives[j],
                store.get(ids[j]).violation(),
            )
        } else {
            relation.is_better_than(&objectives[i], &objectives[j])
        }
    }
}

const RANKING_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new(
        "constraint_handling",
        PropertyKind::Bool,
        "Rank feasible solutions ahead of infeasible ones",
    ),
    PropertyDescriptor::new("relation", PropertyKind::Text, "Dominance relation (read-only)"),
];

fn ranking_property(
    key: &str,
    constrained: bool,
    relation: &Option<Box<dyn DominanceRelation>>,
) -> Result<PropertyValue> {
    match key {
        "constraint_handling" => Ok(constrained.into()),
        "relation" => Ok(relation.as_ref().map_or("pareto", |r| r.name()).into()),
        _ => Err(unknown_property(key)),
    }
}

fn set_ranking_property(key: &str, value: PropertyValue, constrained: &mut bool) -> Result<()> {
    match key {
        "constraint_handling" => *constrained = value.into_bool(key)?,
        "relation" => {
            return Err(MoeaError::configuration(
                "property `relation` is read-only; supply the relation at construction",
            ))
        }
        _ => return Err(unknown_property(key)),
    }
    Ok(())
}

/// Fast non-dominated sorting.
///
/// Every member gets its front index as `rank`. The published set lists
/// members front by front, ascending id within a front.
///
/// Reads: `evaluated`. Publishes: `ranked`.
pub struct NonDominanceRanking {
    name: String,
    relation: Option<Box<dyn DominanceRelation>>,
    constraint_handling: bool,
}

impl NonDominanceRanking {
    /// Ranks by Pareto dominance with constraint handling.
    pub fn new() -> Self {
        Self {
            name: "ranking".into(),
            relation: None,
            constraint_handling: true,
        }
    }

    /// Ranks by `relation` instead of Pareto dominance.
    pub fn with_relation(mut self, relation: Box<dyn DominanceRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Enables or disables feasibility-first comparison.
    pub fn with_constraint_handling(mut self, enabled: bool) -> Self {
        self.constraint_handling = enabled;
        self
    }
}

impl Default for NonDominanceRanking {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for NonDominanceRanking {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        RANKING_PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        ranking_property(key, self.constraint_handling, &self.relation)
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        set_ranking_property(key, value, &mut self.constraint_handling)
    }
}

impl Operator for NonDominanceRanking {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Fitness
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::EVALUATED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::RANKED]
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        bind_relation(&mut self.relation, problem)
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let relation = bound(&self.relation)?;
        let mut ids = collect(ctx, &Tag::EVALUATED);
        ids.sort_unstable();
        let objectives = evaluated(ctx.store, &ids)?;

        let sorted = {
            let store: &SolutionStore = ctx.store;
            non_dominated_sort_by(
                ids.len(),
                comparator(relation, store, &ids, &objectives, self.constraint_handling),
            )?
        };

        let mut set = SolutionSet::new(self.name.clone()).with_tag(Tag::RANKED);
        for (rank, front) in sorted.fronts.iter().enumerate() {
            for &i in front {
                ctx.store.get_mut(ids[i]).fitness.rank = Some(rank);
                set.push(ids[i]);
            }
        }
        ctx.publish(set);
        Ok(())
    }
}

/// Fonseca–Fleming ranking: a member's rank is the number of members that
/// dominate it.
///
/// Reads: `evaluated`. Publishes: `ranked`.
pub struct MogaRanking {
    name: String,
    relation: Option<Box<dyn DominanceRelation>>,
    constraint_handling: bool,
}

impl MogaRanking {
    /// Ranks by Pareto dominance with constraint handling.
    pub fn new() -> Self {
        Self {
            name: "moga-ranking".into(),
            relation: None,
            constraint_handling: true,
        }
    }

    /// Ranks by `relation` instead of Pareto dominance.
    pub fn with_relation(mut self, relation: Box<dyn DominanceRelation>) -> Self {
        self.relation = Some(relation);
        self
    }

    /// Enables or disables feasibility-first comparison.
    pub fn with_constraint_handling(mut self, enabled: bool) -> Self {
        self.constraint_handling = enabled;
        self
    }
}

impl Default for MogaRanking {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for MogaRanking {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        RANKING_PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        ranking_property(key, self.constraint_handling, &self.relation)
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        set_ranking_property(key, value, &mut self.constraint_handling)
    }
}

impl Operator for MogaRanking {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Fitness
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::EVALUATED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::RANKED]
    }

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        bind_relation(&mut self.relation, problem)
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let relation = bound(&self.relation)?;
        let mut ids = collect(ctx, &Tag::EVALUATED);
        ids.sort_unstable();
        let objectives = evaluated(ctx.store, &ids)?;

        let n = ids.len();
        let mut counts = vec![0usize; n];
        {
            let store: &SolutionStore = ctx.store;
            let mut compare = comparator(relation, store, &ids, &objectives, self.constraint_handling);
            for i in 0..n {
                for j in (i + 1)..n {
                    match compare(i, j)? {
                        Dominance::Better => counts[j] += 1,
                        Dominance::Worse => counts[i] += 1,
                        Dominance::Incomparable => {}
                    }
                }
            }
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (counts[i], ids[i]));
        let mut set = SolutionSet::new(self.name.clone()).with_tag(Tag::RANKED);
        for i in order {
            ctx.store.get_mut(ids[i]).fitness.rank = Some(counts[i]);
            set.push(ids[i]);
        }
        ctx.publish(set);
        Ok(())
    }
}

/// Crowding distance per front, stored as `diversity`.
///
/// Reads: `ranked`. Publishes: `fitness`.
#[derive(Debug, Clone)]
pub struct CrowdingDistance {
    name: String,
}

impl CrowdingDistance {
    /// Creates the node.
    pub fn new() -> Self {
        Self {
            name: "crowding".into(),
        }
    }
}

impl Default for CrowdingDistance {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for CrowdingDistance {}

impl Operator for CrowdingDistance {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Fitness
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::RANKED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::FITNESS]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &Tag::RANKED);
        for front in fronts_by_rank(ctx.store, &ids) {
            let objectives = evaluated(ctx.store, &front)?;
            let distances = crowding_distance(&objectives);
            for (&id, d) in front.iter().zip(distances) {
                ctx.store.get_mut(id).fitness.diversity = Some(d);
            }
        }
        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::FITNESS));
        Ok(())
    }
}

/// Rank-averaged scalar fitness.
///
/// Members sorted by rank (then id) receive raw fitness `N, N - 1, .., 1`;
/// each member's `score` is the mean raw fitness of its rank, so equal ranks
/// share equal scores and better ranks score higher.
///
/// Reads: `ranked`. Publishes: `averaged`.
#[derive(Debug, Clone)]
pub struct AverageFitness {
    name: String,
}

impl AverageFitness {
    /// Creates the node.
    pub fn new() -> Self {
        Self {
            name: "average-fitness".into(),
        }
    }
}

impl Default for AverageFitness {
    fn default() -> Self {
        Self::new()
    }
}

impl Configurable for AverageFitness {}

impl Operator for AverageFitness {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Fitness
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::RANKED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::AVERAGED]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &Tag::RANKED);
        let n = ids.len();
        let mut position = 0usize;
        for front in fronts_by_rank(ctx.store, &ids) {
            let k = front.len();
            // mean of N - position .. N - position - k + 1
            let mean = (n - position) as f64 - (k as f64 - 1.0) / 2.0;
            for &id in &front {
                ctx.store.get_mut(id).fitness.score = Some(mean);
            }
            position += k;
        }
        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::AVERAGED));
        Ok(())
    }
}

const SHARING_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("alpha", PropertyKind::Real, "Sharing function exponent"),
    PropertyDescriptor::new(
        "sigma_share",
        PropertyKind::Real,
        "Niche radius in normalised objective space; 0 estimates it from the population",
    ),
];

/// Fitness sharing within each rank.
///
/// Objectives are normalised to the population's ideal–nadir box. The
/// niche count of a member is `sum sh(d)` over members of the same rank,
/// with `sh(d) = 1 - (d / sigma)^alpha` for `d < sigma` and 0 otherwise.
/// Scores are divided by the niche count and then rescaled so each rank
/// keeps its total score.
///
/// When no niche radius is set it is estimated as the root of
/// `(1 + s)^M - N s^M - 1 = 0` (`2 / (N - 1)` for two objectives,
/// `sqrt(M)` for two or fewer members).
///
/// Reads: `averaged`. Publishes: `fitness`.
#[derive(Debug, Clone)]
pub struct SharedFitness {
    name: String,
    alpha: f64,
    sigma: Option<f64>,
}

impl SharedFitness {
    /// Sharing with `alpha = 1` and an estimated niche radius.
    pub fn new() -> Self {
        Self {
            name: "shared-fitness".into(),
            alpha: 1.0,
            sigma: None,
        }
    }

    /// Sets the sharing exponent.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Fixes the niche radius.
    pub fn with_sigma(mut self, sigma: f64) -> Self {
        self.sigma = Some(sigma);
        self
    }
}

impl Default for SharedFitness {
    fn default() -> Self {
        Self::new()
    }
}

/// Niche radius estimate for `n` points in `m` normalised objectives.
pub(crate) fn estimate_sigma(n: usize, m: usize) -> f64 {
    if n <= 2 {
        return (m as f64).sqrt();
    }
    if m == 2 {
        return 2.0 / (n as f64 - 1.0);
    }
    let f = |s: f64| (1.0 + s).powi(m as i32) - n as f64 * s.powi(m as i32) - 1.0;
    let mut lo = 1e-12;
    let mut hi = 1.0;
    while f(hi) > 0.0 {
        hi *= 2.0;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        if f(mid) > 0.0 {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

impl Configurable for SharedFitness {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        SHARING_PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "alpha" => Ok(self.alpha.into()),
            "sigma_share" => Ok(self.sigma.unwrap_or(0.0).into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        let v = match key {
            "alpha" | "sigma_share" => value.into_real(key)?,
            _ => return Err(unknown_property(key)),
        };
        if !(v >= 0.0 && v.is_finite()) {
            return Err(MoeaError::configuration(format!(
                "property `{key}` must be a non-negative number, got {v}"
            )));
        }
        if key == "alpha" {
            self.alpha = v;
        } else {
            self.sigma = (v > 0.0).then_some(v);
        }
        Ok(())
    }
}

impl Operator for SharedFitness {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> NodeKind {
        NodeKind::Fitness
    }

    fn input_tags(&self) -> Vec<Tag> {
        vec![Tag::AVERAGED]
    }

    fn output_tags(&self) -> Vec<Tag> {
        vec![Tag::FITNESS]
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &Tag::AVERAGED);
        let objectives = evaluated(ctx.store, &ids)?;
        let m = ctx.problem.objective_dim();
        let sigma = self.sigma.unwrap_or_else(|| estimate_sigma(ids.len(), m));

        let normalised = match (ideal_point(&objectives), nadir_point(&objectives)) {
            (Some(lo), Some(hi)) => objectives
                .iter()
                .map(|p| {
                    p.iter()
                        .zip(lo.iter().zip(&hi))
                        .map(|(&v, (&l, &h))| if h > l { (v - l) / (h - l) } else { 0.0 })
                        .collect::<Vec<f64>>()
                })
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        let index: std::collections::HashMap<SolutionId, usize> =
            ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

        for front in fronts_by_rank(ctx.store, &ids) {
            let members: Vec<usize> = front.iter().map(|id| index[id]).collect();
            let mut shared = Vec::with_capacity(members.len());
            for &i in &members {
                let niche: f64 = members
                    .iter()
                    .map(|&j| {
                        let d = normalised[i]
                            .iter()
                            .zip(&normalised[j])
                            .map(|(a, b)| (a - b) * (a - b))
                            .sum::<f64>()
                            .sqrt();
                        if d < sigma {
                            1.0 - (d / sigma).powf(self.alpha)
                        } else {
                            0.0
                        }
                    })
                    .sum();
                let score = ctx.store.get(ids[i]).fitness.score.unwrap_or(0.0);
                shared.push((score, score / niche.max(1.0)));
            }

            let total: f64 = shared.iter().map(|(s, _)| s).sum();
            let total_shared: f64 = shared.iter().map(|(_, s)| s).sum();
            let scale = if total_shared > 0.0 { total / total_shared } else { 1.0 };
            for (&id, (_, s)) in front.iter().zip(shared) {
                ctx.store.get_mut(id).fitness.score = Some(s * scale);
            }
        }

        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::FITNESS));
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dominance::EpsilonDominance;
    use crate::operators::testing::Harness;

    #[test]
    fn test_ranking_fronts() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 5.0]);
        let b = h.solution(&[3.0, 3.0]);
        let c = h.solution(&[4.0, 4.0]);
        let d = h.solution(&[5.0, 1.0]);
        h.put(Tag::EVALUATED, &[c, d, b, a]);

        let out = h.run(&mut NonDominanceRanking::new());
        assert_eq!(out[0].ids(), &[a, b, d, c]);
        assert_eq!(h.store.get(c).fitness.rank, Some(1));
        assert_eq!(h.store.get(d).fitness.rank, Some(0));
    }

    #[test]
    fn test_ranking_feasibility_first() {
        let mut h = Harness::zdt1(2);
        let good = h.solution(&[5.0, 5.0]);
        let infeasible = h.solution(&[1.0, 1.0]);
        h.store.get_mut(infeasible).set_evaluation(vec![1.0, 1.0], vec![3.0], 2.0);
        h.put(Tag::EVALUATED, &[good, infeasible]);

        h.run(&mut NonDominanceRanking::new());
        assert_eq!(h.store.get(good).fitness.rank, Some(0));
        assert_eq!(h.store.get(infeasible).fitness.rank, Some(1));

        h.run(&mut NonDominanceRanking::new().with_constraint_handling(false));
        assert_eq!(h.store.get(infeasible).fitness.rank, Some(0));
        assert_eq!(h.store.get(good).fitness.rank, Some(1));
    }

    #[test]
    fn test_relation_dimension_checked() {
        let h = Harness::zdt1(2);
        let mut node = NonDominanceRanking::new()
            .with_relation(Box::new(EpsilonDominance::with_epsilon(vec![0.1; 3]).unwrap()));
        assert!(matches!(
            node.attach(&h.problem),
            Err(MoeaError::Dimensionality { .. })
        ));
    }

    #[test]
    fn test_relation_property_read_only() {
        let mut node = NonDominanceRanking::new();
        assert_eq!(node.property("relation").unwrap(), PropertyValue::from("pareto"));
        assert!(node.set_property("relation", "epsilon".into()).is_err());
        node.set_property("constraint_handling", false.into()).unwrap();
        assert_eq!(node.property("constraint_handling").unwrap(), PropertyValue::Bool(false));
    }

    #[test]
    fn test_moga_rank_counts_dominators() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[1.0, 1.0]);
        let b = h.solution(&[2.0, 2.0]);
        let c = h.solution(&[3.0, 3.0]);
        let d = h.solution(&[0.5, 4.0]);
        h.put(Tag::EVALUATED, &[c, b, a, d]);

        let out = h.run(&mut MogaRanking::new());
        let ranks: Vec<_> = [a, b, c, d]
            .iter()
            .map(|&id| h.store.get(id).fitness.rank.unwrap())
            .collect();
        assert_eq!(ranks, vec![0, 1, 2, 0]);
        assert_eq!(out[0].ids(), &[a, d, b, c]);
    }

    #[test]
    fn test_crowding_per_front() {
        let mut h = Harness::zdt1(2);
        let ids: Vec<_> = [[0.0, 4.0], [1.0, 2.0], [2.0, 1.0], [4.0, 0.0]]
            .iter()
            .map(|p| h.solution(p))
            .collect();
        let worse = h.solution(&[5.0, 5.0]);
        for &id in &ids {
            h.store.get_mut(id).fitness.rank = Some(0);
        }
        h.store.get_mut(worse).fitness.rank = Some(1);
        let mut all = ids.clone();
        all.push(worse);
        h.put(Tag::RANKED, &all);

        h.run(&mut CrowdingDistance::new());
        let d: Vec<f64> = ids.iter().map(|&id| h.store.get(id).fitness.diversity.unwrap()).collect();
        assert!(d[0].is_infinite() && d[3].is_infinite());
        // (2 - 0) / 4 + (4 - 1) / 4
        assert!((d[1] - 1.25).abs() < 1e-12);
        assert!(h.store.get(worse).fitness.diversity.unwrap().is_infinite());
    }

    #[test]
    fn test_average_fitness() {
        let mut h = Harness::zdt1(2);
        let ids: Vec<_> = (0..5).map(|i| h.solution(&[i as f64, 0.0])).collect();
        for (i, &id) in ids.iter().enumerate() {
            h.store.get_mut(id).fitness.rank = Some(if i < 2 { 0 } else { 1 });
        }
        h.put(Tag::RANKED, &ids);
        h.run(&mut AverageFitness::new());
        let scores: Vec<f64> = ids.iter().map(|&id| h.store.get(id).fitness.score.unwrap()).collect();
        // raw fitness 5, 4 | 3, 2, 1
        assert_eq!(scores, vec![4.5, 4.5, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_sigma_estimate() {
        assert!((estimate_sigma(11, 2) - 0.2).abs() < 1e-12);
        assert!((estimate_sigma(2, 3) - 3f64.sqrt()).abs() < 1e-12);
        let s = estimate_sigma(50, 3);
        let residual = (1.0 + s).powi(3) - 50.0 * s.powi(3) - 1.0;
        assert!(residual.abs() < 1e-9, "residual {residual}");
        assert!(s > 0.0);
    }

    #[test]
    fn test_sharing_penalises_crowded_members() {
        let mut h = Harness::zdt1(2);
        let a = h.solution(&[0.0, 1.0]);
        let b = h.solution(&[0.01, 0.99]);
        let c = h.solution(&[1.0, 0.0]);
        for &id in &[a, b, c] {
            let f = &mut h.store.get_mut(id).fitness;
            f.rank = Some(0);
            f.score = Some(2.0);
        }
        h.put(Tag::AVERAGED, &[a, b, c]);
        h.run(&mut SharedFitness::new().with_sigma(0.5));

        let s: Vec<f64> = [a, b, c].iter().map(|&id| h.store.get(id).fitness.score.unwrap()).collect();
        assert!(s[2] > s[0] && s[2] > s[1], "{s:?}");
        assert!((s.iter().sum::<f64>() - 6.0).abs() < 1e-12);
    }
}
