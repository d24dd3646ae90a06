//! Reference-point niching for many-objective survival.

use super::{collect, evaluated, fronts_by_rank};
use crate::error::{MoeaError, Result};
use crate::pipeline::{NodeContext, NodeKind, Operator};
use crate::property::{unknown_property, Configurable, PropertyDescriptor, PropertyKind, PropertyValue};
use crate::representation::{ideal_point, nadir_point, Problem, SolutionId, SolutionSet, Tag};
use crate::utils::{lattice_for_size, simplex_lattice};
use rand::Rng;
use std::collections::BTreeSet;

const PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::new("target_size", PropertyKind::Int, "Number of survivors per generation"),
    PropertyDescriptor::new(
        "divisions",
        PropertyKind::Int,
        "Simplex-lattice divisions; 0 picks the smallest lattice with at least target_size points",
    ),
];

/// NSGA-III niching on a simplex lattice of reference points.
///
/// Whole fronts that fit into `target_size` survive with infinite
/// `diversity`. Members of the front that overflows compete for the
/// remaining slots: objectives are normalised to the candidates'
/// ideal–nadir box, each candidate is associated with its closest
/// reference direction (perpendicular distance), and the least crowded
/// reference point repeatedly admits one member. Admitted members get a
/// positive `diversity` that decreases in admission order; everyone else
/// gets 0. An elite selection of `target_size` downstream then keeps
/// exactly the admitted solutions.
///
/// Reads: `ranked`. Publishes: `fitness`.
#[derive(Debug, Clone)]
pub struct ReferencePointNiching {
    name: String,
    target_size: usize,
    divisions: Option<usize>,
    reference_points: Vec<Vec<f64>>,
}

impl ReferencePointNiching {
    /// Niching towards `target_size` survivors.
    pub fn new(target_size: usize) -> Self {
        Self {
            name: "niching".into(),
            target_size,
            divisions: None,
            reference_points: Vec::new(),
        }
    }

    /// Uses a lattice with `h` divisions instead of sizing it automatically.
    pub fn with_divisions(mut self, h: usize) -> Self {
        self.divisions = Some(h);
        self
    }

    /// The reference points bound at attach time.
    pub fn reference_points(&self) -> &[Vec<f64>] {
        &self.reference_points
    }
}

/// Squared perpendicular distance from `p` to the ray through `w`.
fn perpendicular_distance(p: &[f64], w: &[f64]) -> f64 {
    let ww: f64 = w.iter().map(|x| x * x).sum();
    if ww == 0.0 {
        return p.iter().map(|x| x * x).sum::<f64>().sqrt();
    }
    let t = p.iter().zip(w).map(|(a, b)| a * b).sum::<f64>() / ww;
    p.iter()
        .zip(w)
        .map(|(a, b)| (a - t * b) * (a - t * b))
        .sum::<f64>()
        .sqrt()
}

impl Configurable for ReferencePointNiching {
    fn properties(&self) -> Vec<PropertyDescriptor> {
        PROPERTIES.to_vec()
    }

    fn property(&self, key: &str) -> Result<PropertyValue> {
        match key {
            "target_size" => Ok(self.target_size.into()),
            "divisions" => Ok(self.divisions.unwrap_or(0).into()),
            _ => Err(unknown_property(key)),
        }
    }

    fn set_property(&mut self, key: &str, value: PropertyValue) -> Result<()> {
        match key {
            "target_size" => self.target_size = value.into_usize(key)?,
            "divisions" => {
                let h = value.into_usize(key)?;
                self.divisions = (h > 0).then_some(h);
            }
            _ => return Err(unknown_property(key)),
        }
        Ok(())
    }
}

impl Operator for ReferencePointNiching {
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

    fn attach(&mut self, problem: &Problem) -> Result<()> {
        let m = problem.objective_dim();
        if self.target_size == 0 {
            return Err(MoeaError::configuration("niching target size must be positive"));
        }
        self.reference_points = match self.divisions {
            Some(h) => simplex_lattice(m, h),
            None => lattice_for_size(m, self.target_size).1,
        };
        Ok(())
    }

    fn evaluate_node(&mut self, ctx: &mut NodeContext<'_>) -> Result<()> {
        let ids = collect(ctx, &Tag::RANKED);
        let fronts = fronts_by_rank(ctx.store, &ids);

        let mut selected: Vec<SolutionId> = Vec::new();
        let mut last: Option<Vec<SolutionId>> = None;
        let mut rest: Vec<SolutionId> = Vec::new();
        for front in fronts {
            if last.is_some() {
                rest.extend(front);
            } else if selected.len() + front.len() <= self.target_size {
                selected.extend(front);
            } else {
                last = Some(front);
            }
        }

        for &id in &selected {
            ctx.store.get_mut(id).fitness.diversity = Some(f64::INFINITY);
        }
        for &id in &rest {
            ctx.store.get_mut(id).fitness.diversity = Some(0.0);
        }

        if let Some(last) = last {
            let k = self.target_size - selected.len();
            let admitted = self.admit(ctx, &selected, &last, k)?;
            for &id in &last {
                ctx.store.get_mut(id).fitness.diversity = Some(0.0);
            }
            for (order, id) in admitted.into_iter().enumerate() {
                ctx.store.get_mut(id).fitness.diversity = Some((k - order) as f64);
            }
        }

        ctx.publish(SolutionSet::from_ids(self.name.clone(), ids).with_tag(Tag::FITNESS));
        Ok(())
    }
}

impl ReferencePointNiching {
    /// Picks `k` members of `last` in admission order.
    fn admit(
        &self,
        ctx: &mut NodeContext<'_>,
        selected: &[SolutionId],
        last: &[SolutionId],
        k: usize,
    ) -> Result<Vec<SolutionId>> {
        let candidates: Vec<SolutionId> = selected.iter().chain(last).copied().collect();
        let objectives = evaluated(ctx.store, &candidates)?;
        let (Some(ideal), Some(nadir)) = (ideal_point(&objectives), nadir_point(&objectives)) else {
            return Ok(Vec::new());
        };

        // association: (reference index, distance) per candidate
        let association: Vec<(usize, f64)> = objectives
            .iter()
            .map(|p| {
                let normalised: Vec<f64> = p
                    .iter()
                    .zip(ideal.iter().zip(&nadir))
                    .map(|(&v, (&lo, &hi))| if hi > lo { (v - lo) / (hi - lo) } else { 0.0 })
                    .collect();
                self.reference_points
                    .iter()
                    .enumerate()
                    .map(|(j, w)| (j, perpendicular_distance(&normalised, w)))
                    .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
                    .unwrap_or((0, 0.0))
            })
            .collect();

        let mut niche = vec![0usize; self.reference_points.len()];
        for &(j, _) in &association[..selected.len()] {
            niche[j] += 1;
        }

        let offset = selected.len();
        let mut pending: BTreeSet<usize> = (0..last.len()).collect();
        let mut excluded = vec![false; self.reference_points.len()];
        let mut admitted = Vec::with_capacity(k);

        while admitted.len() < k && !pending.is_empty() {
            let Some(min) = niche
                .iter()
                .enumerate()
                .filter(|&(j, _)| !excluded[j])
                .map(|(_, &c)| c)
                .min()
            else {
                break;
            };
            let lightest: Vec<usize> = (0..niche.len())
                .filter(|&j| !excluded[j] && niche[j] == min)
                .collect();
            let j = lightest[ctx.rng.random_range(0..lightest.len())];

            let members: Vec<usize> = pending
                .iter()
                .copied()
                .filter(|&i| association[offset + i].0 == j)
                .collect();
            if members.is_empty() {
                excluded[j] = true;
                continue;
            }

            let pick = if niche[j] == 0 {
                members
                    .iter()
                    .copied()
                    .min_by(|&a, &b| {
                        association[offset + a]
                            .1
                            .total_cmp(&association[offset + b].1)
                            .then(last[a].cmp(&last[b]))
                    })
                    .unwrap_or(members[0])
            } else {
                members[ctx.rng.random_range(0..members.len())]
            };

            pending.remove(&pick);
            niche[j] += 1;
            admitted.push(last[pick]);
        }
        Ok(admitted)
    }
}

// ============================================================================
// Tests
// ============================================================================
