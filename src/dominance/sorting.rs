//! Dominance ranking.
//!
//! - [`non_dominated_sort`]: fast non-dominated sorting (Deb et al., 2002)
//!   under any [`DominanceRelation`]
//! - [`non_dominated_sort_by`]: the same over an arbitrary comparison, used
//!   for constraint-aware ranking
//! - [`dominance_count`]: number of members dominating each member (MOGA rank)
//! - [`compare_constrained`]: feasibility-first comparison

use super::{Dominance, DominanceRelation};
use crate::error::Result;

/// Result of non-dominated sorting.
///
/// Each element of `ranks` corresponds to the rank of the solution at the
/// same index. Rank 0 is the non-dominated front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NondominatedSortResult {
    /// Rank for each solution (0 = front).
    pub ranks: Vec<usize>,

    /// Indices grouped by front, ascending within each front.
    pub fronts: Vec<Vec<usize>>,
}

/// Fast non-dominated sorting under `relation`.
///
/// All objectives are **minimized**.
///
/// # Complexity
///
/// O(m · n²) comparisons for n solutions and m objectives.
///
/// # Errors
///
/// Fails with a dimensionality error when a vector does not match the
/// relation's dimension.
///
/// # Example
///
/// ```
/// use u_moea::dominance::{non_dominated_sort, ParetoDominance};
///
/// let objectives = vec![
///     vec![1.0, 5.0],  // A
///     vec![3.0, 3.0],  // B
///     vec![5.0, 1.0],  // C
///     vec![4.0, 4.0],  // D, dominated by B
/// ];
///
/// let result = non_dominated_sort(&objectives, &ParetoDominance::new(2)).unwrap();
/// assert_eq!(result.ranks, vec![0, 0, 0, 1]);
/// assert_eq!(result.fronts, vec![vec![0, 1, 2], vec![3]]);
/// ```
pub fn non_dominated_sort(
    objectives: &[Vec<f64>],
    relation: &dyn DominanceRelation,
) -> Result<NondominatedSortResult> {
    non_dominated_sort_by(objectives.len(), |i, j| {
        relation.is_better_than(&objectives[i], &objectives[j])
    })
}

/// Fast non-dominated sorting over `n` items compared by `compare(i, j)`.
///
/// `compare` must return `Better` when item `i` dominates item `j`. Members
/// caught in a dominance cycle (possible with non-transitive relations) are
/// collected into one final front.
pub fn non_dominated_sort_by<F>(n: usize, mut compare: F) -> Result<NondominatedSortResult>
where
    F: FnMut(usize, usize) -> Result<Dominance>,
{
    if n == 0 {
        return Ok(NondominatedSortResult {
            ranks: Vec::new(),
            fronts: Vec::new(),
        });
    }

    let mut domination_count = vec![0usize; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            match compare(i, j)? {
                Dominance::Better => {
                    dominated_by[i].push(j);
                    domination_count[j] += 1;
                }
                Dominance::Worse => {
                    dominated_by[j].push(i);
                    domination_count[i] += 1;
                }
                Dominance::Incomparable => {}
            }
        }
    }

    let mut ranks = vec![usize::MAX; n];
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut fronts = Vec::new();
    let mut assigned = 0;

    while !current.is_empty() {
        let mut next_front = Vec::new();
        for &i in &current {
            ranks[i] = fronts.len();
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next_front.push(j);
                }
            }
        }
        assigned += current.len();
        current.sort_unstable();
        fronts.push(current);
        current = next_front;
    }

    if assigned < n {
        let rest: Vec<usize> = (0..n).filter(|&i| ranks[i] == usize::MAX).collect();
        for &i in &rest {
            ranks[i] = fronts.len();
        }
        fronts.push(rest);
    }

    Ok(NondominatedSortResult { ranks, fronts })
}

/// For each solution, the number of other solutions that dominate it.
///
/// This is the Fonseca–Fleming rank used by MOGA: non-dominated solutions
/// get 0.
pub fn dominance_count(
    objectives: &[Vec<f64>],
    relation: &dyn DominanceRelation,
) -> Result<Vec<usize>> {
    let n = objectives.len();
    let mut counts = vec![0usize; n];
    for i in 0..n {
        for j in (i + 1)..n {
            match relation.is_better_than(&objectives[i], &objectives[j])? {
                Dominance::Better => counts[j] += 1,
                Dominance::Worse => counts[i] += 1,
                Dominance::Incomparable => {}
            }
        }
    }
    Ok(counts)
}

/// Feasibility-first comparison.
///
/// A feasible solution (violation 0) beats an infeasible one; two infeasible
/// solutions compare by total violation; two feasible ones by `relation`.
pub fn compare_constrained(
    relation: &dyn DominanceRelation,
    a: &[f64],
    violation_a: f64,
    b: &[f64],
    violation_b: f64,
) -> Result<Dominance> {
    match (violation_a <= 0.0, violation_b <= 0.0) {
        (true, true) => relation.is_better_than(a, b),
        (true, false) => Ok(Dominance::Better),
        (false, true) => Ok(Dominance::Worse),
        (false, false) => Ok(if violation_a < violation_b {
            Dominance::Better
        } else if violation_b < violation_a {
            Dominance::Worse
        } else {
            Dominance::Incomparable
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dominance::ParetoDominance;
    use crate::error::MoeaError;
    use proptest::prelude::*;

    fn sort(objs: &[Vec<f64>]) -> NondominatedSortResult {
        let dim = objs.first().map_or(2, Vec::len);
        non_dominated_sort(objs, &ParetoDominance::new(dim)).unwrap()
    }

    #[test]
    fn test_empty_and_single() {
        assert!(sort(&[]).fronts.is_empty());
        let result = sort(&[vec![1.0, 2.0]]);
        assert_eq!(result.ranks, vec![0]);
        assert_eq!(result.fronts, vec![vec![0]]);
    }

    #[test]
    fn test_chain_of_fronts() {
        let objs = vec![
            vec![3.0, 3.0],
            vec![1.0, 1.0],
            vec![2.0, 2.0],
        ];
        let result = sort(&objs);
        assert_eq!(result.ranks, vec![2, 0, 1]);
        assert_eq!(result.fronts, vec![vec![1], vec![2], vec![0]]);
    }

    #[test]
    fn test_mixed_fronts() {
        let objs = vec![
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3,3)
            vec![6.0, 6.0], // dominated by (4,4)
        ];
        let result = sort(&objs);
        assert_eq!(result.ranks, vec![0, 0, 0, 1, 2]);
    }

    #[test]
    fn test_all_equal_share_front() {
        let objs = vec![vec![2.0, 2.0]; 3];
        let result = sort(&objs);
        assert!(result.ranks.iter().all(|&r| r == 0));
    }

    #[test]
    fn test_dimension_mismatch_propagates() {
        let objs = vec![vec![1.0, 2.0], vec![1.0]];
        let err = non_dominated_sort(&objs, &ParetoDominance::new(2)).unwrap_err();
        assert!(matches!(err, MoeaError::Dimensionality { .. }));
    }

    #[test]
    fn test_cycle_collected_in_last_front() {
        // 0 beats 1, 1 beats 2, 2 beats 0
        let result = non_dominated_sort_by(3, |i, j| {
            Ok(match (i, j) {
                (0, 1) | (1, 2) => Dominance::Better,
                (0, 2) => Dominance::Worse,
                _ => Dominance::Incomparable,
            })
        })
        .unwrap();
        assert_eq!(result.fronts, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_dominance_count() {
        let objs = vec![
            vec![1.0, 1.0],
            vec![2.0, 2.0],
            vec![3.0, 3.0],
            vec![0.5, 4.0],
        ];
        let counts = dominance_count(&objs, &ParetoDominance::new(2)).unwrap();
        assert_eq!(counts, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_constrained_comparison() {
        let p = ParetoDominance::new(2);
        let good = [1.0, 1.0];
        let bad = [5.0, 5.0];
        assert_eq!(
            compare_constrained(&p, &bad, 0.0, &good, 0.3).unwrap(),
            Dominance::Better
        );
        assert_eq!(
            compare_constrained(&p, &good, 0.5, &bad, 0.3).unwrap(),
            Dominance::Worse
        );
        assert_eq!(
            compare_constrained(&p, &good, 0.0, &bad, 0.0).unwrap(),
            Dominance::Better
        );
    }

    proptest! {
        #[test]
        fn prop_fronts_partition(
            objs in prop::collection::vec(prop::collection::vec(0.0f64..10.0, 2), 1..30)
        ) {
            let result = sort(&objs);
            let pareto = ParetoDominance::new(2);

            let total: usize = result.fronts.iter().map(Vec::len).sum();
            prop_assert_eq!(total, objs.len());

            for (k, front) in result.fronts.iter().enumerate() {
                for &i in front {
                    prop_assert_eq!(result.ranks[i], k);
                    for &j in front {
                        prop_assert_ne!(
                            pareto.is_better_than(&objs[i], &objs[j]).unwrap(),
                            Dominance::Better
                        );
                    }
                    if k > 0 {
                        let dominated = result.fronts[k - 1].iter().any(|&p| {
                            pareto.is_better_than(&objs[p], &objs[i]).unwrap() == Dominance::Better
                        });
                        prop_assert!(dominated, "member {} of front {} has no dominator in front {}", i, k, k - 1);
                    }
                }
            }
        }
    }
}
