//! Crowding distance.

/// Crowding distance assignment for diversity preservation.
///
/// Measures how isolated each solution of one front is in objective space.
/// Boundary solutions (min/max for any objective) receive `f64::INFINITY`.
///
/// # Algorithm (Deb et al., 2002)
///
/// For each objective:
/// 1. Sort solutions by objective value (ties by index)
/// 2. Assign infinity to the two boundary solutions
/// 3. For interior solutions, add the range-normalized gap between neighbors
///
/// # Complexity
///
/// O(m · n log n) for n solutions and m objectives.
///
/// # Example
///
/// ```
/// use u_moea::indicators::crowding_distance;
///
/// let objectives = vec![
///     vec![1.0, 5.0],
///     vec![3.0, 3.0],
///     vec![5.0, 1.0],
/// ];
///
/// let distances = crowding_distance(&objectives);
/// assert!(distances[0].is_infinite());
/// assert!(distances[2].is_infinite());
/// assert!((distances[1] - 2.0).abs() < 1e-12);
/// ```
pub fn crowding_distance(objectives: &[Vec<f64>]) -> Vec<f64> {
    let n = objectives.len();
    if n <= 2 {
        return vec![f64::INFINITY; n];
    }

    let m = objectives[0].len();
    let mut distances = vec![0.0f64; n];
    let mut indices: Vec<usize> = (0..n).collect();

    for obj in 0..m {
        indices.sort_by(|&a, &b| {
            objectives[a][obj]
                .total_cmp(&objectives[b][obj])
                .then(a.cmp(&b))
        });

        distances[indices[0]] = f64::INFINITY;
        distances[indices[n - 1]] = f64::INFINITY;

        let min_val = objectives[indices[0]][obj];
        let max_val = objectives[indices[n - 1]][obj];
        let range = max_val - min_val;

        if range > 0.0 {
            for w in indices.windows(3) {
                let prev = objectives[w[0]][obj];
                let next = objectives[w[2]][obj];
                distances[w[1]] += (next - prev) / range;
            }
        }
    }

    distances
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_fronts_are_all_boundary() {
        assert!(crowding_distance(&[]).is_empty());
        assert!(crowding_distance(&[vec![1.0, 2.0]])[0].is_infinite());
        let d = crowding_distance(&[vec![1.0, 3.0], vec![3.0, 1.0]]);
        assert!(d.iter().all(|x| x.is_infinite()));
    }

    #[test]
    fn test_evenly_spaced() {
        let objs: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64, 4.0 - i as f64]).collect();
        let dist = crowding_distance(&objs);

        assert!(dist[0].is_infinite());
        assert!(dist[4].is_infinite());
        for d in &dist[1..4] {
            assert!((d - 1.0).abs() < 1e-12, "expected 1.0, got {d}");
        }
    }

    #[test]
    fn test_zero_range_objective() {
        let objs = vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]];
        let dist = crowding_distance(&objs);
        assert!(dist[0].is_infinite());
        assert!(dist[2].is_infinite());
        assert!((dist[1] - 1.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn prop_order_invariant(
            xs in prop::collection::hash_set(0i32..1000, 3..20),
            seed in 0u64..1000,
        ) {
            // distinct coordinates on a descending line: a single front
            let objs: Vec<Vec<f64>> = xs
                .iter()
                .map(|&x| vec![x as f64, 1000.0 - x as f64 * 0.5])
                .collect();
            let base = crowding_distance(&objs);

            let mut order: Vec<usize> = (0..objs.len()).collect();
            let k = (seed as usize) % order.len();
            order.rotate_left(k);
            order.reverse();
            let permuted: Vec<Vec<f64>> = order.iter().map(|&i| objs[i].clone()).collect();
            let dist = crowding_distance(&permuted);

            for (pos, &i) in order.iter().enumerate() {
                let (a, b) = (base[i], dist[pos]);
                prop_assert!(
                    (a.is_infinite() && b.is_infinite()) || (a - b).abs() < 1e-9,
                    "distance of point {} changed: {} vs {}", i, a, b
                );
            }
        }
    }
}
