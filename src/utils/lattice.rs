//! Das–Dennis simplex-lattice reference points.
//!
//! # References
//!
//! - Das & Dennis (1998), "Normal-Boundary Intersection"
//! - Deb & Jain (2014), "An Evolutionary Many-Objective Optimization
//!   Algorithm Using Reference-Point-Based Nondominated Sorting Approach"

/// All points on the unit simplex in `m` dimensions whose coordinates are
/// multiples of `1/h`.
///
/// There are `C(h + m - 1, m - 1)` such points.
///
/// # Example
///
/// ```
/// use u_moea::utils::simplex_lattice;
///
/// let pts = simplex_lattice(3, 2);
/// assert_eq!(pts.len(), 6);
/// assert!(pts.iter().all(|p| (p.iter().sum::<f64>() - 1.0).abs() < 1e-12));
/// ```
pub fn simplex_lattice(m: usize, h: usize) -> Vec<Vec<f64>> {
    if m == 0 {
        return Vec::new();
    }
    if m == 1 || h == 0 {
        let mut p = vec![0.0; m];
        p[0] = 1.0;
        return vec![p];
    }
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(m);
    fill(m, h, h, &mut current, &mut out);
    out
}

fn fill(m: usize, h: usize, left: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<f64>>) {
    if current.len() == m - 1 {
        current.push(left);
        out.push(current.iter().map(|&k| k as f64 / h as f64).collect());
        current.pop();
        return;
    }
    for k in 0..=left {
        current.push(k);
        fill(m, h, left - k, current, out);
        current.pop();
    }
}

/// Number of lattice points for `m` objectives and `h` divisions.
pub fn lattice_size(m: usize, h: usize) -> usize {
    if m == 0 {
        return 0;
    }
    // C(h + m - 1, m - 1) computed incrementally to stay exact
    let k = m - 1;
    let mut c: usize = 1;
    for i in 1..=k {
        c = c * (h + i) / i;
    }
    c
}

/// Smallest lattice with at least `count` points; returns `(h, points)`.
pub fn lattice_for_size(m: usize, count: usize) -> (usize, Vec<Vec<f64>>) {
    if m <= 1 {
        return (1, simplex_lattice(m, 1));
    }
    let mut h = 1;
    while lattice_size(m, h) < count {
        h += 1;
    }
    (h, simplex_lattice(m, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes_match_formula() {
        for m in 1..5 {
            for h in 1..6 {
                assert_eq!(simplex_lattice(m, h).len(), lattice_size(m, h), "m={m} h={h}");
            }
        }
        assert_eq!(lattice_size(3, 12), 91);
    }

    #[test]
    fn test_two_objectives() {
        let pts = simplex_lattice(2, 4);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], vec![0.0, 1.0]);
        assert_eq!(pts[4], vec![1.0, 0.0]);
    }

    #[test]
    fn test_grown_until_large_enough() {
        let (h, pts) = lattice_for_size(3, 20);
        assert_eq!(h, 5);
        assert_eq!(pts.len(), 21);
    }
}
