//! Hypervolume indicator.
//!
//! Two objectives use an O(n log n) sweep; three or more use dimension
//! slicing (HSO): sort by the last objective, and sum the (d-1)-dimensional
//! volume of every slab between consecutive values.

use crate::error::{MoeaError, Result};
use crate::representation::nadir_point;

/// Lebesgue measure of the region dominated by `points` and bounded by
/// `reference` (minimization).
///
/// - `reference` defaults to the nadir of `points`.
/// - Zero points give 0; one point gives the volume of its box.
/// - Points on the reference boundary contribute nothing.
///
/// # Errors
///
/// - [`MoeaError::Dimensionality`] when vectors disagree in length.
/// - [`MoeaError::InvalidReference`] when some point exceeds the reference
///   in any objective; no partial value is returned.
///
/// # Example
///
/// ```
/// use u_moea::indicators::hypervolume;
///
/// let hv = hypervolume(&[vec![1.0, 2.0], vec![2.0, 1.0]], Some(&[3.0, 3.0])).unwrap();
/// assert!((hv - 3.0).abs() < 1e-12);
///
/// assert!(hypervolume(&[vec![4.0, 1.0]], Some(&[3.0, 3.0])).is_err());
/// ```
pub fn hypervolume(points: &[Vec<f64>], reference: Option<&[f64]>) -> Result<f64> {
    let Some(first) = points.first() else {
        return Ok(0.0);
    };
    let dim = first.len();
    for p in points {
        MoeaError::check_len("hypervolume point", dim, p.len())?;
    }

    let reference: Vec<f64> = match reference {
        Some(r) => {
            MoeaError::check_len("hypervolume reference", dim, r.len())?;
            r.to_vec()
        }
        None => nadir_point(points).unwrap_or_default(),
    };

    if points
        .iter()
        .any(|p| p.iter().zip(&reference).any(|(v, r)| !(v <= r)))
    {
        return Err(MoeaError::InvalidReference { reference });
    }

    let inside: Vec<Vec<f64>> = points
        .iter()
        .filter(|p| p.iter().zip(&reference).all(|(v, r)| v < r))
        .cloned()
        .collect();
    if inside.is_empty() || dim == 0 {
        return Ok(0.0);
    }

    let mut front = non_dominated(inside);
    Ok(volume(&mut front, &reference))
}

/// Exclusive contribution of every point: the volume lost when it alone is
/// removed. Dominated and duplicated points contribute 0.
///
/// # Errors
///
/// Same conditions as [`hypervolume`]; the reference is required here so
/// that all contributions share one box.
pub fn hypervolume_contributions(points: &[Vec<f64>], reference: &[f64]) -> Result<Vec<f64>> {
    let total = hypervolume(points, Some(reference))?;
    let mut out = Vec::with_capacity(points.len());
    let mut rest: Vec<Vec<f64>> = Vec::with_capacity(points.len().saturating_sub(1));
    for i in 0..points.len() {
        rest.clear();
        rest.extend(
            points
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, p)| p.clone()),
        );
        let without = hypervolume(&rest, Some(reference))?;
        out.push((total - without).max(0.0));
    }
    Ok(out)
}

/// Removes dominated points and exact duplicates.
fn non_dominated(mut points: Vec<Vec<f64>>) -> Vec<Vec<f64>> {
    points.sort_by(|a, b| {
        a.iter()
            .zip(b)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    points.dedup();

    let mut keep: Vec<Vec<f64>> = Vec::with_capacity(points.len());
    // Lexicographic order: no later point dominates an earlier one.
    for p in points {
        let dominated = keep
            .iter()
            .any(|k| k.iter().zip(&p).all(|(a, b)| a <= b));
        if !dominated {
            keep.push(p);
        }
    }
    keep
}

fn volume(points: &mut [Vec<f64>], reference: &[f64]) -> f64 {
    let d = reference.len();
    match d {
        1 => points
            .iter()
            .map(|p| reference[0] - p[0])
            .fold(0.0, f64::max),
        2 => volume_2d(points, reference),
        _ => {
            let last = d - 1;
            points.sort_by(|a, b| a[last].total_cmp(&b[last]));
            let mut total = 0.0;
            let mut slab: Vec<Vec<f64>> = Vec::with_capacity(points.len());
            for i in 0..points.len() {
                slab.push(points[i][..last].to_vec());
                let upper = if i + 1 < points.len() {
                    points[i + 1][last]
                } else {
                    reference[last]
                };
                let depth = upper - points[i][last];
                if depth > 0.0 {
                    let mut front = non_dominated(slab.clone());
                    total += depth * volume(&mut front, &reference[..last]);
                }
            }
            total
        }
    }
}

fn volume_2d(points: &mut [Vec<f64>], reference: &[f64]) -> f64 {
    points.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));
    let mut area = 0.0;
    let mut best_y = reference[1];
    for (i, p) in points.iter().enumerate() {
        if p[1] >= best_y {
            continue;
        }
        let next_x = points[i + 1..]
            .iter()
            .find(|q| q[1] < p[1])
            .map_or(reference[0], |q| q[0]);
        area += (next_x - p[0]) * (reference[1] - p[1]);
        best_y = p[1];
    }
    area
}
