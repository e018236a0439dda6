//! Stable intervals of an eigenvalue sweep.

use ndarray::ArrayView2;
use simcore::Complex;

/// True when every eigenvalue has a strictly negative real part.
///
/// NaN compares false, so a row containing NaN is not stable.
fn is_stable<'a>(row: impl IntoIterator<Item = &'a Complex<f64>>) -> bool {
    row.into_iter().all(|z| z.re < 0.0)
}

/// Closed index ranges `(first, last)` of every maximal run of stable rows
/// of an N x 4 eigenvalue array, in ascending order.
pub fn stable_ranges(eigenvalues: ArrayView2<Complex<f64>>) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, row) in eigenvalues.rows().into_iter().enumerate() {
        match (is_stable(row), start) {
            (true, None) => start = Some(i),
            (false, Some(first)) => {
                ranges.push((first, i - 1));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(first) = start {
        ranges.push((first, eigenvalues.nrows() - 1));
    }
    ranges
}

/// Maps index ranges onto the sweep variable.
///
/// Ranges reaching past the end of `speeds` are dropped.
pub fn speed_bounds(speeds: &[f64], ranges: &[(usize, usize)]) -> Vec<(f64, f64)> {
    ranges
        .iter()
        .filter_map(|&(first, last)| Some((*speeds.get(first)?, *speeds.get(last)?)))
        .collect()
}

/// Weave and capsize speeds: the bounds of the first stable speed range.
///
/// `None` if the bicycle is never stable over `speeds`, or if `speeds` and
/// the eigenvalue rows differ in length.
pub fn weave_capsize_speeds(
    speeds: &[f64],
    eigenvalues: ArrayView2<Complex<f64>>,
) -> Option<(f64, f64)> {
    if speeds.len() != eigenvalues.nrows() {
        return None;
    }
    speed_bounds(speeds, &stable_ranges(eigenvalues)).first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn from_real_parts(rows: &[[f64; 4]]) -> Array2<Complex<f64>> {
        Array2::from_shape_fn((rows.len(), 4), |(i, j)| Complex::new(rows[i][j], 1.0))
    }

    fn with_stable_rows(n: usize, stable: &[usize]) -> Array2<Complex<f64>> {
        let rows: Vec<[f64; 4]> = (0..n)
            .map(|i| {
                if stable.contains(&i) {
                    [-1.0, -2.0, -0.5, -3.0]
                } else {
                    [-1.0, 0.2, -0.5, -3.0]
                }
            })
            .collect();
        from_real_parts(&rows)
    }

    #[test]
    fn test_all_stable() {
        let evals = with_stable_rows(6, &[0, 1, 2, 3, 4, 5]);
        assert_eq!(stable_ranges(evals.view()), vec![(0, 5)]);
    }

    #[test]
    fn test_never_stable() {
        let evals = with_stable_rows(6, &[]);
        assert!(stable_ranges(evals.view()).is_empty());
        assert_eq!(weave_capsize_speeds(&[0.0; 6], evals.view()), None);
    }

    #[test]
    fn test_two_bands() {
        let evals = with_stable_rows(10, &[2, 3, 4, 7, 8]);
        assert_eq!(stable_ranges(evals.view()), vec![(2, 4), (7, 8)]);
    }

    #[test]
    fn test_single_point_runs_at_edges() {
        let evals = with_stable_rows(5, &[0, 4]);
        assert_eq!(stable_ranges(evals.view()), vec![(0, 0), (4, 4)]);
    }

    #[test]
    fn test_zero_and_nan_are_not_stable() {
        let evals = from_real_parts(&[
            [-1.0, -1.0, -1.0, 0.0],
            [-1.0, -1.0, -1.0, f64::NAN],
            [-1.0, -1.0, -1.0, -1e-12],
        ]);
        assert_eq!(stable_ranges(evals.view()), vec![(2, 2)]);
    }

    #[test]
    fn test_empty_sweep() {
        let evals = Array2::<Complex<f64>>::zeros((0, 4));
        assert!(stable_ranges(evals.view()).is_empty());
    }

    #[test]
    fn test_speed_bounds_and_weave_capsize() {
        let speeds: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let evals = with_stable_rows(10, &[2, 3, 4, 7, 8]);
        let ranges = stable_ranges(evals.view());
        assert_eq!(speed_bounds(&speeds, &ranges), vec![(1.0, 2.0), (3.5, 4.0)]);
        assert_eq!(weave_capsize_speeds(&speeds, evals.view()), Some((1.0, 2.0)));
    }

    #[test]
    fn test_short_speed_list_does_not_panic() {
        let speeds = [0.0, 0.5, 1.0, 1.5, 2.0];
        let evals = with_stable_rows(10, &[2, 3, 4, 7, 8]);
        let ranges = stable_ranges(evals.view());
        assert_eq!(speed_bounds(&speeds, &ranges), vec![(1.0, 2.0)]);
        assert_eq!(weave_capsize_speeds(&speeds, evals.view()), None);
    }
}
