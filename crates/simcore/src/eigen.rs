//! Eigen-decomposition of 4x4 state matrices and mode sorting across sweeps.

use nalgebra::{Complex, Matrix4, Schur, Vector4};
use ndarray::{Array2, Array3};

/// Iteration cap of the Schur and SVD solvers; nalgebra's default is unbounded.
const MAX_ITERATIONS: usize = 10_000;

const UNKNOWN: Complex<f64> = Complex::new(f64::NAN, f64::NAN);

/// Eigenvalues of a real 4x4 matrix from its real Schur form.
///
/// A matrix with a NaN or infinite entry, or one the solver cannot reduce,
/// has all-NaN eigenvalues.
pub fn eigenvalues(a: &Matrix4<f64>) -> [Complex<f64>; 4] {
    if a.iter().any(|x| !x.is_finite()) {
        return [UNKNOWN; 4];
    }
    match Schur::try_new(*a, f64::EPSILON, MAX_ITERATIONS) {
        Some(schur) => {
            let values = schur.complex_eigenvalues();
            [values[0], values[1], values[2], values[3]]
        }
        None => [UNKNOWN; 4],
    }
}

/// Unit eigenvector of `a` for eigenvalue `lambda`.
///
/// Taken as the right singular vector of `a - lambda*I` with the smallest
/// singular value, so a slightly inexact `lambda` still gives a usable vector.
/// NaN when `lambda` is not finite.
pub fn eigenvector(a: &Matrix4<f64>, lambda: Complex<f64>) -> Vector4<Complex<f64>> {
    if !(lambda.re.is_finite() && lambda.im.is_finite()) {
        return Vector4::repeat(UNKNOWN);
    }
    let shifted = a.map(|x| Complex::new(x, 0.0)) - Matrix4::from_diagonal_element(lambda);
    let Some(svd) = shifted.try_svd(false, true, f64::EPSILON, MAX_ITERATIONS) else {
        return Vector4::repeat(UNKNOWN);
    };
    let Some(v_t) = svd.v_t else {
        return Vector4::repeat(UNKNOWN);
    };
    let idx = svd.singular_values.imin();
    v_t.row(idx).adjoint().normalize()
}

/// Eigenvalues and matching eigenvectors (as columns) of `a`.
pub fn eigen(a: &Matrix4<f64>) -> ([Complex<f64>; 4], Matrix4<Complex<f64>>) {
    let values = eigenvalues(a);
    let vectors = values.map(|lambda| eigenvector(a, lambda));
    (values, Matrix4::from_columns(&vectors))
}

/// Eigenvalues (N x 4) and eigenvectors (N x 4 x 4) over N evaluation points.
///
/// `eigenvectors[[i, .., j]]` is the eigenvector of `eigenvalues[[i, j]]`.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenSweep {
    pub eigenvalues: Array2<Complex<f64>>,
    pub eigenvectors: Array3<Complex<f64>>,
}

impl EigenSweep {
    pub fn from_matrices<'a, I>(matrices: I) -> Self
    where
        I: IntoIterator<Item = &'a Matrix4<f64>>,
    {
        let decomposed: Vec<_> = matrices.into_iter().map(eigen).collect();
        let n = decomposed.len();
        let mut eigenvalues = Array2::zeros((n, 4));
        let mut eigenvectors = Array3::zeros((n, 4, 4));
        for (i, (values, vectors)) in decomposed.iter().enumerate() {
            for j in 0..4 {
                eigenvalues[[i, j]] = values[j];
                for r in 0..4 {
                    eigenvectors[[i, r, j]] = vectors[(r, j)];
                }
            }
        }
        Self {
            eigenvalues,
            eigenvectors,
        }
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Continuity-sorted copy, see [`sort_eigenmodes`].
    pub fn sorted(&self) -> Self {
        let (eigenvalues, eigenvectors) = sort_eigenmodes(&self.eigenvalues, &self.eigenvectors);
        Self {
            eigenvalues,
            eigenvectors,
        }
    }

    /// Real parts of mode `j` across the sweep.
    pub fn real_parts(&self, mode: usize) -> Vec<f64> {
        self.eigenvalues.column(mode).iter().map(|z| z.re).collect()
    }

    /// Imaginary parts of mode `j` across the sweep.
    pub fn imaginary_parts(&self, mode: usize) -> Vec<f64> {
        self.eigenvalues.column(mode).iter().map(|z| z.im).collect()
    }
}

fn permutations() -> Vec<[usize; 4]> {
    let mut perms = Vec::with_capacity(24);
    for a in 0..4 {
        for b in (0..4).filter(|&b| b != a) {
            for c in (0..4).filter(|&c| c != a && c != b) {
                let d = 6 - a - b - c;
                perms.push([a, b, c, d]);
            }
        }
    }
    perms
}

/// Reorders the modes at every point so mode `j` stays the same physical mode
/// across the sweep.
///
/// Point 0 keeps the solver order. Each later point takes the permutation
/// with the smallest summed eigenvalue distance to the most recent sorted
/// point with finite eigenvalues; ties and NaN points keep the solver order.
pub fn sort_eigenmodes(
    eigenvalues: &Array2<Complex<f64>>,
    eigenvectors: &Array3<Complex<f64>>,
) -> (Array2<Complex<f64>>, Array3<Complex<f64>>) {
    let mut sorted_values = eigenvalues.clone();
    let mut sorted_vectors = eigenvectors.clone();
    let perms = permutations();
    let is_finite = |z: &Complex<f64>| z.re.is_finite() && z.im.is_finite();

    let mut reference = None;
    for i in 0..eigenvalues.nrows() {
        let Some(prev) = reference else {
            if eigenvalues.row(i).iter().all(is_finite) {
                reference = Some(i);
            }
            continue;
        };
        let mut best = [0, 1, 2, 3];
        let mut best_cost = f64::INFINITY;
        for perm in &perms {
            let cost: f64 = (0..4)
                .map(|j| (sorted_values[[prev, j]] - eigenvalues[[i, perm[j]]]).norm())
                .sum();
            if cost < best_cost {
                best_cost = cost;
                best = *perm;
            }
        }
        for j in 0..4 {
            sorted_values[[i, j]] = eigenvalues[[i, best[j]]];
            for r in 0..4 {
                sorted_vectors[[i, r, j]] = eigenvectors[[i, r, best[j]]];
            }
        }
        if best_cost.is_finite() {
            reference = Some(i);
        }
    }

    (sorted_values, sorted_vectors)
}
