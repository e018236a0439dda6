//! State-space matrices for one or many evaluation points.

use nalgebra::{Matrix4, Matrix4x2};
use ndarray::Array3;

/// `x' = A x + B u` with x = [roll, steer, roll rate, steer rate] and
/// u = [roll torque, steer torque].
///
/// `Single` holds one 4x4 / 4x2 pair. `Batch` stacks N of them along the
/// leading axis (shapes N x 4 x 4 and N x 4 x 2). A and B always share the
/// same variant.
#[derive(Debug, Clone, PartialEq)]
pub enum StateSpaceMatrices {
    Single { a: Matrix4<f64>, b: Matrix4x2<f64> },
    Batch { a: Array3<f64>, b: Array3<f64> },
}

impl StateSpaceMatrices {
    /// Stacks per-point pairs into a batch.
    pub fn from_points(points: &[(Matrix4<f64>, Matrix4x2<f64>)]) -> Self {
        let n = points.len();
        let mut a = Array3::zeros((n, 4, 4));
        let mut b = Array3::zeros((n, 4, 2));
        for (i, (ai, bi)) in points.iter().enumerate() {
            for r in 0..4 {
                for c in 0..4 {
                    a[[i, r, c]] = ai[(r, c)];
                }
                for c in 0..2 {
                    b[[i, r, c]] = bi[(r, c)];
                }
            }
        }
        StateSpaceMatrices::Batch { a, b }
    }

    /// Number of evaluation points, 1 for `Single`.
    pub fn len(&self) -> usize {
        match self {
            StateSpaceMatrices::Single { .. } => 1,
            StateSpaceMatrices::Batch { a, .. } => a.shape()[0],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_batch(&self) -> bool {
        matches!(self, StateSpaceMatrices::Batch { .. })
    }

    pub fn a_shape(&self) -> Vec<usize> {
        match self {
            StateSpaceMatrices::Single { .. } => vec![4, 4],
            StateSpaceMatrices::Batch { a, .. } => a.shape().to_vec(),
        }
    }

    pub fn b_shape(&self) -> Vec<usize> {
        match self {
            StateSpaceMatrices::Single { .. } => vec![4, 2],
            StateSpaceMatrices::Batch { b, .. } => b.shape().to_vec(),
        }
    }

    /// The pair at point `i`. A `Single` pair applies to every point.
    pub fn point(&self, i: usize) -> (Matrix4<f64>, Matrix4x2<f64>) {
        match self {
            StateSpaceMatrices::Single { a, b } => (*a, *b),
            StateSpaceMatrices::Batch { a, b } => (
                Matrix4::from_fn(|r, c| a[[i, r, c]]),
                Matrix4x2::from_fn(|r, c| b[[i, r, c]]),
            ),
        }
    }

    pub fn points(&self) -> impl Iterator<Item = (Matrix4<f64>, Matrix4x2<f64>)> + '_ {
        (0..self.len()).map(move |i| self.point(i))
    }
}
