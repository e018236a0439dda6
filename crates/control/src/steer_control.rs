//! Full-state steer feedback around the open-loop bicycle.
//!
//! The steer torque is `T_delta = -(kphi*phi + kdelta*delta + kphidot*phi' + kdeltadot*delta')`
//! and no roll torque is applied, so `K` is 2x4 with a zero first row and the
//! closed loop is `x' = (A - B*K) x`.

use log::debug;
use mechanics::{CanonicalModel, Meijaard2007Model, Meijaard2007ParameterSet, ab_matrix};
use nalgebra::Matrix2x4;
use simcore::{Broadcast, EigenSweep, ParameterOverrides, Result, StateSpaceMatrices};

/// Gains in the column order of `K`'s second row.
pub const GAIN_NAMES: [&str; 4] = ["kphi", "kdelta", "kphidot", "kdeltadot"];

pub fn is_gain_name(name: &str) -> bool {
    GAIN_NAMES.contains(&name)
}

/// Builds `K` from the gain overrides; names outside [`GAIN_NAMES`] are ignored.
///
/// Missing gains are zero. If any gain is a series, every point starts from
/// the scalar gains and takes the i-th value of each series gain.
pub fn gain_matrix(overrides: &ParameterOverrides) -> Result<Broadcast<Matrix2x4<f64>>> {
    let (gains, _) = overrides.partition(is_gain_name);
    let array_len = gains.array_len()?;

    let mut base = Matrix2x4::zeros();
    for (col, name) in GAIN_NAMES.iter().enumerate() {
        if let Some(value) = gains.get(name).and_then(|v| v.as_scalar()) {
            base[(1, col)] = value;
        }
    }

    let Some(n) = array_len else {
        return Ok(Broadcast::Shared(base));
    };

    let per_point = (0..n)
        .map(|i| {
            let mut k = base;
            for (col, name) in GAIN_NAMES.iter().enumerate() {
                if let Some(value) = gains.get(name).filter(|v| v.is_series()) {
                    k[(1, col)] = value.at(i);
                }
            }
            k
        })
        .collect();
    Ok(Broadcast::PerPoint(per_point))
}

/// A linear bicycle model with steer feedback.
///
/// Accepts every parameter of the wrapped model plus the four gains.
#[derive(Debug, Clone)]
pub struct SteerControlModel<M: CanonicalModel = Meijaard2007Model> {
    model: M,
}

impl SteerControlModel<Meijaard2007Model> {
    pub fn from_parameter_set(parameter_set: Meijaard2007ParameterSet) -> Self {
        Self::new(Meijaard2007Model::new(parameter_set))
    }
}

impl<M: CanonicalModel> SteerControlModel<M> {
    pub fn new(model: M) -> Self {
        SteerControlModel { model }
    }

    /// The open-loop model.
    pub fn model(&self) -> &M {
        &self.model
    }

    /// Closed-loop `(A - B*K, B)`.
    ///
    /// All-scalar overrides give a single pair. Any series gives a batch of
    /// N pairs, each point taking the i-th value of every series and the
    /// shared value of everything else. Series lengths are checked before
    /// any matrix is formed.
    pub fn form_state_space_matrices(
        &self,
        overrides: &ParameterOverrides,
    ) -> Result<StateSpaceMatrices> {
        let array_len = overrides.array_len()?;
        let (gains, physical) = overrides.partition(is_gain_name);

        let canonical = self.model.form_reduced_canonical_matrices(&physical)?;
        let k = gain_matrix(&gains)?;
        let v = self.model.resolve("v", &physical)?;
        let g = self.model.resolve("g", &physical)?;

        match array_len {
            None => {
                let (a, b) = ab_matrix(canonical.at(0), v.at(0), g.at(0))?;
                Ok(StateSpaceMatrices::Single {
                    a: a - b * k.at(0),
                    b,
                })
            }
            Some(n) => {
                debug!(
                    "closing the loop at {n} points (series: {:?}, per-point canonical matrices: {})",
                    overrides.series_names(),
                    !canonical.is_shared()
                );
                let points = (0..n)
                    .map(|i| {
                        let (a, b) = ab_matrix(canonical.at(i), v.at(i), g.at(i))?;
                        Ok((a - b * k.at(i), b))
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(StateSpaceMatrices::from_points(&points))
            }
        }
    }

    /// Eigenvalues and eigenvectors of the closed-loop state matrix at every point.
    pub fn calc_eigen(&self, overrides: &ParameterOverrides) -> Result<EigenSweep> {
        let matrices = self.form_state_space_matrices(overrides)?;
        let a: Vec<_> = matrices.points().map(|(a, _)| a).collect();
        Ok(EigenSweep::from_matrices(&a))
    }

    /// Like [`calc_eigen`](Self::calc_eigen) with modes sorted for continuity.
    pub fn sorted_eigen(&self, overrides: &ParameterOverrides) -> Result<EigenSweep> {
        Ok(self.calc_eigen(overrides)?.sorted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stability::stable_ranges;
    use approx::assert_relative_eq;
    use mechanics::CanonicalMatrices;
    use simcore::{ConfigurationError, SimError};

    fn model() -> SteerControlModel {
        SteerControlModel::from_parameter_set(Meijaard2007ParameterSet::benchmark())
    }

    fn speeds(n: usize) -> Vec<f64> {
        (0..n).map(|i| 10.0 * i as f64 / (n - 1) as f64).collect()
    }

    #[test]
    fn test_scalar_overrides_give_single_pair() {
        let overrides = ParameterOverrides::new()
            .with_scalar("v", 3.0)
            .with_scalar("kphidot", -2.0);
        let ss = model().form_state_space_matrices(&overrides).unwrap();
        assert!(!ss.is_batch());
        assert_eq!(ss.a_shape(), vec![4, 4]);
        assert_eq!(ss.b_shape(), vec![4, 2]);
    }

    #[test]
    fn test_series_overrides_give_batch() {
        let n = 10;
        let overrides = ParameterOverrides::new()
            .with_series("v", speeds(n))
            .with_series("kphidot", vec![-1.0; n]);
        let ss = model().form_state_space_matrices(&overrides).unwrap();
        assert!(ss.is_batch());
        assert_eq!(ss.a_shape(), vec![n, 4, 4]);
        assert_eq!(ss.b_shape(), vec![n, 4, 2]);
    }

    #[test]
    fn test_length_one_series_is_a_batch() {
        let overrides = ParameterOverrides::new().with_series("v", vec![5.0]);
        let ss = model().form_state_space_matrices(&overrides).unwrap();
        assert_eq!(ss.a_shape(), vec![1, 4, 4]);
    }

    #[test]
    fn test_zero_gains_match_open_loop() {
        let overrides = ParameterOverrides::new().with_scalar("v", 4.0);
        let open = model()
            .model()
            .form_state_space_matrices(&overrides)
            .unwrap();
        let closed = model()
            .form_state_space_matrices(
                &overrides
                    .clone()
                    .with_scalar("kphi", 0.0)
                    .with_scalar("kdelta", 0.0)
                    .with_scalar("kphidot", 0.0)
                    .with_scalar("kdeltadot", 0.0),
            )
            .unwrap();
        assert_eq!(open, closed);
    }

    #[test]
    fn test_gain_series_matches_single_points() {
        let v = speeds(5);
        let kphidot = vec![0.0, -1.0, -2.5, -4.0, 3.0];
        let overrides = ParameterOverrides::new()
            .with_series("v", v.clone())
            .with_scalar("kdelta", 0.5)
            .with_series("kphidot", kphidot.clone());
        let batch = model().form_state_space_matrices(&overrides).unwrap();

        for i in 0..v.len() {
            let single = model()
                .form_state_space_matrices(
                    &ParameterOverrides::new()
                        .with_scalar("v", v[i])
                        .with_scalar("kdelta", 0.5)
                        .with_scalar("kphidot", kphidot[i]),
                )
                .unwrap();
            let (a_i, b_i) = batch.point(i);
            let (a, b) = single.point(0);
            assert_relative_eq!(a_i, a, epsilon = 1e-12);
            assert_relative_eq!(b_i, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_feedback_only_changes_dynamic_rows() {
        let open = model()
            .form_state_space_matrices(&ParameterOverrides::new().with_scalar("v", 2.0))
            .unwrap();
        let closed = model()
            .form_state_space_matrices(
                &ParameterOverrides::new()
                    .with_scalar("v", 2.0)
                    .with_scalar("kphidot", -10.0),
            )
            .unwrap();
        let (a_open, b) = open.point(0);
        let (a_closed, _) = closed.point(0);

        let diff = a_closed - a_open;
        assert_eq!(diff.fixed_rows::<2>(0).into_owned(), Matrix2x4::zeros());
        // only the roll rate column is touched, by -B[:, 1] * kphidot
        for r in 2..4 {
            assert_relative_eq!(diff[(r, 2)], 10.0 * b[(r, 1)], epsilon = 1e-12);
            assert_relative_eq!(diff[(r, 0)], 0.0);
            assert_relative_eq!(diff[(r, 1)], 0.0);
            assert_relative_eq!(diff[(r, 3)], 0.0);
        }
    }

    #[test]
    fn test_gain_series_with_scalar_speed() {
        let kphidot = vec![0.0, -2.0, -5.0, 1.5];
        let gains = ParameterOverrides::new()
            .with_scalar("kphi", 0.3)
            .with_series("kphidot", kphidot.clone());
        let overrides = gains.clone().with_scalar("v", 2.5).with_scalar("g", 9.81);
        let batch = model().form_state_space_matrices(&overrides).unwrap();
        assert_eq!(batch.a_shape(), vec![kphidot.len(), 4, 4]);

        let parameters = Meijaard2007ParameterSet::benchmark();
        let canonical = CanonicalMatrices::from_parameters(parameters.parameters()).unwrap();
        let (a_open, b_open) = ab_matrix(&canonical, 2.5, 9.81).unwrap();
        let k = gain_matrix(&gains).unwrap();
        for i in 0..kphidot.len() {
            let (a_i, b_i) = batch.point(i);
            assert_relative_eq!(a_i, a_open - b_open * k.at(i), epsilon = 1e-12);
            assert_relative_eq!(b_i, b_open, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_structural_and_gain_series_match_single_points() {
        let m_b = vec![60.0, 85.0, 110.0];
        let kphidot = vec![-1.0, -4.0, -8.0];
        let batch = model()
            .form_state_space_matrices(
                &ParameterOverrides::new()
                    .with_scalar("v", 4.0)
                    .with_series("mB", m_b.clone())
                    .with_series("kphidot", kphidot.clone()),
            )
            .unwrap();

        for i in 0..m_b.len() {
            let single = model()
                .form_state_space_matrices(
                    &ParameterOverrides::new()
                        .with_scalar("v", 4.0)
                        .with_scalar("mB", m_b[i])
                        .with_scalar("kphidot", kphidot[i]),
                )
                .unwrap();
            let (a_i, b_i) = batch.point(i);
            let (a, b) = single.point(0);
            assert_relative_eq!(a_i, a, epsilon = 1e-12);
            assert_relative_eq!(b_i, b, epsilon = 1e-12);
        }
        // the rider mass changes B, not just the feedback term
        assert!((batch.point(0).1 - batch.point(2).1).norm() > 1e-6);
    }

    #[test]
    fn test_nan_gain_point_is_not_stable() {
        let overrides = ParameterOverrides::new()
            .with_scalar("v", 5.0)
            .with_series("kphidot", vec![0.0, f64::NAN, 0.0]);
        let sweep = model().sorted_eigen(&overrides).unwrap();
        assert!(sweep.eigenvalues.row(1).iter().all(|z| z.re.is_nan()));
        assert_eq!(stable_ranges(sweep.eigenvalues.view()), vec![(0, 0), (2, 2)]);
    }

    #[test]
    fn test_overflowing_speed_is_not_stable() {
        let overrides = ParameterOverrides::new().with_series("v", vec![5.0, 1e200]);
        let sweep = model().calc_eigen(&overrides).unwrap();
        assert_eq!(stable_ranges(sweep.eigenvalues.view()), vec![(0, 0)]);
    }

    #[test]
    fn test_mismatched_series_rejected_before_math() {
        let overrides = ParameterOverrides::new()
            .with_series("v", speeds(10))
            .with_series("kphidot", vec![-1.0; 3]);
        let err = model().form_state_space_matrices(&overrides).unwrap_err();
        assert!(matches!(
            err,
            SimError::Configuration(ConfigurationError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let overrides = ParameterOverrides::new().with_scalar("kpsi", 1.0);
        let err = model().form_state_space_matrices(&overrides).unwrap_err();
        assert_eq!(
            err,
            SimError::Configuration(ConfigurationError::UnknownParameter("kpsi".into()))
        );
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let overrides = ParameterOverrides::new()
            .with_series("v", speeds(7))
            .with_series("kphidot", vec![-3.0; 7]);
        let first = model().form_state_space_matrices(&overrides).unwrap();
        let second = model().form_state_space_matrices(&overrides).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_gain_matrix_layout() {
        let overrides = ParameterOverrides::new()
            .with_scalar("kphi", 1.0)
            .with_scalar("kdeltadot", 4.0)
            .with_series("kdelta", vec![2.0, 3.0])
            .with_scalar("v", 5.0);
        let k = gain_matrix(&overrides).unwrap();
        assert_eq!(k.len(), Some(2));
        assert_eq!(*k.at(1), Matrix2x4::new(0.0, 0.0, 0.0, 0.0, 1.0, 3.0, 0.0, 4.0));
    }

    #[test]
    fn test_roll_rate_feedback_stabilizes_low_speed_weave() {
        let sweep = model()
            .calc_eigen(
                &ParameterOverrides::new()
                    .with_scalar("v", 3.0)
                    .with_scalar("kphidot", -10.0),
            )
            .unwrap();
        assert!(sweep.eigenvalues.iter().all(|z| z.re < 0.0));

        let open = model()
            .calc_eigen(&ParameterOverrides::new().with_scalar("v", 3.0))
            .unwrap();
        assert!(open.eigenvalues.iter().any(|z| z.re > 0.0));
    }
}
