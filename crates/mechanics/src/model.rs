//! The open-loop benchmark bicycle model.

use log::debug;
use simcore::{
    Broadcast, ConfigurationError, EigenSweep, ParameterOverrides, ParameterValue, Result,
    StateSpaceMatrices,
};

use crate::canonical::{CanonicalMatrices, ab_matrix};
use crate::parameters::{Meijaard2007ParameterSet, is_parameter_name, is_structural};

/// A linear bicycle model that can form its canonical matrices under overrides.
///
/// Controllers are layered on top of an implementor by composition.
pub trait CanonicalModel {
    fn parameter_set(&self) -> &Meijaard2007ParameterSet;

    /// `M`, `C1`, `K0`, `K2` with `overrides` applied.
    ///
    /// One shared set unless a structural parameter is given as a series, in
    /// which case one set per point. Speed and gravity series never force a
    /// per-point result because they do not enter these matrices.
    fn form_reduced_canonical_matrices(
        &self,
        overrides: &ParameterOverrides,
    ) -> Result<Broadcast<CanonicalMatrices>>;

    /// Value of `name` from the overrides, else from the parameter set.
    fn resolve(&self, name: &str, overrides: &ParameterOverrides) -> Result<ParameterValue> {
        match overrides.get(name) {
            Some(value) => Ok(value.clone()),
            None => Ok(ParameterValue::Scalar(self.parameter_set().value(name)?)),
        }
    }
}

/// Whipple-Carvallo bicycle linearized about upright straight running.
///
/// States are [roll angle, steer angle, roll rate, steer rate], inputs are
/// [roll torque, steer torque].
#[derive(Debug, Clone)]
pub struct Meijaard2007Model {
    parameter_set: Meijaard2007ParameterSet,
}

impl Meijaard2007Model {
    pub fn new(parameter_set: Meijaard2007ParameterSet) -> Self {
        Meijaard2007Model { parameter_set }
    }

    /// Open-loop `A` and `B`, batched when any override is a series.
    pub fn form_state_space_matrices(
        &self,
        overrides: &ParameterOverrides,
    ) -> Result<StateSpaceMatrices> {
        let array_len = overrides.array_len()?;
        let canonical = self.form_reduced_canonical_matrices(overrides)?;
        let v = self.resolve("v", overrides)?;
        let g = self.resolve("g", overrides)?;

        match array_len {
            None => {
                let (a, b) = ab_matrix(canonical.at(0), v.at(0), g.at(0))?;
                Ok(StateSpaceMatrices::Single { a, b })
            }
            Some(n) => {
                let points = (0..n)
                    .map(|i| ab_matrix(canonical.at(i), v.at(i), g.at(i)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(StateSpaceMatrices::from_points(&points))
            }
        }
    }

    /// Eigenvalues and eigenvectors of the open-loop state matrix at every point.
    pub fn calc_eigen(&self, overrides: &ParameterOverrides) -> Result<EigenSweep> {
        let matrices = self.form_state_space_matrices(overrides)?;
        let a: Vec<_> = matrices.points().map(|(a, _)| a).collect();
        Ok(EigenSweep::from_matrices(&a))
    }
}

impl CanonicalModel for Meijaard2007Model {
    fn parameter_set(&self) -> &Meijaard2007ParameterSet {
        &self.parameter_set
    }

    fn form_reduced_canonical_matrices(
        &self,
        overrides: &ParameterOverrides,
    ) -> Result<Broadcast<CanonicalMatrices>> {
        let array_len = overrides.array_len()?;
        if let Some(unknown) = overrides.names().find(|name| !is_parameter_name(name)) {
            return Err(ConfigurationError::UnknownParameter(unknown.to_string()).into());
        }

        let base = self.parameter_set.to_parameter_map();
        let at_point = |i: usize| {
            let mut par = base.clone();
            for (name, value) in overrides.iter() {
                par.insert(name.to_string(), value.at(i));
            }
            CanonicalMatrices::from_parameters(&par)
        };

        let structural_series = overrides
            .iter()
            .any(|(name, value)| is_structural(name) && value.is_series());

        match array_len {
            Some(n) if structural_series => {
                debug!("forming canonical matrices at {n} points");
                let per_point = (0..n)
                    .map(at_point)
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(Broadcast::PerPoint(per_point))
            }
            _ => Ok(Broadcast::Shared(at_point(0)?)),
        }
    }
}
