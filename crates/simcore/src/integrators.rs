use log::debug;
use nalgebra::Vector4;
use ode_solvers::dopri5::Dopri5;
use ode_solvers::rk4::Rk4;

use crate::error::{ConfigurationError, Result, SimError};

type OdeState = ode_solvers::Vector4<f64>;

/// Sampled solution of a four-state initial value problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    pub times: Vec<f64>,
    pub states: Vec<Vector4<f64>>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Values of state `k` over time.
    pub fn component(&self, k: usize) -> Vec<f64> {
        self.states.iter().map(|x| x[k]).collect()
    }
}

/// A generic integration strategy for `x' = f(t, x)`.
pub trait Integrator {
    /// Integrates from t = 0 to `duration`, sampling every `dt`.
    fn integrate<F>(&self, rhs: F, x0: Vector4<f64>, duration: f64, dt: f64) -> Result<Trajectory>
    where
        F: Fn(f64, &Vector4<f64>) -> Vector4<f64>;
}

/// Adapts a closure to the solver's system trait.
struct FirstOrder<F> {
    rhs: F,
}

impl<F> ode_solvers::System<f64, OdeState> for FirstOrder<F>
where
    F: Fn(f64, &Vector4<f64>) -> Vector4<f64>,
{
    fn system(&self, t: f64, y: &OdeState, dy: &mut OdeState) {
        let x = Vector4::from_column_slice(y.as_slice());
        let dx = (self.rhs)(t, &x);
        dy.copy_from_slice(dx.as_slice());
    }
}

fn check_grid(duration: f64, dt: f64) -> Result<()> {
    if !(duration.is_finite() && duration > 0.0) {
        return Err(ConfigurationError::invalid("duration", format!("{duration} is not positive")).into());
    }
    if !(dt.is_finite() && dt > 0.0 && dt <= duration) {
        return Err(ConfigurationError::invalid("dt", format!("{dt} must be in (0, {duration}]")).into());
    }
    Ok(())
}

fn collect(times: &[f64], states: &[OdeState]) -> Trajectory {
    Trajectory {
        times: times.to_vec(),
        states: states
            .iter()
            .map(|y| Vector4::from_column_slice(y.as_slice()))
            .collect(),
    }
}

/// Classic fixed-step fourth-order Runge-Kutta.
/// The step size is the sampling interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl Integrator for RungeKutta4 {
    fn integrate<F>(&self, rhs: F, x0: Vector4<f64>, duration: f64, dt: f64) -> Result<Trajectory>
    where
        F: Fn(f64, &Vector4<f64>) -> Vector4<f64>,
    {
        check_grid(duration, dt)?;
        let y0 = OdeState::from_column_slice(x0.as_slice());
        let mut stepper = Rk4::new(FirstOrder { rhs }, 0.0, y0, duration, dt);
        stepper
            .integrate()
            .map_err(|e| SimError::Integration(format!("{e:?}")))?;
        let trajectory = collect(stepper.x_out(), stepper.y_out());
        debug!("rk4: {} samples over {duration} s", trajectory.len());
        Ok(trajectory)
    }
}

/// Adaptive Dormand-Prince 5(4) with dense output on the sampling grid.
#[derive(Debug, Clone, Copy)]
pub struct DormandPrince {
    pub rtol: f64,
    pub atol: f64,
}

impl Default for DormandPrince {
    fn default() -> Self {
        DormandPrince {
            rtol: 1e-8,
            atol: 1e-10,
        }
    }
}

impl Integrator for DormandPrince {
    fn integrate<F>(&self, rhs: F, x0: Vector4<f64>, duration: f64, dt: f64) -> Result<Trajectory>
    where
        F: Fn(f64, &Vector4<f64>) -> Vector4<f64>,
    {
        check_grid(duration, dt)?;
        let y0 = OdeState::from_column_slice(x0.as_slice());
        let mut stepper = Dopri5::new(FirstOrder { rhs }, 0.0, duration, dt, y0, self.rtol, self.atol);
        stepper
            .integrate()
            .map_err(|e| SimError::Integration(format!("{e:?}")))?;
        let trajectory = collect(stepper.x_out(), stepper.y_out());
        debug!("dopri5: {} samples over {duration} s", trajectory.len());
        Ok(trajectory)
    }
}
