//! Initial value responses of `x' = A x + B u(t, x)`.

use log::debug;
use nalgebra::{Vector2, Vector4};
use simcore::{ConfigurationError, Integrator, Result, StateSpaceMatrices};

/// Sampled states and the inputs applied at each sample.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationResult {
    pub times: Vec<f64>,
    pub states: Vec<Vector4<f64>>,
    pub inputs: Vec<Vector2<f64>>,
}

impl SimulationResult {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn roll_angles(&self) -> Vec<f64> {
        self.states.iter().map(|x| x[0]).collect()
    }

    pub fn steer_angles(&self) -> Vec<f64> {
        self.states.iter().map(|x| x[1]).collect()
    }

    pub fn roll_rates(&self) -> Vec<f64> {
        self.states.iter().map(|x| x[2]).collect()
    }

    pub fn steer_rates(&self) -> Vec<f64> {
        self.states.iter().map(|x| x[3]).collect()
    }

    pub fn steer_torques(&self) -> Vec<f64> {
        self.inputs.iter().map(|u| u[1]).collect()
    }
}

/// Integrates a single state-space pair from `x0` for `duration` seconds.
///
/// `input` gives `[roll torque, steer torque]` from time and state; pass
/// `|_, _| Vector2::zeros()` for a free response. A batch is accepted only
/// when it holds exactly one point.
pub fn simulate<I, U>(
    state_space: &StateSpaceMatrices,
    x0: Vector4<f64>,
    input: U,
    integrator: &I,
    duration: f64,
    dt: f64,
) -> Result<SimulationResult>
where
    I: Integrator,
    U: Fn(f64, &Vector4<f64>) -> Vector2<f64>,
{
    if state_space.len() != 1 {
        return Err(ConfigurationError::invalid(
            "state_space",
            format!("expected one state-space pair, got {}", state_space.len()),
        )
        .into());
    }
    let (a, b) = state_space.point(0);

    let trajectory = integrator.integrate(|t, x| a * x + b * input(t, x), x0, duration, dt)?;
    let inputs = trajectory
        .times
        .iter()
        .zip(&trajectory.states)
        .map(|(t, x)| input(*t, x))
        .collect();
    debug!(
        "simulated {} samples, final state {:?}",
        trajectory.len(),
        trajectory.states.last().map(|x| x.as_slice().to_vec())
    );

    Ok(SimulationResult {
        times: trajectory.times,
        states: trajectory.states,
        inputs,
    })
}
