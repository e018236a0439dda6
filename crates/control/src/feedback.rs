//! Saturating steer-torque feedback
//!
//! Full-state feedback `T_delta = -K x` with the steer torque clamped to the
//! motor's torque limit, for time-domain simulation of the balance-assist
//! controller.

use nalgebra::{Matrix2x4, Vector2, Vector4};
use serde::{Deserialize, Serialize};

/// Configuration for a steer-torque controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SteerTorqueConfig {
    /// Roll angle gain [Nm/rad]
    pub kphi: f64,
    /// Steer angle gain [Nm/rad]
    pub kdelta: f64,
    /// Roll rate gain [Nm s/rad]
    pub kphidot: f64,
    /// Steer rate gain [Nm s/rad]
    pub kdeltadot: f64,
    /// Maximum steer torque magnitude [Nm]
    pub torque_limit: f64,
}

impl Default for SteerTorqueConfig {
    fn default() -> Self {
        Self {
            kphi: 0.0,
            kdelta: 0.0,
            kphidot: 0.0,
            kdeltadot: 0.0,
            torque_limit: f64::INFINITY,
        }
    }
}

impl SteerTorqueConfig {
    /// Create a roll-rate-only controller
    pub fn roll_rate(kphidot: f64) -> Self {
        Self { kphidot, ..Default::default() }
    }

    /// Create a PD controller on roll angle and roll rate
    pub fn roll_pd(kphi: f64, kphidot: f64) -> Self {
        Self { kphi, kphidot, ..Default::default() }
    }

    /// Set the steer gains
    pub fn with_steer_gains(mut self, kdelta: f64, kdeltadot: f64) -> Self {
        self.kdelta = kdelta;
        self.kdeltadot = kdeltadot;
        self
    }

    /// Set the torque saturation
    pub fn with_torque_limit(mut self, torque_limit: f64) -> Self {
        self.torque_limit = torque_limit.abs();
        self
    }

    /// The 2x4 gain matrix with a zero roll-torque row
    pub fn gain_matrix(&self) -> Matrix2x4<f64> {
        Matrix2x4::new(
            0.0, 0.0, 0.0, 0.0, //
            self.kphi, self.kdelta, self.kphidot, self.kdeltadot,
        )
    }
}

/// Stateless steer-torque controller
#[derive(Debug, Clone)]
pub struct SteerTorqueController {
    config: SteerTorqueConfig,
    k: Matrix2x4<f64>,
}

impl SteerTorqueController {
    pub fn new(config: SteerTorqueConfig) -> Self {
        let k = config.gain_matrix();
        Self { config, k }
    }

    /// Input torques `[roll, steer]` for state `x`.
    pub fn torques(&self, x: &Vector4<f64>) -> Vector2<f64> {
        let limit = self.config.torque_limit;
        let u = -(self.k * x);
        Vector2::new(0.0, u[1].clamp(-limit, limit))
    }

    /// Whether the commanded torque at `x` is clipped.
    pub fn is_saturated(&self, x: &Vector4<f64>) -> bool {
        (self.k * x)[1].abs() > self.config.torque_limit
    }

    pub fn config(&self) -> &SteerTorqueConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roll_rate_feedback() {
        let ctrl = SteerTorqueController::new(SteerTorqueConfig::roll_rate(-10.0));
        let x = Vector4::new(0.0, 0.0, 0.3, 0.0);
        let u = ctrl.torques(&x);
        assert_eq!(u[0], 0.0);
        assert!((u[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_full_state_feedback() {
        let config = SteerTorqueConfig::roll_pd(2.0, -1.0).with_steer_gains(0.5, 0.25);
        let ctrl = SteerTorqueController::new(config);
        let x = Vector4::new(0.1, -0.2, 0.3, 0.4);
        // -(2*0.1 + 0.5*(-0.2) - 0.3 + 0.25*0.4)
        assert!((ctrl.torques(&x)[1] - 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_torque_saturation() {
        let config = SteerTorqueConfig::roll_pd(-100.0, 0.0).with_torque_limit(7.0);
        let ctrl = SteerTorqueController::new(config);

        let x = Vector4::new(1.0, 0.0, 0.0, 0.0);
        assert!((ctrl.torques(&x)[1] - 7.0).abs() < 1e-12);
        assert!(ctrl.is_saturated(&x));

        let x = Vector4::new(-1.0, 0.0, 0.0, 0.0);
        assert!((ctrl.torques(&x)[1] + 7.0).abs() < 1e-12);

        let x = Vector4::new(0.01, 0.0, 0.0, 0.0);
        assert!(!ctrl.is_saturated(&x));
    }

    #[test]
    fn test_config_from_json() {
        let config: SteerTorqueConfig = serde_json::from_str(
            r#"{"kphi": 1.0, "kdelta": 0.0, "kphidot": -5.0, "kdeltadot": 0.0, "torque_limit": 7.0}"#,
        )
        .unwrap();
        assert_eq!(config.gain_matrix()[(1, 2)], -5.0);
        assert_eq!(config.torque_limit, 7.0);
    }
}
