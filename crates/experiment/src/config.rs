//! Perturbation rig settings.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Configuration for detecting and slicing perturbations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerturbationConfig {
    /// Force the rig holds while only tracking the rider [N]
    pub tracking_force: f64,
    /// Desired-force channels, one per perturbation direction
    pub desired_force_columns: Vec<String>,
    /// Column whose activity marks a counterclockwise perturbation
    pub counterclockwise_column: String,
    /// Measured handlebar force channels
    pub force_columns: Vec<String>,
    /// Context kept before the perturbation starts [s]
    pub duration_before: f64,
    /// Context kept after the perturbation ends [s]
    pub duration_after: f64,
    /// Shorter force blocks are logging glitches
    pub min_samples: usize,
    /// Distance between the left and right force attachment points [m]
    pub handlebar_length: f64,
    /// Motor current to torque divisor of the balance-assist motor
    pub motor_constant: f64,
    /// Saturation of the balance-assist motor torque [Nm]
    pub motor_torque_limit: f64,
    /// Channels whose name contains one of these are mirrored for
    /// counterclockwise perturbations
    pub flip_markers: Vec<String>,
    /// Roll angles beyond this mark a corrupted recording [deg]
    pub plausible_roll_limit: f64,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            tracking_force: 3.0,
            desired_force_columns: vec!["desforce13".into(), "desforce24".into()],
            counterclockwise_column: "desforce24".into(),
            force_columns: vec![
                "force1".into(),
                "force2".into(),
                "force3".into(),
                "force4".into(),
            ],
            duration_before: 0.3,
            duration_after: 2.0,
            min_samples: 30,
            handlebar_length: 0.82,
            motor_constant: 5.0,
            motor_torque_limit: 7.0,
            flip_markers: vec!["steer".into(), "roll".into(), "gyro".into()],
            plausible_roll_limit: 500.0,
        }
    }
}

impl PerturbationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Set the context window
    pub fn with_context(mut self, before: f64, after: f64) -> Self {
        self.duration_before = before;
        self.duration_after = after;
        self
    }

    /// Set the glitch filter length
    pub fn with_min_samples(mut self, min_samples: usize) -> Self {
        self.min_samples = min_samples;
        self
    }

    /// Whether channel `name` is mirrored for counterclockwise perturbations.
    pub fn is_flipped_channel(&self, name: &str) -> bool {
        self.flip_markers.iter().any(|marker| name.contains(marker.as_str()))
    }

    /// Measured forces followed by the desired forces.
    pub fn all_force_columns(&self) -> Vec<String> {
        self.force_columns
            .iter()
            .chain(&self.desired_force_columns)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            PerturbationConfig::from_json_str(r#"{"tracking_force": 4.5, "motor_torque_limit": 6.0}"#).unwrap();
        assert_eq!(config.tracking_force, 4.5);
        assert_eq!(config.motor_torque_limit, 6.0);
        assert_eq!(config.min_samples, 30);
        assert_eq!(config.handlebar_length, 0.82);
        assert_eq!(PerturbationConfig::default().motor_torque_limit, 7.0);
    }

    #[test]
    fn test_flipped_channels() {
        let config = PerturbationConfig::default();
        assert!(config.is_flipped_channel("steer_rate"));
        assert!(config.is_flipped_channel("roll_angle"));
        assert!(config.is_flipped_channel("gyro_x"));
        assert!(!config.is_flipped_channel("speed"));
        assert!(!config.is_flipped_channel("desforce24"));
    }

    #[test]
    fn test_all_force_columns() {
        let columns = PerturbationConfig::default().all_force_columns();
        assert_eq!(columns.len(), 6);
        assert_eq!(columns[0], "force1");
        assert_eq!(columns[5], "desforce24");
    }
}
