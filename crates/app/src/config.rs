//! Settings of the eigenvalue and simulation analysis.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const KPH2MPS: f64 = 1000.0 / 3600.0;
pub const MPS2KPH: f64 = 1.0 / KPH2MPS;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid speed sweep: {0}")]
    Sweep(String),
}

/// Initial value problem under the balance-assist controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Forward speed, snapped to the nearest sweep speed [m/s]
    pub speed: f64,
    /// Steer motor torque limit [Nm]
    pub torque_limit: f64,
    /// Simulated time [s]
    pub duration: f64,
    /// Output sampling interval [s]
    pub dt: f64,
    /// Roll angle, steer angle, roll rate, steer rate at t = 0 [deg, deg/s]
    pub initial_state_deg: [f64; 4],
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            speed: 1.7,
            torque_limit: 7.0,
            duration: 10.0,
            dt: 0.01,
            initial_state_deg: [5.0, -5.0, 0.0, 0.0],
        }
    }
}

/// Configuration for the eigenvalue analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Lowest speed of the sweep [m/s]
    pub speed_min: f64,
    /// Highest speed of the sweep [m/s]
    pub speed_max: f64,
    /// Number of evenly spaced sweep speeds, ends included
    pub num_speeds: usize,
    /// Slope of the roll rate gain schedule [Nm s^2/rad m]
    pub static_gain: f64,
    /// End of the low speed gain ramp [m/s]
    pub v_min: f64,
    /// Speed where assistance stops; the uncontrolled weave speed if unset [m/s]
    pub v_max: Option<f64>,
    /// Speeds marked on the eigenvalue plots [km/h]
    pub marker_speeds_kph: Vec<f64>,
    pub simulation: SimulationConfig,
    pub figure_dir: PathBuf,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            speed_min: 0.0,
            speed_max: 10.0,
            num_speeds: 1001,
            static_gain: -10.0,
            v_min: 1.0,
            v_max: None,
            marker_speeds_kph: vec![6.0, 10.0],
            simulation: SimulationConfig::default(),
            figure_dir: PathBuf::from("figures"),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Set the swept speeds
    pub fn with_speeds(mut self, speed_min: f64, speed_max: f64, num_speeds: usize) -> Self {
        self.speed_min = speed_min;
        self.speed_max = speed_max;
        self.num_speeds = num_speeds;
        self
    }

    /// Set the gain schedule
    pub fn with_schedule(mut self, static_gain: f64, v_min: f64, v_max: Option<f64>) -> Self {
        self.static_gain = static_gain;
        self.v_min = v_min;
        self.v_max = v_max;
        self
    }

    /// Evenly spaced speeds from `speed_min` to `speed_max` inclusive.
    pub fn speeds(&self) -> Result<Vec<f64>, ConfigError> {
        if self.num_speeds < 2 || !(self.speed_min < self.speed_max) {
            return Err(ConfigError::Sweep(format!(
                "need at least two speeds and speed_min < speed_max, got {} speeds over [{}, {}]",
                self.num_speeds, self.speed_min, self.speed_max
            )));
        }
        let step = (self.speed_max - self.speed_min) / (self.num_speeds - 1) as f64;
        Ok((0..self.num_speeds)
            .map(|i| self.speed_min + step * i as f64)
            .collect())
    }

    /// Marker speeds converted to m/s.
    pub fn marker_speeds(&self) -> Vec<f64> {
        self.marker_speeds_kph.iter().map(|v| v * KPH2MPS).collect()
    }
}
