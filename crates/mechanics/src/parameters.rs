//! Whipple-Carvallo bicycle parameters in the Meijaard et al. (2007) benchmark form.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use simcore::ConfigurationError;

use crate::error::ParameterSetError;

/// Every parameter name of the benchmark model.
///
/// Geometry: wheelbase `w`, trail `c`, steer axis tilt `lam`. Rear wheel R,
/// rear frame and rider B, handlebar and fork H, front wheel F. Positions are
/// in the benchmark frame (x forward, z down), inertias about the body mass
/// centres.
pub const PARAMETER_NAMES: [&str; 27] = [
    "IBxx", "IBxz", "IByy", "IBzz", "IFxx", "IFyy", "IHxx", "IHxz", "IHyy", "IHzz", "IRxx",
    "IRyy", "c", "g", "lam", "mB", "mF", "mH", "mR", "rF", "rR", "v", "w", "xB", "xH", "zB", "zH",
];

/// Parameters that do not enter the canonical matrices.
pub const KINEMATIC_NAMES: [&str; 2] = ["v", "g"];

pub fn is_parameter_name(name: &str) -> bool {
    PARAMETER_NAMES.contains(&name)
}

/// True for the names that shape `M`, `C1`, `K0` and `K2`.
pub fn is_structural(name: &str) -> bool {
    is_parameter_name(name) && !KINEMATIC_NAMES.contains(&name)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawParameterSet {
    parameters: BTreeMap<String, f64>,
    #[serde(default)]
    includes_rider: bool,
}

/// A complete, validated set of benchmark parameters.
///
/// Immutable once built; models hold it and apply per-call overrides on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameterSet", into = "RawParameterSet")]
pub struct Meijaard2007ParameterSet {
    parameters: BTreeMap<String, f64>,
    includes_rider: bool,
}

impl TryFrom<RawParameterSet> for Meijaard2007ParameterSet {
    type Error = ConfigurationError;

    fn try_from(raw: RawParameterSet) -> Result<Self, Self::Error> {
        Self::new(raw.parameters, raw.includes_rider)
    }
}

impl From<Meijaard2007ParameterSet> for RawParameterSet {
    fn from(set: Meijaard2007ParameterSet) -> Self {
        RawParameterSet {
            parameters: set.parameters,
            includes_rider: set.includes_rider,
        }
    }
}

impl Meijaard2007ParameterSet {
    /// Validates that every benchmark name is present, finite and known.
    pub fn new<I, K>(parameters: I, includes_rider: bool) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        let parameters: BTreeMap<String, f64> = parameters
            .into_iter()
            .map(|(name, value)| (name.into(), value))
            .collect();

        if let Some(unknown) = parameters.keys().find(|name| !is_parameter_name(name)) {
            return Err(ConfigurationError::UnknownParameter(unknown.clone()));
        }
        if let Some(missing) = PARAMETER_NAMES.iter().find(|name| !parameters.contains_key(**name)) {
            return Err(ConfigurationError::MissingParameter(missing.to_string()));
        }
        if let Some((name, value)) = parameters.iter().find(|(_, value)| !value.is_finite()) {
            return Err(ConfigurationError::invalid(name.as_str(), format!("{value} is not finite")));
        }

        Ok(Self {
            parameters,
            includes_rider,
        })
    }

    /// The benchmark bicycle with rigid rider from Meijaard et al. (2007),
    /// Table 1, at 5 m/s.
    pub fn benchmark() -> Self {
        let parameters = BTreeMap::from([
            ("w".to_string(), 1.02),
            ("c".to_string(), 0.08),
            ("lam".to_string(), std::f64::consts::PI / 10.0),
            ("g".to_string(), 9.81),
            ("v".to_string(), 5.0),
            ("rR".to_string(), 0.3),
            ("mR".to_string(), 2.0),
            ("IRxx".to_string(), 0.0603),
            ("IRyy".to_string(), 0.12),
            ("xB".to_string(), 0.3),
            ("zB".to_string(), -0.9),
            ("mB".to_string(), 85.0),
            ("IBxx".to_string(), 9.2),
            ("IByy".to_string(), 11.0),
            ("IBzz".to_string(), 2.8),
            ("IBxz".to_string(), 2.4),
            ("xH".to_string(), 0.9),
            ("zH".to_string(), -0.7),
            ("mH".to_string(), 4.0),
            ("IHxx".to_string(), 0.05892),
            ("IHyy".to_string(), 0.06),
            ("IHzz".to_string(), 0.00708),
            ("IHxz".to_string(), -0.00756),
            ("rF".to_string(), 0.35),
            ("mF".to_string(), 3.0),
            ("IFxx".to_string(), 0.1405),
            ("IFyy".to_string(), 0.28),
        ]);
        Self {
            parameters,
            includes_rider: true,
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ParameterSetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ParameterSetError> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.parameters.get(name).copied()
    }

    /// Like [`get`](Self::get) but an unknown name is an error.
    pub fn value(&self, name: &str) -> Result<f64, ConfigurationError> {
        self.get(name)
            .ok_or_else(|| ConfigurationError::UnknownParameter(name.to_string()))
    }

    pub fn parameters(&self) -> &BTreeMap<String, f64> {
        &self.parameters
    }

    /// Owned copy of the values, the starting point for applying overrides.
    pub fn to_parameter_map(&self) -> BTreeMap<String, f64> {
        self.parameters.clone()
    }

    pub fn includes_rider(&self) -> bool {
        self.includes_rider
    }

    /// Copy with one value replaced.
    pub fn with_value(&self, name: &str, value: f64) -> Result<Self, ConfigurationError> {
        let mut parameters = self.parameters.clone();
        parameters.insert(name.to_string(), value);
        Self::new(parameters, self.includes_rider)
    }
}

impl Default for Meijaard2007ParameterSet {
    fn default() -> Self {
        Self::benchmark()
    }
}
