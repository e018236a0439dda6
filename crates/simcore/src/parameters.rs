//! Scalar-or-series parameter values and override sets.
//!
//! A parameter override is either a single value or a series of values, one
//! per evaluation point (typically one per speed). Every series in one
//! override set must have the same length; [`ParameterOverrides::array_len`]
//! checks this before any matrix is formed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// A parameter value that is either shared by all points or given per point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Scalar(f64),
    Series(Vec<f64>),
}

impl ParameterValue {
    /// Number of points for a series, `None` for a scalar.
    pub fn len(&self) -> Option<usize> {
        match self {
            ParameterValue::Scalar(_) => None,
            ParameterValue::Series(values) => Some(values.len()),
        }
    }

    pub fn is_series(&self) -> bool {
        matches!(self, ParameterValue::Series(_))
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            ParameterValue::Scalar(value) => Some(*value),
            ParameterValue::Series(_) => None,
        }
    }

    /// Value at point `i`; scalars are the same at every point.
    ///
    /// Panics if `i` is out of range for a series.
    pub fn at(&self, i: usize) -> f64 {
        match self {
            ParameterValue::Scalar(value) => *value,
            ParameterValue::Series(values) => values[i],
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        ParameterValue::Scalar(value)
    }
}

impl From<Vec<f64>> for ParameterValue {
    fn from(values: Vec<f64>) -> Self {
        ParameterValue::Series(values)
    }
}

impl From<&[f64]> for ParameterValue {
    fn from(values: &[f64]) -> Self {
        ParameterValue::Series(values.to_vec())
    }
}

/// A value that is either shared by every evaluation point or one per point.
#[derive(Debug, Clone, PartialEq)]
pub enum Broadcast<T> {
    Shared(T),
    PerPoint(Vec<T>),
}

impl<T> Broadcast<T> {
    /// The value to use at point `i`.
    pub fn at(&self, i: usize) -> &T {
        match self {
            Broadcast::Shared(value) => value,
            Broadcast::PerPoint(values) => &values[i],
        }
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            Broadcast::Shared(_) => None,
            Broadcast::PerPoint(values) => Some(values.len()),
        }
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Broadcast::Shared(_))
    }
}

/// Named parameter overrides applied on top of a base parameter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterOverrides {
    values: BTreeMap<String, ParameterValue>,
}

impl ParameterOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override (builder pattern).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParameterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn with_scalar(self, name: impl Into<String>, value: f64) -> Self {
        self.with(name, ParameterValue::Scalar(value))
    }

    pub fn with_series(self, name: impl Into<String>, values: Vec<f64>) -> Self {
        self.with(name, ParameterValue::Series(values))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParameterValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&ParameterValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Names of the overrides given as a series.
    pub fn series_names(&self) -> Vec<&str> {
        self.iter()
            .filter(|(_, value)| value.is_series())
            .map(|(name, _)| name)
            .collect()
    }

    /// Common length of every series override, `None` if all are scalars.
    ///
    /// Fails on an empty series or when two series disagree in length.
    pub fn array_len(&self) -> Result<Option<usize>, ConfigurationError> {
        let mut common: Option<usize> = None;
        for (name, value) in self.iter() {
            let Some(len) = value.len() else { continue };
            if len == 0 {
                return Err(ConfigurationError::EmptySeries(name.to_string()));
            }
            match common {
                None => common = Some(len),
                Some(expected) if expected != len => {
                    return Err(ConfigurationError::LengthMismatch {
                        name: name.to_string(),
                        expected,
                        actual: len,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(common)
    }

    /// Splits into `(matching, rest)` by parameter name.
    pub fn partition<F: Fn(&str) -> bool>(&self, predicate: F) -> (Self, Self) {
        let (matching, rest): (BTreeMap<_, _>, BTreeMap<_, _>) = self
            .values
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .partition(|(name, _)| predicate(name));
        (Self { values: matching }, Self { values: rest })
    }
}

impl<K: Into<String>, V: Into<ParameterValue>> FromIterator<(K, V)> for ParameterOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overrides = Self::new();
        for (name, value) in iter {
            overrides.insert(name, value);
        }
        overrides
    }
}
