//! Recorded perturbation experiments
//!
//! This crate provides:
//! - CSV loading of the instrumented bicycle's time series
//! - Detection of rig perturbations and slicing with context
//! - Direction normalization and handlebar torque reconstruction

pub mod config;
pub mod error;
pub mod perturbation;
pub mod timeseries;

pub use config::PerturbationConfig;
pub use error::{DataError, Result};
pub use perturbation::{
    Perturbation, closest_index, context_around_perturbation, figure_title, get_perturbations,
    handlebar_torque, perturbation_indices,
};
pub use timeseries::{TIME_COLUMN, TimeSeries};
