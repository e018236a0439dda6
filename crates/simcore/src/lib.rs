//! Shared numerical core for the bicycle analysis crates
//!
//! This crate provides:
//! - Scalar-or-series parameter overrides with length validation
//! - Single and batched state-space matrix containers
//! - Eigenvalues/eigenvectors of 4x4 state matrices and mode sorting
//! - ODE integrators for four-state initial value problems

pub mod eigen;
pub mod error;
pub mod integrators;
pub mod parameters;
pub mod state_space;

pub use eigen::{EigenSweep, eigen, sort_eigenmodes};
pub use error::{ConfigurationError, Result, SimError};
pub use integrators::{DormandPrince, Integrator, RungeKutta4, Trajectory};
pub use parameters::{Broadcast, ParameterOverrides, ParameterValue};
pub use state_space::StateSpaceMatrices;

/// Re-exported so downstream crates name the same complex type.
pub use nalgebra::Complex;
