//! Balance-assist steer control for the linear bicycle model
//!
//! This crate provides:
//! - Full-state steer feedback closing the loop around the open-loop model (`A - B*K`)
//! - Stability interval extraction from eigenvalue sweeps
//! - Speed-scheduled steer-rate gains
//! - A saturating steer-torque controller and closed-loop simulation

pub mod feedback;
pub mod gain_schedule;
pub mod simulation;
pub mod stability;
pub mod steer_control;

pub use feedback::{SteerTorqueConfig, SteerTorqueController};
pub use gain_schedule::generate_gains;
pub use simulation::{SimulationResult, simulate};
pub use stability::{speed_bounds, stable_ranges, weave_capsize_speeds};
pub use steer_control::{GAIN_NAMES, SteerControlModel, gain_matrix, is_gain_name};
