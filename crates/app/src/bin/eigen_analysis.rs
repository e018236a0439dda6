//! Eigenvalue analysis of the benchmark bicycle with and without balance
//! assist.
//!
//! Usage: `eigen_analysis [analysis.json] [parameters.json]`

use std::error::Error;

use balance_assist_app::figures::{
    eigenvalue_parts_figure, gains_figure, geometry_mass_figure, simulation_figure,
};
use balance_assist_app::{AnalysisConfig, FigureDirectory};
use control::{
    SteerControlModel, SteerTorqueConfig, SteerTorqueController, generate_gains, simulate,
    speed_bounds, stable_ranges, weave_capsize_speeds,
};
use experiment::closest_index;
use log::{LevelFilter, info, warn};
use mechanics::Meijaard2007ParameterSet;
use nalgebra::Vector4;
use simcore::{EigenSweep, ParameterOverrides, RungeKutta4};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Logs the weave and capsize speeds and any further stable bands.
fn report_stability(label: &str, speeds: &[f64], sweep: &EigenSweep) -> Option<(f64, f64)> {
    let Some((weave, capsize)) = weave_capsize_speeds(speeds, sweep.eigenvalues.view()) else {
        warn!("{label} bicycle is not stable at any swept speed");
        return None;
    };
    info!("{label} weave speed: {weave:1.2} [m/s]");
    info!("{label} capsize speed: {capsize:1.2} [m/s]");
    let bands = speed_bounds(speeds, &stable_ranges(sweep.eigenvalues.view()));
    for (lo, hi) in bands.iter().skip(1) {
        info!("{label} bicycle is also stable from {lo:1.2} to {hi:1.2} [m/s]");
    }
    Some((weave, capsize))
}

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => AnalysisConfig::from_json_file(path)?,
        None => AnalysisConfig::default(),
    };
    let parameter_set = match args.next() {
        Some(path) => Meijaard2007ParameterSet::from_json_file(path)?,
        None => Meijaard2007ParameterSet::benchmark(),
    };

    let figures = FigureDirectory::create(&config.figure_dir)?;
    geometry_mass_figure(&figures, &parameter_set)?;
    let model = SteerControlModel::from_parameter_set(parameter_set);
    let speeds = config.speeds()?;
    let markers = config.marker_speeds();

    // Uncontrolled
    let uncontrolled = model.sorted_eigen(&ParameterOverrides::new().with_series("v", speeds.clone()))?;
    let stable = report_stability("Uncontrolled", &speeds, &uncontrolled);
    eigenvalue_parts_figure(
        &figures,
        "uncontrolled-eig-vs-speeds.png",
        "Uncontrolled",
        &speeds,
        &uncontrolled,
        stable,
        &markers,
    )?;

    // Balance assist
    let v_max = config
        .v_max
        .or(stable.map(|(weave, _)| weave))
        .ok_or("no v_max configured and no uncontrolled weave speed to fall back on")?;
    let kphidots = generate_gains(config.static_gain, &speeds, config.v_min, v_max)?;
    let controlled = model.sorted_eigen(
        &ParameterOverrides::new()
            .with_series("v", speeds.clone())
            .with_series("kphidot", kphidots.clone()),
    )?;
    let label = format!("Controlled (gain={})", config.static_gain);
    let assisted = report_stability(&label, &speeds, &controlled);
    eigenvalue_parts_figure(
        &figures,
        "balance-assist-controllers-eig-vs-speeds.png",
        "Balance assist",
        &speeds,
        &controlled,
        assisted,
        &markers,
    )?;
    gains_figure(&figures, &speeds, &kphidots)?;

    // Initial value problem at low speed with a saturating motor
    let sim = &config.simulation;
    let idx = closest_index(sim.speed, &speeds).ok_or("empty speed sweep")?;
    let v = speeds[idx];
    let open_loop = model
        .model()
        .form_state_space_matrices(&ParameterOverrides::new().with_scalar("v", v))?;
    let controller = SteerTorqueController::new(
        SteerTorqueConfig::roll_rate(kphidots[idx]).with_torque_limit(sim.torque_limit),
    );
    let [roll, steer, roll_rate, steer_rate] = sim.initial_state_deg.map(f64::to_radians);
    let x0 = Vector4::new(roll, steer, roll_rate, steer_rate);
    let result = simulate(
        &open_loop,
        x0,
        |_, x| controller.torques(x),
        &RungeKutta4,
        sim.duration,
        sim.dt,
    )?;
    info!(
        "Simulated {:.1} s at {v:1.2} m/s with kphidot = {:.2}",
        sim.duration, kphidots[idx]
    );
    simulation_figure(&figures, &result, v)?;

    Ok(())
}
