//! Figures of recorded perturbation experiments.
//!
//! Usage: `time_series <assist_on.csv> <assist_off.csv> [perturbation.json]`

use std::error::Error;

use balance_assist_app::FigureDirectory;
use balance_assist_app::figures::{force_torque_figure, roll_steer_overlay_figure, torque_angle_figure};
use experiment::{PerturbationConfig, TimeSeries, get_perturbations};
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

const FIGURE_DIR: &str = "figures";

fn main() -> Result<(), Box<dyn Error>> {
    TermLogger::init(LevelFilter::Info, Config::default(), TerminalMode::Mixed, ColorChoice::Auto)?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [assist_on, assist_off, rest @ ..] = args.as_slice() else {
        return Err("usage: time_series <assist_on.csv> <assist_off.csv> [perturbation.json]".into());
    };
    let config = match rest.first() {
        Some(path) => PerturbationConfig::from_json_file(path)?,
        None => PerturbationConfig::default(),
    };
    let figures = FigureDirectory::create(FIGURE_DIR)?;

    let mut perturbations = get_perturbations(&TimeSeries::from_csv_path(assist_on)?, &config)?;
    let assisted = perturbations.len();
    perturbations.extend(get_perturbations(&TimeSeries::from_csv_path(assist_off)?, &config)?);
    info!(
        "{assisted} perturbations with balance assist, {} without",
        perturbations.len() - assisted
    );

    for (i, perturbation) in perturbations.iter().enumerate() {
        torque_angle_figure(&figures, i, perturbation, &config)?;
    }
    if let Some(first) = perturbations.first() {
        force_torque_figure(&figures, 0, first, &config)?;
    }
    roll_steer_overlay_figure(&figures, &perturbations, &config)?;

    Ok(())
}
