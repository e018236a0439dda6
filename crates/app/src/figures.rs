//! The analysis figures and the directory they are written to.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use control::SimulationResult;
use experiment::{Perturbation, PerturbationConfig, figure_title, handlebar_torque};
use log::{info, warn};
use mechanics::Meijaard2007ParameterSet;
use plotters::prelude::*;
use simcore::EigenSweep;

use crate::config::MPS2KPH;
use crate::plots::{Axes, GREY, LIGHT_CORAL, LIGHT_STEEL_BLUE, PlotResult, Trace, render};

/// Eigenvalue plots are clipped to this band [1/s].
const EIGENVALUE_LIMIT: f64 = 10.0;
const SIZE: (u32, u32) = (1024, 768);
const TALL: (u32, u32) = (1024, 1280);

/// Where figures go. Created once; plotting functions only write into it.
#[derive(Debug, Clone)]
pub struct FigureDirectory {
    root: PathBuf,
}

impl FigureDirectory {
    /// Creates the directory if needed.
    pub fn create(path: impl Into<PathBuf>) -> io::Result<Self> {
        let root = path.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

fn saved(path: PathBuf) -> PathBuf {
    info!("Saved plot with name {}", path.display());
    path
}

/// `n` points around a circle in the x-z plane, closed.
fn circle(cx: f64, cz: f64, radius: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
    (0..=n)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / n as f64;
            (cx + radius * angle.cos(), cz + radius * angle.sin())
        })
        .unzip()
}

/// Steer axis from its ground intersection, `c` ahead of the front contact
/// point, up to `height`, tilted back by `lam` from vertical.
fn steer_axis(w: f64, c: f64, lam: f64, height: f64) -> ([f64; 2], [f64; 2]) {
    let ground = w + c;
    ([ground, ground - height * lam.tan()], [0.0, height])
}

/// Side view of the wheels, steer axis and mass centres. Heights are `-z`.
pub fn geometry_mass_figure(
    dir: &FigureDirectory,
    parameter_set: &Meijaard2007ParameterSet,
) -> PlotResult<PathBuf> {
    let p = |name: &str| parameter_set.value(name);
    let (w, c, lam) = (p("w")?, p("c")?, p("lam")?);
    let (r_r, r_f) = (p("rR")?, p("rF")?);
    let (x_b, h_b) = (p("xB")?, -p("zB")?);
    let (x_h, h_h) = (p("xH")?, -p("zH")?);

    let rear = circle(0.0, r_r, r_r, 72);
    let front = circle(w, r_f, r_f, 72);
    let top = h_b.max(h_h).max(2.0 * r_f) + 0.1;
    let (axis_x, axis_z) = steer_axis(w, c, lam, top);
    let ground_x = [-r_r - 0.1, w + r_f + 0.1];
    let ground_z = [0.0, 0.0];
    let (wheels_x, wheels_z) = ([0.0, w], [r_r, r_f]);
    let (frame_x, frame_z) = ([x_b], [h_b]);
    let (fork_x, fork_z) = ([x_h], [h_h]);
    let frame_label = if parameter_set.includes_rider() {
        "Rear frame and rider (B)"
    } else {
        "Rear frame (B)"
    };

    let axes = Axes::new("x [m]", "-z [m]")
        .with_caption("Geometry and mass centres")
        .with_y_range(-0.1, top + 0.1)
        .with_trace(Trace::line(&ground_x, &ground_z, GREY))
        .with_trace(Trace::line(&rear.0, &rear.1, BLACK).labeled("Wheels"))
        .with_trace(Trace::line(&front.0, &front.1, BLACK))
        .with_trace(Trace::line(&axis_x, &axis_z, GREY).labeled("Steer axis"))
        .with_trace(Trace::markers(&wheels_x, &wheels_z, BLUE).labeled("Wheels (R, F)"))
        .with_trace(Trace::markers(&frame_x, &frame_z, RED).labeled(frame_label))
        .with_trace(Trace::markers(&fork_x, &fork_z, GREEN).labeled("Front frame (H)"));

    let path = dir.file("bicycle-geometry-mass.png");
    render(&path, SIZE, None, &[axes])?;
    Ok(saved(path))
}

/// Real parts (black) and imaginary parts (grey) of every mode versus speed,
/// with the stable speed range shaded.
pub fn eigenvalue_parts_figure(
    dir: &FigureDirectory,
    name: &str,
    title: &str,
    speeds: &[f64],
    sweep: &EigenSweep,
    stable: Option<(f64, f64)>,
    marker_speeds: &[f64],
) -> PlotResult<PathBuf> {
    let real: Vec<Vec<f64>> = (0..4).map(|j| sweep.real_parts(j)).collect();
    let imag: Vec<Vec<f64>> = (0..4).map(|j| sweep.imaginary_parts(j)).collect();

    let mut axes = Axes::new("Speed [m/s]", "Eigenvalue components [1/s]")
        .with_caption(title)
        .with_vlines(marker_speeds)
        .with_hlines(&[0.0])
        .with_y_range(-EIGENVALUE_LIMIT, EIGENVALUE_LIMIT);
    if let Some((lo, hi)) = stable {
        axes = axes.with_x_band(lo, hi);
    }
    for (j, (re, im)) in real.iter().zip(&imag).enumerate() {
        let mut re_trace = Trace::dots(speeds, re, BLACK);
        let mut im_trace = Trace::dots(speeds, im, GREY);
        if j == 0 {
            re_trace = re_trace.labeled("Real");
            im_trace = im_trace.labeled("Imaginary");
        }
        axes = axes.with_trace(re_trace).with_trace(im_trace);
    }

    let path = dir.file(name);
    render(&path, SIZE, None, &[axes])?;
    Ok(saved(path))
}

/// Scheduled roll rate gain versus speed.
pub fn gains_figure(dir: &FigureDirectory, speeds: &[f64], gains: &[f64]) -> PlotResult<PathBuf> {
    let axes = Axes::new("Speed [m/s]", "kphidot [Nm s/rad]")
        .with_caption("Balance-assist roll rate gain")
        .with_hlines(&[0.0])
        .with_trace(Trace::line(speeds, gains, BLACK));
    let path = dir.file("gains-vs-speed.png");
    render(&path, SIZE, None, &[axes])?;
    Ok(saved(path))
}

/// Steer torque, angles and rates of a simulated response.
pub fn simulation_figure(dir: &FigureDirectory, result: &SimulationResult, speed: f64) -> PlotResult<PathBuf> {
    let degrees = |values: Vec<f64>| -> Vec<f64> { values.into_iter().map(f64::to_degrees).collect() };
    let torque = result.steer_torques();
    let (roll, steer) = (degrees(result.roll_angles()), degrees(result.steer_angles()));
    let (roll_rate, steer_rate) = (degrees(result.roll_rates()), degrees(result.steer_rates()));
    let t = &result.times;

    let panels = [
        Axes::new("", "Torque [Nm]").with_trace(Trace::line(t, &torque, BLACK).labeled("Steer")),
        Axes::new("", "Angle [deg]")
            .with_trace(Trace::line(t, &roll, BLACK).labeled("Roll"))
            .with_trace(Trace::line(t, &steer, GREY).labeled("Steer")),
        Axes::new("Time [s]", "Angular Rate [deg/s]")
            .with_trace(Trace::line(t, &roll_rate, BLACK).labeled("Roll"))
            .with_trace(Trace::line(t, &steer_rate, GREY).labeled("Steer")),
    ];

    let title = format!("v = {speed:1.2} [m/s]");
    let path = dir.file("pd-simulation.png");
    render(&path, TALL, Some(title.as_str()), &panels)?;
    Ok(saved(path))
}

/// Handlebar torque, body angles, roll rate, motor torque and speed around
/// one perturbation.
pub fn torque_angle_figure(
    dir: &FigureDirectory,
    index: usize,
    perturbation: &Perturbation,
    config: &PerturbationConfig,
) -> PlotResult<PathBuf> {
    let series = &perturbation.series;
    let t = series.times()?;
    let (measured, desired) = handlebar_torque(series, config)?;
    let roll_x10: Vec<f64> = series.column("roll_angle")?.iter().map(|r| r * 10.0).collect();
    let steer = series.column("steer_angle")?;
    let roll_rate = series.column("roll_rate")?;
    let speed = series.column("speed")?;
    let (mean, std) = perturbation.speed_stats()?;
    let motor_torque = perturbation.motor_torque(config);

    let mut panels = vec![
        Axes::new("", "Handlebar Torque [Nm]")
            .with_trace(Trace::line(t, &desired, BLACK).labeled("Commanded"))
            .with_trace(Trace::line(t, &measured, GREY).labeled("Measured")),
        Axes::new("", "Angle [deg]")
            .with_vlines(&[0.0])
            .with_trace(Trace::line(t, &roll_x10, BLACK).labeled("Roll X 10"))
            .with_trace(Trace::line(t, steer, GREY).labeled("Steer")),
        Axes::new("", "Roll Rate [deg/s]").with_trace(Trace::line(t, roll_rate, BLACK)),
    ];
    let limit = config.motor_torque_limit;
    if let Some(torque) = &motor_torque {
        panels.push(
            Axes::new("", "Commanded Motor Torque [Nm]")
                .with_hlines(&[-limit, limit])
                .with_trace(Trace::line(t, torque, BLACK)),
        );
    }
    panels.push(
        Axes::new("Time since start of perturbation [s]", "Speed [m/s]")
            .with_caption(format!("Mean speed {:.1} km/h", mean * MPS2KPH))
            .with_hlines(&[mean])
            .with_y_band(mean - std, mean + std)
            .with_trace(Trace::line(t, speed, BLACK)),
    );

    let path = dir.file(&format!("torque_angle_perturbation_{index}.png"));
    render(&path, TALL, None, &panels)?;
    Ok(saved(path))
}

/// The rig's force channels and the resulting handlebar torque.
pub fn force_torque_figure(
    dir: &FigureDirectory,
    index: usize,
    perturbation: &Perturbation,
    config: &PerturbationConfig,
) -> PlotResult<PathBuf> {
    const FORCE_COLORS: [RGBColor; 6] = [BLUE, RED, GREEN, MAGENTA, BLACK, GREY];
    let series = &perturbation.series;
    let t = series.times()?;
    let (measured, desired) = handlebar_torque(series, config)?;
    let labels = [
        "Motor 1",
        "Motor 2",
        "Motor 3",
        "Motor 4",
        "Desired motor 1 and 3",
        "Desired motor 2 and 4",
    ];

    let mut forces = Axes::new("", "Force [N]");
    for (k, name) in config.all_force_columns().iter().enumerate() {
        let label = labels.get(k).copied().unwrap_or(name.as_str());
        let color = FORCE_COLORS[k % FORCE_COLORS.len()];
        forces = forces.with_trace(Trace::line(t, series.column(name)?, color).labeled(label));
    }
    let torques = Axes::new("Time relative to start of perturbation [s]", "Torque [Nm]")
        .with_trace(Trace::line(t, &measured, BLUE).labeled("Measured net torque on handlebars"))
        .with_trace(Trace::line(t, &desired, RED).labeled("Desired net torque on handlebars"));

    let title = figure_title(series)?;
    let path = dir.file(&format!("perturbation_{index}.png"));
    render(&path, SIZE, Some(title.as_str()), &[forces, torques])?;
    Ok(saved(path))
}

/// Roll angle and steer rate of every perturbation, assist on in blue and
/// off in red. Implausible recordings are left out.
pub fn roll_steer_overlay_figure(
    dir: &FigureDirectory,
    perturbations: &[Perturbation],
    config: &PerturbationConfig,
) -> PlotResult<PathBuf> {
    let guides = [0.0, config.duration_before];
    let mut roll = Axes::new("", "Roll angle [deg]").with_vlines(&guides);
    let mut steer = Axes::new("Time relative to start of perturbation [s]", "Steer rate [deg/s]")
        .with_vlines(&guides);

    let (mut on_labeled, mut off_labeled) = (false, false);
    for (i, perturbation) in perturbations.iter().enumerate() {
        if !perturbation.is_plausible(config)? {
            warn!("perturbation {i} has an implausible roll angle, skipped");
            continue;
        }
        let series = &perturbation.series;
        let t = series.times()?;
        let (color, label, labeled) = if perturbation.balance_assist_on() {
            (LIGHT_STEEL_BLUE, "Balance-assist ON", &mut on_labeled)
        } else {
            (LIGHT_CORAL, "Balance-assist OFF", &mut off_labeled)
        };

        let mut roll_trace = Trace::line(t, series.column("roll_angle")?, color.mix(0.5));
        if !*labeled {
            roll_trace = roll_trace.labeled(label);
            *labeled = true;
        }
        roll = roll.with_trace(roll_trace);
        steer = steer.with_trace(Trace::line(t, series.column("steer_rate")?, color.mix(0.5)));
    }

    let path = dir.file("roll_steer_overlay.png");
    render(
        &path,
        SIZE,
        Some("Roll angle and steer rate for all perturbations applied to one participant."),
        &[roll, steer],
    )?;
    Ok(saved(path))
}
