//! Detection and slicing of lateral perturbations applied by the rig.
//!
//! The rig pulls the handlebars through two cable pairs. While idle it holds
//! every desired-force channel at the tracking force; a perturbation is a
//! block of samples where one of them is above it.

use log::{debug, info, warn};

use crate::config::PerturbationConfig;
use crate::error::Result;
use crate::timeseries::{TIME_COLUMN, TimeSeries};

/// One perturbation with its context, time re-zeroed to its start.
///
/// For counterclockwise perturbations every flipped channel is mirrored so
/// all perturbations push the same way; the recorded values are kept in
/// `<name>_original`.
#[derive(Debug, Clone, PartialEq)]
pub struct Perturbation {
    /// Row of the perturbation start in the source recording.
    pub start: usize,
    /// Row where the desired force returned to the tracking force.
    pub stop: usize,
    /// Whether the channels were mirrored.
    pub flipped: bool,
    pub series: TimeSeries,
}

impl Perturbation {
    /// Recordings with assist on log the motor current.
    pub fn balance_assist_on(&self) -> bool {
        self.series.has_column("motor_current")
    }

    /// Commanded motor torque, if the assist was on.
    pub fn motor_torque(&self, config: &PerturbationConfig) -> Option<Vec<f64>> {
        let current = self.series.column("motor_current").ok()?;
        Some(current.iter().map(|i| i / config.motor_constant).collect())
    }

    /// Mean and sample standard deviation of the forward speed.
    pub fn speed_stats(&self) -> Result<(f64, f64)> {
        Ok(mean_std(self.series.column("speed")?))
    }

    /// False for recordings with roll angles no rider survives.
    pub fn is_plausible(&self, config: &PerturbationConfig) -> Result<bool> {
        let roll = self.series.column("roll_angle")?;
        Ok(roll.iter().all(|r| r.abs() < config.plausible_roll_limit))
    }
}

fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    if values.is_empty() {
        return (f64::NAN, f64::NAN);
    }
    let mean = values.iter().sum::<f64>() / n;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, var.sqrt())
}

/// `(start, stop)` rows of every perturbation block, sorted by start.
///
/// A block starts at the first sample above the tracking force and stops at
/// the first later sample at or below it. Blocks no longer than
/// `min_samples` are dropped, as is a block still running when the
/// recording ends.
pub fn perturbation_indices(data: &TimeSeries, config: &PerturbationConfig) -> Result<Vec<(usize, usize)>> {
    let tracking = config.tracking_force;
    let mut blocks = Vec::new();

    for name in &config.desired_force_columns {
        let force = data.column(name)?;
        let mut from = 0;
        while let Some(start) = (from..force.len()).find(|&i| force[i] > tracking) {
            let Some(stop) = (start..force.len()).find(|&i| force[i] <= tracking) else {
                warn!("`{name}` perturbation at row {start} never ends, dropped");
                break;
            };
            from = stop;
            if stop - start > config.min_samples {
                blocks.push((start, stop));
            } else {
                debug!("`{name}` block {start}..{stop} too short, dropped");
            }
        }
    }

    blocks.sort_unstable();
    Ok(blocks)
}

/// Index of the sample closest to `time` in ascending `timestamps`.
///
/// Ties go to the earlier sample. `None` for an empty slice.
pub fn closest_index(time: f64, timestamps: &[f64]) -> Option<usize> {
    if timestamps.is_empty() {
        return None;
    }
    let idx = timestamps.partition_point(|t| *t < time);
    if idx == 0 {
        return Some(0);
    }
    if idx == timestamps.len() {
        return Some(timestamps.len() - 1);
    }
    let before = timestamps[idx - 1];
    let after = timestamps[idx];
    Some(if after - time < time - before { idx } else { idx - 1 })
}

/// Widens each block by the configured durations before and after.
pub fn context_around_perturbation(
    data: &TimeSeries,
    blocks: &[(usize, usize)],
    config: &PerturbationConfig,
) -> Result<Vec<(usize, usize)>> {
    let times = data.times()?;
    Ok(blocks
        .iter()
        .filter_map(|&(start, stop)| {
            let first = closest_index(times[start] - config.duration_before, times)?;
            let last = closest_index(times[stop] + config.duration_after, times)?;
            Some((first, last))
        })
        .collect())
}

/// Slices every perturbation out of a recording.
///
/// Each window spans the context rows `[first, last)`.
pub fn get_perturbations(data: &TimeSeries, config: &PerturbationConfig) -> Result<Vec<Perturbation>> {
    let blocks = perturbation_indices(data, config)?;
    let windows = context_around_perturbation(data, &blocks, config)?;
    let times = data.times()?;
    let direction = data.column(&config.counterclockwise_column)?;

    let mut perturbations = Vec::with_capacity(blocks.len());
    for (&(start, stop), &(first, last)) in blocks.iter().zip(&windows) {
        let flipped = direction[start] > config.tracking_force;
        let t0 = times[start];

        let mut series = TimeSeries::new();
        series.insert(TIME_COLUMN, times[first..last].iter().map(|t| t - t0).collect())?;
        for name in data.column_names().filter(|name| *name != TIME_COLUMN) {
            let values = &data.column(name)?[first..last];
            if config.is_flipped_channel(name) {
                series.insert(format!("{name}_original"), values.to_vec())?;
                let sign = if flipped { -1.0 } else { 1.0 };
                series.insert(name, values.iter().map(|v| sign * v).collect())?;
            } else {
                series.insert(name, values.to_vec())?;
            }
        }

        perturbations.push(Perturbation {
            start,
            stop,
            flipped,
            series,
        });
    }

    info!("found {} perturbations in {} samples", perturbations.len(), data.len());
    Ok(perturbations)
}

/// Net handlebar torque `(measured, desired)` from the rig's force channels.
///
/// Forces 2 and 3 act on the right grip, 4 and 1 on the left, each at half
/// the handlebar length from the steer axis.
pub fn handlebar_torque(series: &TimeSeries, config: &PerturbationConfig) -> Result<(Vec<f64>, Vec<f64>)> {
    let arm = config.handlebar_length / 2.0;
    let (f1, f2, f3, f4) = (
        series.column("force1")?,
        series.column("force2")?,
        series.column("force3")?,
        series.column("force4")?,
    );
    let (des13, des24) = (series.column("desforce13")?, series.column("desforce24")?);

    let measured = (0..series.len())
        .map(|i| ((f2[i] - f3[i]) + (f4[i] - f1[i])) * arm)
        .collect();
    let desired = des13
        .iter()
        .zip(des24)
        .map(|(d13, d24)| (d24 - d13) * 2.0 * arm)
        .collect();
    Ok((measured, desired))
}

/// "Clockwise perturbation of 50 N" style title from the larger desired force.
pub fn figure_title(series: &TimeSeries) -> Result<String> {
    let max = |name| -> Result<f64> {
        Ok(series.column(name)?.iter().cloned().fold(f64::NEG_INFINITY, f64::max))
    };
    let (max13, max24) = (max("desforce13")?, max("desforce24")?);
    let (direction, peak) = if max13 > max24 {
        ("Clockwise", max13)
    } else {
        ("Counterclockwise", max24)
    };
    Ok(format!("{direction} perturbation of {peak} N"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f64 = 0.01;

    /// 300 samples at 100 Hz with a 50 N block on `desforce13` over rows
    /// 50..100 and on `desforce24` over rows 180..240.
    fn recording() -> TimeSeries {
        let n = 300;
        let times: Vec<f64> = (0..n).map(|i| i as f64 * DT).collect();
        let block = |lo, hi| -> Vec<f64> {
            (0..n).map(|i| if (lo..hi).contains(&i) { 50.0 } else { 3.0 }).collect()
        };
        let roll: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
        TimeSeries::from_columns([
            (TIME_COLUMN, times),
            ("desforce13", block(50, 100)),
            ("desforce24", block(180, 240)),
            ("roll_angle", roll),
            ("speed", vec![2.0; n]),
        ])
        .unwrap()
    }

    #[test]
    fn test_perturbation_indices() {
        let blocks = perturbation_indices(&recording(), &PerturbationConfig::default()).unwrap();
        assert_eq!(blocks, vec![(50, 100), (180, 240)]);
    }

    #[test]
    fn test_short_blocks_are_glitches() {
        let mut data = recording();
        let mut force = data.column("desforce13").unwrap().to_vec();
        for f in &mut force[10..20] {
            *f = 40.0;
        }
        data.insert("desforce13", force).unwrap();

        let blocks = perturbation_indices(&data, &PerturbationConfig::default()).unwrap();
        assert_eq!(blocks, vec![(50, 100), (180, 240)]);

        let relaxed = PerturbationConfig::default().with_min_samples(5);
        let blocks = perturbation_indices(&data, &relaxed).unwrap();
        assert_eq!(blocks, vec![(10, 20), (50, 100), (180, 240)]);
    }

    #[test]
    fn test_unterminated_block_dropped() {
        let mut data = recording();
        let mut force = data.column("desforce13").unwrap().to_vec();
        for f in &mut force[260..] {
            *f = 40.0;
        }
        data.insert("desforce13", force).unwrap();
        let blocks = perturbation_indices(&data, &PerturbationConfig::default()).unwrap();
        assert_eq!(blocks, vec![(50, 100), (180, 240)]);
    }

    #[test]
    fn test_closest_index() {
        let times = [0.0, 0.1, 0.2, 0.3];
        assert_eq!(closest_index(-1.0, &times), Some(0));
        assert_eq!(closest_index(0.04, &times), Some(0));
        assert_eq!(closest_index(0.06, &times), Some(1));
        assert_eq!(closest_index(0.2, &times), Some(2));
        assert_eq!(closest_index(9.0, &times), Some(3));
        assert_eq!(closest_index(1.0, &[]), None);
    }

    #[test]
    fn test_context_windows() {
        let data = recording();
        let windows = context_around_perturbation(&data, &[(50, 100), (180, 240)], &PerturbationConfig::default())
            .unwrap();
        // 0.3 s before, 2.0 s after (clamped to the last sample)
        assert_eq!(windows, vec![(20, 299), (150, 299)]);

        let short = PerturbationConfig::default().with_context(0.1, 0.5);
        let windows = context_around_perturbation(&data, &[(50, 100)], &short).unwrap();
        assert_eq!(windows, vec![(40, 150)]);
    }

    #[test]
    fn test_get_perturbations_rezeroes_and_flips() {
        let config = PerturbationConfig::default().with_context(0.1, 0.2);
        let perturbations = get_perturbations(&recording(), &config).unwrap();
        assert_eq!(perturbations.len(), 2);

        let cw = &perturbations[0];
        assert!(!cw.flipped);
        assert_eq!(cw.series.len(), 120 - 40);
        assert_relative_eq!(cw.series.times().unwrap()[0], -0.1, epsilon = 1e-9);
        assert_relative_eq!(cw.series.times().unwrap()[10], 0.0, epsilon = 1e-9);
        assert_relative_eq!(cw.series.column("roll_angle").unwrap()[0], 4.0, epsilon = 1e-9);

        let ccw = &perturbations[1];
        assert!(ccw.flipped);
        let roll = ccw.series.column("roll_angle").unwrap();
        let original = ccw.series.column("roll_angle_original").unwrap();
        assert_relative_eq!(roll[0], -17.0, epsilon = 1e-9);
        assert_relative_eq!(original[0], 17.0, epsilon = 1e-9);
        // unmarked channels are never mirrored
        assert_eq!(ccw.series.column("speed").unwrap()[0], 2.0);
        assert!(!ccw.series.has_column("speed_original"));
    }

    #[test]
    fn test_handlebar_torque() {
        let series = TimeSeries::from_columns([
            ("force1", vec![1.0]),
            ("force2", vec![10.0]),
            ("force3", vec![2.0]),
            ("force4", vec![6.0]),
            ("desforce13", vec![3.0]),
            ("desforce24", vec![13.0]),
        ])
        .unwrap();
        let (measured, desired) = handlebar_torque(&series, &PerturbationConfig::default()).unwrap();
        // ((10 - 2) + (6 - 1)) * 0.41
        assert_relative_eq!(measured[0], 13.0 * 0.41, epsilon = 1e-12);
        assert_relative_eq!(desired[0], 10.0 * 0.82, epsilon = 1e-12);
    }

    #[test]
    fn test_figure_title() {
        let data = recording();
        assert_eq!(
            figure_title(&data.slice(0..150)).unwrap(),
            "Clockwise perturbation of 50 N"
        );
        assert_eq!(
            figure_title(&data.slice(150..300)).unwrap(),
            "Counterclockwise perturbation of 50 N"
        );
    }

    #[test]
    fn test_perturbation_accessors() {
        let config = PerturbationConfig::default();
        let perturbations = get_perturbations(&recording(), &config).unwrap();
        let p = &perturbations[0];

        assert!(!p.balance_assist_on());
        assert_eq!(p.motor_torque(&config), None);
        let (mean, std) = p.speed_stats().unwrap();
        assert_relative_eq!(mean, 2.0);
        assert_relative_eq!(std, 0.0);
        assert!(p.is_plausible(&config).unwrap());

        let mut series = p.series.clone();
        series.insert("motor_current", vec![10.0; series.len()]).unwrap();
        let assisted = Perturbation { series, ..p.clone() };
        assert!(assisted.balance_assist_on());
        assert_eq!(assisted.motor_torque(&config).unwrap()[0], 2.0);
    }

    #[test]
    fn test_mean_std() {
        let (mean, std) = mean_std(&[1.0, 2.0, 3.0, 4.0]);
        assert_relative_eq!(mean, 2.5);
        assert_relative_eq!(std, 1.2909944487358056, epsilon = 1e-12);
    }
}
