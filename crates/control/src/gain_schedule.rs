use simcore::{ConfigurationError, Result};

/// Speed-scheduled steer-rate gain of the balance-assist controller.
///
/// Zero at standstill, a linear ramp up to `v_min`, then decreasing linearly
/// to zero at `v_max`, above which the bicycle is left uncontrolled:
///
/// ```text
/// v <= 0             0
/// 0 < v < v_min      static_gain * (v_max - v_min) * v / v_min
/// v_min <= v < v_max static_gain * (v_max - v)
/// v >= v_max         0
/// ```
pub fn generate_gains(static_gain: f64, speeds: &[f64], v_min: f64, v_max: f64) -> Result<Vec<f64>> {
    if !static_gain.is_finite() {
        return Err(ConfigurationError::invalid("static_gain", format!("{static_gain} is not finite")).into());
    }
    if !(v_min.is_finite() && v_max.is_finite() && 0.0 < v_min && v_min < v_max) {
        return Err(ConfigurationError::invalid(
            "v_min",
            format!("need 0 < v_min < v_max, got v_min = {v_min}, v_max = {v_max}"),
        )
        .into());
    }

    Ok(speeds
        .iter()
        .map(|&v| {
            if v <= 0.0 || v >= v_max {
                0.0
            } else if v < v_min {
                static_gain * (v_max - v_min) * v / v_min
            } else {
                static_gain * (v_max - v)
            }
        })
        .collect())
}
