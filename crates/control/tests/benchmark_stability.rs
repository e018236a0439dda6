use control::{SteerControlModel, generate_gains, stable_ranges, weave_capsize_speeds};
use mechanics::Meijaard2007ParameterSet;
use simcore::{ConfigurationError, ParameterOverrides, SimError};

fn speeds() -> Vec<f64> {
    (0..1001).map(|i| i as f64 * 0.01).collect()
}

fn model() -> SteerControlModel {
    SteerControlModel::from_parameter_set(Meijaard2007ParameterSet::benchmark())
}

#[test]
fn uncontrolled_benchmark_weave_and_capsize_speeds() {
    let speeds = speeds();
    let sweep = model()
        .sorted_eigen(&ParameterOverrides::new().with_series("v", speeds.clone()))
        .unwrap();

    let ranges = stable_ranges(sweep.eigenvalues.view());
    assert_eq!(ranges.len(), 1, "ranges {ranges:?}");

    let (weave, capsize) = weave_capsize_speeds(&speeds, sweep.eigenvalues.view()).unwrap();
    assert!((weave - 4.29).abs() < 0.03, "weave speed {weave}");
    assert!((capsize - 6.02).abs() < 0.03, "capsize speed {capsize}");
}

#[test]
fn balance_assist_extends_stable_range_downwards() {
    let speeds = speeds();
    let open = model()
        .calc_eigen(&ParameterOverrides::new().with_series("v", speeds.clone()))
        .unwrap();
    let (weave, capsize) = weave_capsize_speeds(&speeds, open.eigenvalues.view()).unwrap();

    let kphidot = generate_gains(-10.0, &speeds, 1.0, weave).unwrap();
    let closed = model()
        .calc_eigen(
            &ParameterOverrides::new()
                .with_series("v", speeds.clone())
                .with_series("kphidot", kphidot),
        )
        .unwrap();

    let (low, high) = weave_capsize_speeds(&speeds, closed.eigenvalues.view()).unwrap();
    assert!(low < 1.5, "assisted lower bound {low}");
    assert!(low > 1.0, "assisted lower bound {low}");
    // above the weave speed the controller is off, capsize is unchanged
    assert!((high - capsize).abs() < 0.015);
}

#[test]
fn gain_series_mismatch_is_a_configuration_error() {
    let err = model()
        .form_state_space_matrices(
            &ParameterOverrides::new()
                .with_series("v", speeds())
                .with_series("kphidot", vec![-1.0; 10]),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        SimError::Configuration(ConfigurationError::LengthMismatch { expected: 10, actual: 1001, .. })
    ));
}
