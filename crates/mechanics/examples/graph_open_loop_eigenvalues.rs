use mechanics::{Meijaard2007Model, Meijaard2007ParameterSet};
use plotters::prelude::*;
use simcore::ParameterOverrides;

const MODE_COLORS: [RGBColor; 4] = [BLUE, RED, GREEN, MAGENTA];

fn draw_modes(
    filename: &str,
    title: &str,
    y_label: &str,
    speeds: &[f64],
    modes: &[Vec<f64>],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(filename, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let x_min = speeds.iter().cloned().fold(f64::INFINITY, f64::min);
    let x_max = speeds.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    // the capsize root runs off to -inf at low speed, clip to the useful window
    let y_min = -10.0;
    let y_max = modes
        .iter()
        .flatten()
        .cloned()
        .fold(f64::NEG_INFINITY, f64::max)
        .min(10.0);

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("Arial", 28))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart.configure_mesh().x_desc("Speed [m/s]").y_desc(y_label).draw()?;

    for (j, mode) in modes.iter().enumerate() {
        let color = MODE_COLORS[j % MODE_COLORS.len()];
        chart
            .draw_series(
                speeds
                    .iter()
                    .zip(mode)
                    .filter(|(_, y)| (y_min..=y_max).contains(*y))
                    .map(|(x, y)| Circle::new((*x, *y), 2, color.filled())),
            )?
            .label(format!("mode {j}"))
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.filled()));
    }

    chart.configure_series_labels().border_style(BLACK).draw()?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let model = Meijaard2007Model::new(Meijaard2007ParameterSet::benchmark());

    let n = 501;
    let speeds: Vec<f64> = (0..n).map(|i| 10.0 * i as f64 / (n - 1) as f64).collect();
    let sweep = model
        .calc_eigen(&ParameterOverrides::new().with_series("v", speeds.clone()))?
        .sorted();

    let real: Vec<Vec<f64>> = (0..4).map(|j| sweep.real_parts(j)).collect();
    let imag: Vec<Vec<f64>> = (0..4).map(|j| sweep.imaginary_parts(j)).collect();

    draw_modes(
        "open_loop_real_parts.png",
        "Benchmark Bicycle Eigenvalues (real part)",
        "Re(lambda) [1/s]",
        &speeds,
        &real,
    )?;
    draw_modes(
        "open_loop_imaginary_parts.png",
        "Benchmark Bicycle Eigenvalues (imaginary part)",
        "Im(lambda) [rad/s]",
        &speeds,
        &imag,
    )?;

    println!("Wrote plots: open_loop_real_parts.png, open_loop_imaginary_parts.png");

    Ok(())
}
