//! Stacked line and scatter panels rendered to PNG.

use std::error::Error;
use std::ops::Range;
use std::path::Path;

use plotters::coord::Shift;
use plotters::prelude::*;

pub type PlotResult<T> = Result<T, Box<dyn Error>>;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

pub const GREY: RGBColor = RGBColor(128, 128, 128);
pub const LIGHT_STEEL_BLUE: RGBColor = RGBColor(176, 196, 222);
pub const LIGHT_CORAL: RGBColor = RGBColor(240, 128, 128);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Line,
    Dots,
    /// Large filled circles for individual points.
    Markers,
}

/// One data set drawn on a panel.
#[derive(Debug, Clone)]
pub struct Trace<'a> {
    pub x: &'a [f64],
    pub y: &'a [f64],
    pub color: RGBAColor,
    pub mark: Mark,
    pub label: Option<String>,
}

impl<'a> Trace<'a> {
    pub fn line(x: &'a [f64], y: &'a [f64], color: impl Color) -> Self {
        Self {
            x,
            y,
            color: color.to_rgba(),
            mark: Mark::Line,
            label: None,
        }
    }

    pub fn dots(x: &'a [f64], y: &'a [f64], color: impl Color) -> Self {
        Self {
            mark: Mark::Dots,
            ..Self::line(x, y, color)
        }
    }

    pub fn markers(x: &'a [f64], y: &'a [f64], color: impl Color) -> Self {
        Self {
            mark: Mark::Markers,
            ..Self::line(x, y, color)
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// A panel: traces plus guide lines and shaded bands.
#[derive(Debug, Clone, Default)]
pub struct Axes<'a> {
    pub caption: Option<String>,
    pub x_desc: String,
    pub y_desc: String,
    pub traces: Vec<Trace<'a>>,
    pub vlines: Vec<f64>,
    pub hlines: Vec<f64>,
    /// Shaded x interval spanning the full height.
    pub x_band: Option<(f64, f64)>,
    /// Shaded y interval spanning the full width.
    pub y_band: Option<(f64, f64)>,
    /// Fixed y limits; fitted to the data otherwise.
    pub y_range: Option<(f64, f64)>,
}

impl<'a> Axes<'a> {
    pub fn new(x_desc: impl Into<String>, y_desc: impl Into<String>) -> Self {
        Self {
            x_desc: x_desc.into(),
            y_desc: y_desc.into(),
            ..Default::default()
        }
    }

    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    pub fn with_trace(mut self, trace: Trace<'a>) -> Self {
        self.traces.push(trace);
        self
    }

    pub fn with_vlines(mut self, xs: &[f64]) -> Self {
        self.vlines.extend_from_slice(xs);
        self
    }

    pub fn with_hlines(mut self, ys: &[f64]) -> Self {
        self.hlines.extend_from_slice(ys);
        self
    }

    pub fn with_x_band(mut self, lo: f64, hi: f64) -> Self {
        self.x_band = Some((lo, hi));
        self
    }

    pub fn with_y_band(mut self, lo: f64, hi: f64) -> Self {
        self.y_band = Some((lo, hi));
        self
    }

    pub fn with_y_range(mut self, lo: f64, hi: f64) -> Self {
        self.y_range = Some((lo, hi));
        self
    }

    fn x_range(&self) -> Range<f64> {
        let data = self.traces.iter().flat_map(|t| t.x.iter().copied());
        let guides = self.vlines.iter().copied();
        let (lo, hi) = bounds(data.chain(guides)).unwrap_or((0.0, 1.0));
        widen(lo, hi, 0.0)
    }

    fn y_range(&self) -> Range<f64> {
        if let Some((lo, hi)) = self.y_range {
            return lo..hi;
        }
        let data = self.traces.iter().flat_map(|t| t.y.iter().copied());
        let guides = self.hlines.iter().copied();
        let band = self.y_band.into_iter().flat_map(|(lo, hi)| [lo, hi]);
        let (lo, hi) = bounds(data.chain(guides).chain(band)).unwrap_or((-1.0, 1.0));
        widen(lo, hi, 0.05)
    }
}

/// Smallest and largest finite value.
pub fn bounds(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Pads `[lo, hi]` by `fraction` of its span; a degenerate span gets +-1.
fn widen(lo: f64, hi: f64, fraction: f64) -> Range<f64> {
    let span = hi - lo;
    if span <= f64::EPSILON * lo.abs().max(hi.abs()).max(1.0) {
        return (lo - 1.0)..(hi + 1.0);
    }
    (lo - fraction * span)..(hi + fraction * span)
}

fn draw_axes(area: &Area<'_>, axes: &Axes<'_>) -> PlotResult<()> {
    let x_range = axes.x_range();
    let y_range = axes.y_range();

    let mut builder = ChartBuilder::on(area);
    builder.margin(10).x_label_area_size(40).y_label_area_size(60);
    if let Some(caption) = &axes.caption {
        builder.caption(caption, ("Arial", 20));
    }
    let mut chart = builder.build_cartesian_2d(x_range.clone(), y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc(axes.x_desc.as_str())
        .y_desc(axes.y_desc.as_str())
        .draw()?;

    if let Some((lo, hi)) = axes.x_band {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(lo, y_range.start), (hi, y_range.end)],
            GREEN.mix(0.3).filled(),
        )))?;
    }
    if let Some((lo, hi)) = axes.y_band {
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x_range.start, lo), (x_range.end, hi)],
            BLACK.mix(0.2).filled(),
        )))?;
    }
    for &x in &axes.vlines {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x, y_range.start), (x, y_range.end)],
            BLACK.mix(0.6),
        )))?;
    }
    for &y in &axes.hlines {
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(x_range.start, y), (x_range.end, y)],
            GREY,
        )))?;
    }

    let mut has_labels = false;
    for trace in &axes.traces {
        let color = trace.color;
        let points = trace
            .x
            .iter()
            .zip(trace.y)
            .map(|(x, y)| (*x, *y))
            .filter(|(x, y)| x.is_finite() && y.is_finite());

        let annotation = match trace.mark {
            Mark::Line => chart.draw_series(LineSeries::new(points, color.stroke_width(2)))?,
            Mark::Dots => chart.draw_series(
                points
                    .filter(|(_, y)| y_range.contains(y))
                    .map(|p| Circle::new(p, 1, color.filled())),
            )?,
            Mark::Markers => chart.draw_series(points.map(|p| Circle::new(p, 6, color.filled())))?,
        };
        if let Some(label) = &trace.label {
            has_labels = true;
            annotation
                .label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }
    }

    if has_labels {
        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;
    }
    Ok(())
}

/// Renders `panels` stacked top to bottom into one PNG.
pub fn render(path: &Path, size: (u32, u32), title: Option<&str>, panels: &[Axes<'_>]) -> PlotResult<()> {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = match title {
        Some(title) => root.titled(title, ("Arial", 24))?,
        None => root,
    };

    let areas = root.split_evenly((panels.len().max(1), 1));
    for (area, axes) in areas.iter().zip(panels) {
        draw_axes(area, axes)?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_skip_non_finite() {
        assert_eq!(bounds([1.0, f64::NAN, -2.0, f64::INFINITY, 0.5]), Some((-2.0, 1.0)));
        assert_eq!(bounds([f64::NAN]), None);
    }

    #[test]
    fn test_widen() {
        assert_eq!(widen(0.0, 10.0, 0.1), -1.0..11.0);
        assert_eq!(widen(3.0, 3.0, 0.1), 2.0..4.0);
    }

    #[test]
    fn test_axes_ranges() {
        let x = [0.0, 1.0, 2.0];
        let y = [-1.0, 4.0, 1.0];
        let axes = Axes::new("t", "y")
            .with_trace(Trace::line(&x, &y, BLACK))
            .with_hlines(&[-6.0])
            .with_vlines(&[3.0]);
        assert_eq!(axes.x_range(), 0.0..3.0);
        assert_eq!(axes.y_range(), -6.5..4.5);

        let fixed = axes.with_y_range(-10.0, 10.0);
        assert_eq!(fixed.y_range(), -10.0..10.0);
    }

    #[test]
    fn test_trace_builders() {
        let x = [0.0];
        let trace = Trace::dots(&x, &x, RED).labeled("mode 0");
        assert_eq!(trace.mark, Mark::Dots);
        assert_eq!(trace.label.as_deref(), Some("mode 0"));
        assert_eq!(trace.color, RED.to_rgba());
    }
}
