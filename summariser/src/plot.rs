use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;
use plotters::prelude::*;

use crate::aggregator::{ScenarioSummary, SeriesPoint};
use crate::filter::charted_workloads;
use crate::frame::{CPU, MEM, NET_IO_RX_PER_S, NET_IO_TX_PER_S};

const CHART_SIZE: (u32, u32) = (1280, 720);
const ERROR_BAR_WIDTH: u32 = 6;

/// What to draw for one metric.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSpec {
    pub metric: String,
    pub title: String,
    pub y_desc: String,
}

impl PlotSpec {
    pub fn new(
        metric: impl Into<String>,
        title: impl Into<String>,
        y_desc: impl Into<String>,
    ) -> Self {
        Self {
            metric: metric.into(),
            title: title.into(),
            y_desc: y_desc.into(),
        }
    }

    /// The chart of a metric that has error bars, titled after the scenario.
    pub fn for_metric(scenario: &str, metric: &str) -> Option<Self> {
        let (what, y_desc) = match metric {
            CPU => ("CPU usage", "CPU (%)"),
            MEM => ("Memory usage", "Memory (MiB)"),
            NET_IO_TX_PER_S => ("Network transmit rate", "Transmitted (B/s)"),
            NET_IO_RX_PER_S => ("Network receive rate", "Received (B/s)"),
            _ => return None,
        };
        Some(Self::new(metric, format!("{scenario} {what}"), y_desc))
    }
}

/// Turn a chart title into a file name.
pub fn sanitize_title(title: &str) -> String {
    title
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_whitespace() => '_',
            '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// The series to draw, one per workload that is not excluded, in name order.
pub fn chart_series(
    summary: &ScenarioSummary,
    metric: &str,
    excluded: &[String],
) -> anyhow::Result<Vec<(String, Vec<SeriesPoint>)>> {
    charted_workloads(summary.workloads()?, excluded)
        .into_iter()
        .map(|name| {
            let points = summary
                .workload_series(&name, metric)
                .with_context(|| format!("Series of {metric} for {name}"))?;
            Ok::<_, anyhow::Error>((name, points))
        })
        .collect()
}

/// Where the chart of `spec` is saved: `<sanitized title>.png` in `output_dir`.
pub fn chart_path(output_dir: &Path, spec: &PlotSpec) -> PathBuf {
    output_dir.join(format!("{}.png", sanitize_title(&spec.title)))
}

/// Draw a line per workload with its error bars and save it to [chart_path].
pub fn plot_metric(
    summary: &ScenarioSummary,
    spec: &PlotSpec,
    excluded: &[String],
    output_dir: &Path,
) -> anyhow::Result<PathBuf> {
    let series = chart_series(summary, &spec.metric, excluded)?;
    if series.is_empty() {
        anyhow::bail!("No workload left to plot for {}", spec.title);
    }

    let path = chart_path(output_dir, spec);
    debug!("Plotting {} to {}", spec.metric, path.display());
    draw_chart(&path, spec, &series).with_context(|| format!("Saving {}", path.display()))?;

    Ok(path)
}

fn draw_chart(
    path: &Path,
    spec: &PlotSpec,
    series: &[(String, Vec<SeriesPoint>)],
) -> anyhow::Result<()> {
    let (x_range, y_range) = chart_ranges(series);

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&spec.title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(x_range, y_range)?;

    chart
        .configure_mesh()
        .x_desc("Time since start (s)")
        .y_desc(spec.y_desc.as_str())
        .draw()?;

    for (idx, (name, points)) in series.iter().enumerate() {
        let color = Palette99::pick(idx).to_rgba();

        chart
            .draw_series(LineSeries::new(
                points.iter().map(|p| (p.x, p.y)),
                color.stroke_width(2),
            ))?
            .label(name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));

        chart.draw_series(points.iter().filter(|p| p.err.is_finite()).map(|p| {
            ErrorBar::new_vertical(
                p.x,
                p.y - p.err,
                p.y,
                p.y + p.err,
                color.filled(),
                ERROR_BAR_WIDTH,
            )
        }))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Axis ranges covering every point and error bar, never empty.
fn chart_ranges(series: &[(String, Vec<SeriesPoint>)]) -> (Range<f64>, Range<f64>) {
    let points = || series.iter().flat_map(|(_, points)| points.iter());

    let x_max = points().map(|p| p.x).filter(|x| x.is_finite()).fold(0.0, f64::max);
    let (y_min, y_max) = points()
        .flat_map(|p| {
            let err = if p.err.is_finite() { p.err } else { 0.0 };
            [p.y - err, p.y + err]
        })
        .filter(|y| y.is_finite())
        .fold((0.0f64, 0.0f64), |(lo, hi), y| (lo.min(y), hi.max(y)));

    let x_max = if x_max > 0.0 { x_max } else { 1.0 };
    let pad = if y_max > y_min { (y_max - y_min) * 0.05 } else { 1.0 };

    (0.0..x_max, (y_min - pad)..(y_max + pad))
}
