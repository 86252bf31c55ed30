//! Static Chart Renderer
//! Writes the utilization chart to a PNG file with plotters.
//!
//! Layout matches the interactive chart: fiscal years along the x axis,
//! utilization percent on the y axis, a dashed 100% capacity line and one
//! colored line per selected series.

use crate::charts::plotter::{contiguous_runs, SUGGESTED_MAX};
use crate::gui::ChartSeries;
use crate::stats::CAPACITY_PERCENT;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to render")]
    Empty,
    #[error("Chart drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

const CAPACITY_RED: RGBColor = RGBColor(220, 53, 69);

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the selected series to a PNG at `path`.
    pub fn render_png(
        series: &[ChartSeries],
        years: &[String],
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        if series.is_empty() || years.is_empty() {
            return Err(RenderError::Empty);
        }

        let root = BitMapBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE).map_err(draw_err)?;

        let y_max = series
            .iter()
            .flat_map(|s| s.points.iter().flatten())
            .map(|&v| f64::from(v) + 10.0)
            .fold(SUGGESTED_MAX, f64::max);
        let x_range = -0.5..(years.len() as f64 - 0.5);

        let mut chart = ChartBuilder::on(&root)
            .caption("Utilization by Fiscal Year", ("sans-serif", 24))
            .margin(20)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(x_range.clone(), 0f64..y_max)
            .map_err(draw_err)?;

        let year_label = |x: &f64| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            years.get(idx as usize).cloned().unwrap_or_default()
        };

        chart
            .configure_mesh()
            .x_labels(years.len() * 2 + 1)
            .x_label_formatter(&year_label)
            .y_label_formatter(&|y| format!("{:.0}%", y))
            .x_desc("Fiscal Year")
            .y_desc("Utilization (%)")
            .disable_x_mesh()
            .draw()
            .map_err(draw_err)?;

        let capacity = f64::from(CAPACITY_PERCENT);
        chart
            .draw_series(DashedLineSeries::new(
                vec![(x_range.start, capacity), (x_range.end, capacity)],
                6,
                4,
                CAPACITY_RED.stroke_width(1),
            ))
            .map_err(draw_err)?
            .label("100% Capacity")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 15, y)], CAPACITY_RED));

        for s in series {
            let color = RGBColor(s.color.r(), s.color.g(), s.color.b());
            let runs = contiguous_runs(&s.points);

            for run in &runs {
                chart
                    .draw_series(LineSeries::new(
                        run.iter().map(|&[x, y]| (x, y)),
                        color.stroke_width(2),
                    ))
                    .map_err(draw_err)?;
            }

            chart
                .draw_series(
                    runs.iter()
                        .flatten()
                        .map(|&[x, y]| Circle::new((x, y), 4, color.filled())),
                )
                .map_err(draw_err)?
                .label(s.label.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(draw_err)?;

        root.present().map_err(draw_err)?;
        log::info!("Chart image written to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_empty_chart() {
        let dir = tempfile::tempdir().unwrap();
        let result = StaticChartRenderer::render_png(
            &[],
            &["FY26".to_string()],
            &dir.path().join("chart.png"),
            (800, 600),
        );
        assert!(matches!(result, Err(RenderError::Empty)));
    }
}
