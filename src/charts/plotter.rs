//! Chart Plotter Module
//! Interactive utilization line chart using egui_plot.

use crate::gui::theme::CAPACITY_LINE_COLOR;
use crate::gui::ChartSeries;
use crate::stats::CAPACITY_PERCENT;
use egui_plot::{HLine, Line, LineStyle, Plot, PlotPoints, Points, VLine};

/// Upper bound the y axis always shows, so the capacity line has headroom.
pub const SUGGESTED_MAX: f64 = 150.0;

/// Split a series into runs of consecutive defined values.
///
/// Each run is a list of `[year_index, utilization]` points; undefined
/// years break the line instead of being drawn as zero.
pub fn contiguous_runs(values: &[Option<u32>]) -> Vec<Vec<[f64; 2]>> {
    let mut runs = Vec::new();
    let mut current: Vec<[f64; 2]> = Vec::new();

    for (i, value) in values.iter().enumerate() {
        match value {
            Some(v) => current.push([i as f64, f64::from(*v)]),
            None => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Draws the utilization charts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw one line per series across the declared years.
    /// X-axis: fiscal year, Y-axis: utilization percent
    pub fn draw_utilization_chart(
        ui: &mut egui::Ui,
        series: &[ChartSeries],
        years: &[String],
        current_year: Option<usize>,
    ) {
        let x_labels = years.to_vec();
        let tooltip_labels = years.to_vec();
        let last_x = years.len().saturating_sub(1) as f64;

        Plot::new("utilization_chart")
            .height(ui.available_height().max(300.0))
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(SUGGESTED_MAX)
            .include_x(-0.25)
            .include_x(last_x + 0.25)
            .x_axis_label("Fiscal Year")
            .y_axis_label("Utilization (%)")
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() > f64::EPSILON || idx < 0.0 {
                    return String::new();
                }
                x_labels.get(idx as usize).cloned().unwrap_or_default()
            })
            .y_axis_formatter(|mark, _range| format!("{}%", mark.value))
            .label_formatter(move |name, value| {
                let year = tooltip_labels
                    .get(value.x.round().max(0.0) as usize)
                    .cloned()
                    .unwrap_or_default();
                if name.is_empty() {
                    format!("{}: {:.0}%", year, value.y)
                } else {
                    format!("{}\n{}: {:.0}%", name, year, value.y)
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.hline(
                    HLine::new(f64::from(CAPACITY_PERCENT))
                        .color(CAPACITY_LINE_COLOR)
                        .width(1.0)
                        .style(LineStyle::Dashed { length: 5.0 })
                        .name("100% Capacity"),
                );

                if let Some(idx) = current_year {
                    plot_ui.vline(
                        VLine::new(idx as f64)
                            .color(egui::Color32::GRAY)
                            .width(1.0)
                            .style(LineStyle::Dotted { spacing: 4.0 }),
                    );
                }

                for s in series {
                    let runs = contiguous_runs(&s.points);
                    for run in &runs {
                        plot_ui.line(
                            Line::new(PlotPoints::from_iter(run.iter().copied()))
                                .color(s.color)
                                .width(2.0)
                                .name(&s.label),
                        );
                    }
                    let points: Vec<[f64; 2]> = runs.into_iter().flatten().collect();
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points))
                            .radius(4.0)
                            .color(s.color)
                            .name(&s.label),
                    );
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_break_at_missing_years() {
        let runs = contiguous_runs(&[Some(80), Some(90), None, Some(101)]);
        assert_eq!(
            runs,
            vec![vec![[0.0, 80.0], [1.0, 90.0]], vec![[3.0, 101.0]]]
        );
    }

    #[test]
    fn empty_and_all_missing_have_no_runs() {
        assert!(contiguous_runs(&[]).is_empty());
        assert!(contiguous_runs(&[None, None]).is_empty());
    }

    #[test]
    fn full_series_is_one_run() {
        let runs = contiguous_runs(&[Some(1), Some(2), Some(3)]);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 3);
    }
}
