//! Enrollment Viewer Main Application
//! Main window with control panel and the table, chart and map views.

use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{source_for, DataStore, FileSource, SharedLoad};
use crate::export::write_table_csv;
use crate::gui::{ChartView, ControlPanel, ControlPanelAction, MapView, TableView, View};
use egui::{RichText, SidePanel};
use futures::FutureExt;
use std::path::Path;
use std::time::Duration;

const CHART_EXPORT_SIZE: (u32, u32) = (1400, 900);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Table,
    Chart,
    Map,
}

impl Tab {
    fn label(self) -> &'static str {
        match self {
            Tab::Table => "📋 Table",
            Tab::Chart => "📈 Chart",
            Tab::Map => "🗺 Map",
        }
    }
}

/// The views enabled at startup.
struct Views {
    table: Option<TableView>,
    chart: Option<ChartView>,
    map: Option<MapView>,
}

impl Views {
    fn from_config(config: &AppConfig) -> Self {
        Self {
            table: config.views.table.then(TableView::new),
            chart: config.views.chart.then(ChartView::new),
            map: config.views.map.then(|| MapView::new(config.map.clone())),
        }
    }

    fn tabs(&self) -> Vec<Tab> {
        let mut tabs = Vec::new();
        if self.table.is_some() {
            tabs.push(Tab::Table);
        }
        if self.chart.is_some() {
            tabs.push(Tab::Chart);
        }
        if self.map.is_some() {
            tabs.push(Tab::Map);
        }
        tabs
    }

    fn all_mut(&mut self) -> Vec<&mut dyn View> {
        let mut views: Vec<&mut dyn View> = Vec::new();
        if let Some(view) = self.table.as_mut() {
            views.push(view);
        }
        if let Some(view) = self.chart.as_mut() {
            views.push(view);
        }
        if let Some(view) = self.map.as_mut() {
            views.push(view);
        }
        views
    }

    fn get_mut(&mut self, tab: Tab) -> Option<&mut dyn View> {
        match tab {
            Tab::Table => self.table.as_mut().map(|v| v as &mut dyn View),
            Tab::Chart => self.chart.as_mut().map(|v| v as &mut dyn View),
            Tab::Map => self.map.as_mut().map(|v| v as &mut dyn View),
        }
    }
}

/// Year shown at startup: the configured one when the dataset declares it,
/// otherwise the most recent declared year.
fn choose_year(years: &[String], configured: Option<&str>) -> Option<String> {
    if let Some(wanted) = configured {
        if years.iter().any(|y| y == wanted) {
            return Some(wanted.to_string());
        }
        log::warn!("Configured year {} is not in the dataset", wanted);
    }
    years.last().cloned()
}

/// Main application window.
pub struct EnrollmentApp {
    config: AppConfig,
    store: DataStore,
    pending: Option<SharedLoad>,
    control_panel: ControlPanel,
    views: Views,
    active_tab: Option<Tab>,
    current_year: Option<String>,
}

impl EnrollmentApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let store = DataStore::new(source_for(&config.data_source));
        let views = Views::from_config(&config);
        let active_tab = views.tabs().first().copied();

        let mut app = Self {
            config,
            store,
            pending: None,
            control_panel: ControlPanel::new(),
            views,
            active_tab,
            current_year: None,
        };
        app.start_load();
        app
    }

    fn start_load(&mut self) {
        self.control_panel.source = self.store.location();
        self.control_panel.is_loading = true;
        self.control_panel.load_failed = false;
        self.control_panel.set_status("Loading school data...");
        self.pending = Some(self.store.load());
    }

    /// Check whether the pending load has finished.
    fn poll_load(&mut self) {
        let Some(pending) = self.pending.clone() else {
            return;
        };

        match pending.now_or_never() {
            Some(Ok(_)) => {
                self.pending = None;
                self.control_panel.is_loading = false;
                self.on_data_ready();
            }
            Some(Err(e)) => {
                self.pending = None;
                self.control_panel.is_loading = false;
                self.control_panel.load_failed = true;
                self.control_panel.set_status(&format!("Error: {}", e));
            }
            None => {}
        }
    }

    /// Populate the year selector and initialise every enabled view.
    fn on_data_ready(&mut self) {
        let years = self.store.years();
        let year = choose_year(&years, self.config.default_year.as_deref());

        for view in self.views.all_mut() {
            if let Err(e) = view.init(&self.store) {
                log::error!("{} view failed to initialise: {}", view.title(), e);
            }
        }
        self.control_panel.set_years(years, year.clone());

        match year {
            Some(year) => self.change_year(&year),
            None => {
                self.current_year = None;
                self.control_panel.set_status("Dataset declares no years");
            }
        }

        if let Some(dataset) = self.store.dataset() {
            self.control_panel.set_status(&format!(
                "Loaded {} schools, {} clusters",
                dataset.schools.len(),
                dataset.clusters.len()
            ));
        }
    }

    /// Fan the year out to every view; a failing view does not stop the rest.
    fn change_year(&mut self, year: &str) {
        log::info!("Selected year {}", year);
        self.current_year = Some(year.to_string());

        for view in self.views.all_mut() {
            if let Err(e) = view.set_year(&self.store, year) {
                log::error!("{} view failed to update for {}: {}", view.title(), year, e);
            }
        }
        self.refresh_export_state();
    }

    fn refresh_export_state(&mut self) {
        self.control_panel.can_export_table = self
            .views
            .table
            .as_ref()
            .is_some_and(|t| t.model().is_some());
        self.control_panel.can_export_chart = self
            .views
            .chart
            .as_ref()
            .is_some_and(|c| !c.series().is_empty());
    }

    /// Replace the data source with a file picked by the user.
    fn handle_open_dataset(&mut self) {
        if self.store.is_loading() {
            return;
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("JSON Files", &["json"])
            .pick_file()
        else {
            return;
        };

        log::info!("Opening dataset {}", path.display());
        self.store = DataStore::new(Box::new(FileSource::new(path)));
        self.views = Views::from_config(&self.config);
        self.current_year = None;
        self.control_panel.clear_years();
        self.refresh_export_state();
        self.start_load();
    }

    fn handle_export_table(&mut self) {
        let Some(model) = self.views.table.as_ref().and_then(|t| t.model()) else {
            self.control_panel.set_status("No table to export");
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .set_file_name(format!("utilization_{}.csv", model.year))
            .save_file()
        else {
            return;
        };

        match write_table_csv(model, &path) {
            Ok(()) => {
                self.control_panel
                    .set_status(&format!("Table exported to {}", path.display()));
                open_exported(&path);
            }
            Err(e) => {
                log::error!("Table export failed: {}", e);
                self.control_panel.set_status(&format!("Export error: {}", e));
            }
        }
    }

    fn handle_export_chart(&mut self) {
        let Some(chart) = self.views.chart.as_ref() else {
            return;
        };

        let Some(path) = rfd::FileDialog::new()
            .add_filter("PNG Image", &["png"])
            .set_file_name("utilization_chart.png")
            .save_file()
        else {
            return;
        };

        match StaticChartRenderer::render_png(chart.series(), chart.years(), &path, CHART_EXPORT_SIZE)
        {
            Ok(()) => {
                self.control_panel
                    .set_status(&format!("Chart exported to {}", path.display()));
                open_exported(&path);
            }
            Err(e) => {
                log::error!("Chart export failed: {}", e);
                self.control_panel.set_status(&format!("Export error: {}", e));
            }
        }
    }

    fn handle_action(&mut self, action: ControlPanelAction) {
        match action {
            ControlPanelAction::OpenDataset => self.handle_open_dataset(),
            ControlPanelAction::Retry => self.start_load(),
            ControlPanelAction::YearChanged(year) => self.change_year(&year),
            ControlPanelAction::ExportTableCsv => self.handle_export_table(),
            ControlPanelAction::ExportChartPng => self.handle_export_chart(),
            ControlPanelAction::None => {}
        }
    }

    fn show_tabs(&mut self, ui: &mut egui::Ui) {
        let tabs = self.views.tabs();
        ui.horizontal(|ui| {
            for tab in tabs {
                let selected = self.active_tab == Some(tab);
                if ui
                    .selectable_label(selected, RichText::new(tab.label()).size(15.0))
                    .clicked()
                    && !selected
                {
                    log::debug!("Switched to {:?} tab", tab);
                    self.active_tab = Some(tab);
                }
            }
        });
    }
}

fn open_exported(path: &Path) {
    if let Err(e) = open::that(path) {
        log::warn!("Could not open {}: {}", path.display(), e);
    }
}

impl eframe::App for EnrollmentApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.poll_load();

        // The fetch thread cannot wake egui, so poll again shortly
        if self.pending.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(240.0)
            .max_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);
                    self.handle_action(action);
                });
            });

        // Central panel - active view
        egui::CentralPanel::default().show(ctx, |ui| {
            if self.control_panel.is_loading {
                ui.centered_and_justified(|ui| {
                    ui.spinner();
                });
                return;
            }

            if !self.store.is_ready() {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
                return;
            }

            self.show_tabs(ui);
            ui.separator();

            let Some(tab) = self.active_tab else {
                ui.label("All views are disabled");
                return;
            };
            if let Some(view) = self.views.get_mut(tab) {
                view.show(ui, &self.store);
            }
        });

        self.refresh_export_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn years() -> Vec<String> {
        vec!["FY24".to_string(), "FY25".to_string(), "FY26".to_string()]
    }

    #[test]
    fn defaults_to_last_year() {
        assert_eq!(choose_year(&years(), None), Some("FY26".to_string()));
    }

    #[test]
    fn configured_year_wins_when_declared() {
        assert_eq!(
            choose_year(&years(), Some("FY25")),
            Some("FY25".to_string())
        );
        assert_eq!(
            choose_year(&years(), Some("FY99")),
            Some("FY26".to_string())
        );
    }

    #[test]
    fn no_years_no_selection() {
        assert_eq!(choose_year(&[], Some("FY25")), None);
    }

    #[test]
    fn tabs_follow_enabled_views() {
        let mut config = AppConfig::default();
        config.views.chart = false;
        let views = Views::from_config(&config);
        assert_eq!(views.tabs(), vec![Tab::Table, Tab::Map]);

        config.views.table = false;
        config.views.map = false;
        assert!(Views::from_config(&config).tabs().is_empty());
    }

    #[test]
    fn year_change_reaches_every_view() {
        let store = crate::data::testing::district_store();
        let mut views = Views::from_config(&AppConfig::default());
        for view in views.all_mut() {
            view.init(&store).unwrap();
            view.set_year(&store, "FY24").unwrap();
        }

        assert_eq!(views.table.as_ref().unwrap().model().unwrap().year, "FY24");
        assert!(!views.chart.as_ref().unwrap().series().is_empty());
        assert!(!views.map.as_ref().unwrap().markers().is_empty());
    }
}
