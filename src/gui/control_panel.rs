//! Control Panel Widget
//! Left side panel with data source, year selection, exports and status.

use crate::gui::theme::severity_color;
use crate::stats::Severity;
use egui::{Color32, ComboBox, RichText};

/// Left side control panel with data source and year controls.
pub struct ControlPanel {
    pub source: String,
    pub years: Vec<String>,
    pub selected_year: Option<String>,
    pub can_export_table: bool,
    pub can_export_chart: bool,
    pub is_loading: bool,
    pub load_failed: bool,
    pub status: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            source: String::new(),
            years: Vec::new(),
            selected_year: None,
            can_export_table: false,
            can_export_chart: false,
            is_loading: false,
            load_failed: false,
            status: "Ready".to_string(),
        }
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill the year selector after the dataset loads.
    pub fn set_years(&mut self, years: Vec<String>, selected: Option<String>) {
        self.years = years;
        self.selected_year = selected;
    }

    pub fn clear_years(&mut self) {
        self.years.clear();
        self.selected_year = None;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("🏫 Enrollment Viewer")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("School Utilization")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.label(RichText::new(&self.source).size(12.0));
                ui.horizontal(|ui| {
                    ui.add_enabled_ui(!self.is_loading, |ui| {
                        if ui.button("📂 Open").clicked() {
                            action = ControlPanelAction::OpenDataset;
                        }
                        if self.load_failed && ui.button("🔄 Retry").clicked() {
                            action = ControlPanelAction::Retry;
                        }
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Year Section =====
        ui.label(RichText::new("📅 Fiscal Year").size(14.0).strong());
        ui.add_space(8.0);

        ui.add_enabled_ui(!self.years.is_empty(), |ui| {
            let selected_text = self.selected_year.clone().unwrap_or_default();
            ComboBox::from_id_salt("year_selector")
                .width(150.0)
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for year in &self.years {
                        let is_selected = self.selected_year.as_deref() == Some(year.as_str());
                        if ui.selectable_label(is_selected, year).clicked() && !is_selected {
                            self.selected_year = Some(year.clone());
                            action = ControlPanelAction::YearChanged(year.clone());
                        }
                    }
                });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Legend Section =====
        ui.label(RichText::new("🎨 Utilization").size(14.0).strong());
        ui.add_space(5.0);
        for severity in [Severity::Low, Severity::Medium, Severity::High, Severity::Unknown] {
            ui.horizontal(|ui| {
                let (rect, _) =
                    ui.allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(rect, 3.0, severity_color(severity));
                ui.label(RichText::new(severity.label()).size(12.0));
            });
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.can_export_table, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Table CSV").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportTableCsv;
                }
            });

            ui.add_space(8.0);

            ui.add_enabled_ui(self.can_export_chart, |ui| {
                let button = egui::Button::new(RichText::new("🖼 Export Chart PNG").size(14.0))
                    .min_size(egui::vec2(180.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::ExportChartPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        if self.is_loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new(&self.status).size(11.0));
            });
        } else {
            let status_color = if self.load_failed || self.status.contains("Error") {
                Color32::from_rgb(220, 53, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        }

        action
    }

    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    OpenDataset,
    Retry,
    YearChanged(String),
    ExportTableCsv,
    ExportChartPng,
}
