//! Table View
//! One row per reporting school plus a district total, colored by severity.

use crate::data::DataStore;
use crate::gui::theme::severity_color;
use crate::gui::{ensure_year, View, ViewError};
use crate::stats::{format_utilization, Severity};
use egui::RichText;
use icu_collator::options::CollatorOptions;
use icu_collator::Collator;

pub const TOTAL_LABEL: &str = "District Total";

#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub name: String,
    pub enrollment: u64,
    pub capacity: Option<u64>,
    pub utilization: Option<u32>,
}

impl TableRow {
    pub fn severity(&self) -> Severity {
        Severity::classify(self.utilization)
    }
}

/// Rows for one year, sorted by school name.
#[derive(Debug, Clone, PartialEq)]
pub struct TableModel {
    pub year: String,
    pub rows: Vec<TableRow>,
    pub totals: TableRow,
}

impl TableModel {
    pub fn build(store: &DataStore, year: &str) -> Self {
        let mut rows: Vec<TableRow> = store
            .schools_for_year(year)
            .into_iter()
            .map(|entry| TableRow {
                utilization: entry.utilization(),
                name: entry.school.name,
                enrollment: u64::from(entry.enrollment),
                capacity: entry.school.capacity.map(u64::from),
            })
            .collect();
        sort_by_name(&mut rows);

        let aggregate = store.aggregate(year);
        let totals = TableRow {
            name: TOTAL_LABEL.to_string(),
            enrollment: aggregate.total_enrollment,
            capacity: Some(aggregate.total_capacity),
            utilization: aggregate.utilization,
        };

        Self {
            year: year.to_string(),
            rows,
            totals,
        }
    }
}

/// Collation order of the root locale, ties broken by exact comparison.
fn sort_by_name(rows: &mut [TableRow]) {
    match Collator::try_new(Default::default(), CollatorOptions::default()) {
        Ok(collator) => rows.sort_by(|a, b| {
            collator
                .compare(&a.name, &b.name)
                .then_with(|| a.name.cmp(&b.name))
        }),
        Err(e) => {
            log::warn!("Collation data unavailable, sorting by code point: {}", e);
            rows.sort_by(|a, b| a.name.cmp(&b.name));
        }
    }
}

#[derive(Default)]
pub struct TableView {
    model: Option<TableModel>,
}

impl TableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(&self) -> Option<&TableModel> {
        self.model.as_ref()
    }

    fn draw_row(ui: &mut egui::Ui, row: &TableRow, strong: bool) {
        let text = |s: String| {
            let rt = RichText::new(s).size(13.0);
            if strong {
                rt.strong()
            } else {
                rt
            }
        };

        ui.label(text(row.name.clone()));
        ui.label(text(row.enrollment.to_string()));
        ui.label(text(
            row.capacity
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
        ui.label(
            text(format_utilization(row.utilization)).color(severity_color(row.severity())),
        );
        ui.end_row();
    }
}

impl View for TableView {
    fn title(&self) -> &'static str {
        "Table"
    }

    fn init(&mut self, _store: &DataStore) -> Result<(), ViewError> {
        self.model = None;
        Ok(())
    }

    fn set_year(&mut self, store: &DataStore, year: &str) -> Result<(), ViewError> {
        self.model = None;
        ensure_year(store, year)?;
        self.model = Some(TableModel::build(store, year));
        Ok(())
    }

    fn show(&mut self, ui: &mut egui::Ui, _store: &DataStore) {
        let Some(model) = &self.model else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ui.label(
            RichText::new(format!("School Utilization, {}", model.year))
                .size(18.0)
                .strong(),
        );
        ui.add_space(8.0);

        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                egui::Frame::none()
                    .fill(ui.visuals().widgets.noninteractive.bg_fill)
                    .rounding(5.0)
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        egui::Grid::new("utilization_table")
                            .striped(true)
                            .min_col_width(110.0)
                            .spacing([16.0, 6.0])
                            .show(ui, |ui| {
                                for header in ["School", "Enrollment", "Capacity", "Utilization"] {
                                    ui.label(RichText::new(header).strong().size(13.0));
                                }
                                ui.end_row();

                                for row in &model.rows {
                                    Self::draw_row(ui, row, false);
                                }
                                Self::draw_row(ui, &model.totals, true);
                            });
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::{district_store, loaded_store};

    #[test]
    fn rows_sorted_by_name_ignoring_case() {
        let store = district_store();
        let model = TableModel::build(&store, "FY26");
        let names: Vec<&str> = model.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Decatur High", "oakhurst", "Westchester"]);
    }

    #[test]
    fn accented_names_sort_with_their_base_letter() {
        let store = loaded_store(
            r#"{
                "years": ["FY26"],
                "schools": [
                    {"id": "z", "name": "Zeta", "capacity": 100, "enrollment": {"FY26": 50}},
                    {"id": "e", "name": "École", "capacity": 100, "enrollment": {"FY26": 60}},
                    {"id": "a", "name": "avondale", "capacity": 100, "enrollment": {"FY26": 70}},
                    {"id": "f", "name": "Fernbank", "capacity": 100, "enrollment": {"FY26": 80}}
                ]
            }"#,
        );
        let model = TableModel::build(&store, "FY26");
        let names: Vec<&str> = model.rows.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["avondale", "École", "Fernbank", "Zeta"]);
    }

    #[test]
    fn rows_carry_utilization_and_severity() {
        let store = district_store();
        let model = TableModel::build(&store, "FY26");
        let westchester = model.rows.iter().find(|r| r.name == "Westchester").unwrap();
        assert_eq!(westchester.utilization, Some(105));
        assert_eq!(westchester.severity(), Severity::High);

        let oakhurst = model.rows.iter().find(|r| r.name == "oakhurst").unwrap();
        assert_eq!(oakhurst.severity(), Severity::Medium);
    }

    #[test]
    fn totals_row_uses_district_aggregate() {
        let store = district_store();
        let model = TableModel::build(&store, "FY24");
        assert_eq!(model.rows.len(), 2);
        assert_eq!(
            model.totals,
            TableRow {
                name: TOTAL_LABEL.to_string(),
                enrollment: 1200,
                capacity: Some(1400),
                utilization: Some(86),
            }
        );
    }

    #[test]
    fn unknown_year_leaves_table_empty() {
        let store = district_store();
        let mut view = TableView::new();
        view.init(&store).unwrap();
        view.set_year(&store, "FY26").unwrap();
        assert!(view.model().is_some());

        assert_eq!(
            view.set_year(&store, "FY99"),
            Err(ViewError::UnknownYear("FY99".into()))
        );
        assert!(view.model().is_none());
    }
}
