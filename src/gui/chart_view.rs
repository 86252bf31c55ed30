//! Chart View
//! Utilization time series for user-selected district, cluster and school
//! series, with a fixed 100% capacity reference line.

use crate::charts::ChartPlotter;
use crate::data::{DataStore, Dataset, EntityRef};
use crate::gui::theme::{palette_color, DISTRICT_COLOR};
use crate::gui::{ensure_year, View, ViewError};
use egui::{Color32, RichText};
use rayon::prelude::*;
use thiserror::Error;

pub const CLUSTER_GROUP: &str = "Clusters";
pub const SCHOOL_GROUP: &str = "Schools";
pub const DISTRICT_LABEL: &str = "All (District-wide)";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("At least one series must remain selected")]
    LastSeries,
    #[error("Unknown series {0:?}")]
    UnknownSeries(EntityRef),
}

/// One selectable series in the legend.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesEntry {
    pub entity: EntityRef,
    pub label: String,
    pub group: String,
    pub color: Color32,
}

/// Fixed, ordered list of selectable series with their colors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeriesCatalog {
    entries: Vec<SeriesEntry>,
}

impl SeriesCatalog {
    /// District first, then clusters in document order, then schools
    /// grouped by level in first-appearance order.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut entries = vec![SeriesEntry {
            entity: EntityRef::District,
            label: DISTRICT_LABEL.to_string(),
            group: CLUSTER_GROUP.to_string(),
            color: DISTRICT_COLOR,
        }];

        for cluster in &dataset.clusters {
            entries.push(SeriesEntry {
                entity: EntityRef::Cluster(cluster.id.clone()),
                label: cluster.name.clone(),
                group: CLUSTER_GROUP.to_string(),
                color: palette_color(entries.len() - 1),
            });
        }

        let mut levels: Vec<&str> = Vec::new();
        for school in &dataset.schools {
            let level = school.level.as_deref().unwrap_or(SCHOOL_GROUP);
            if !levels.contains(&level) {
                levels.push(level);
            }
        }
        for level in levels {
            for school in dataset
                .schools
                .iter()
                .filter(|s| s.level.as_deref().unwrap_or(SCHOOL_GROUP) == level)
            {
                entries.push(SeriesEntry {
                    entity: EntityRef::School(school.id.clone()),
                    label: school.name.clone(),
                    group: level.to_string(),
                    color: palette_color(entries.len() - 1),
                });
            }
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn get(&self, entity: &EntityRef) -> Option<&SeriesEntry> {
        self.entries.iter().find(|e| &e.entity == entity)
    }

    fn position(&self, entity: &EntityRef) -> Option<usize> {
        self.entries.iter().position(|e| &e.entity == entity)
    }

    /// Entries grouped by legend heading, in catalog order.
    pub fn groups(&self) -> Vec<(&str, Vec<&SeriesEntry>)> {
        let mut groups: Vec<(&str, Vec<&SeriesEntry>)> = Vec::new();
        for entry in &self.entries {
            match groups.iter_mut().find(|(g, _)| *g == entry.group) {
                Some((_, items)) => items.push(entry),
                None => groups.push((entry.group.as_str(), vec![entry])),
            }
        }
        groups
    }
}

/// A drawable series: one value per declared year.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub entity: EntityRef,
    pub label: String,
    pub color: Color32,
    pub points: Vec<Option<u32>>,
}

pub struct ChartView {
    catalog: SeriesCatalog,
    /// Selected series, kept in catalog order
    selected: Vec<EntityRef>,
    years: Vec<String>,
    series: Vec<ChartSeries>,
    current_year: Option<String>,
}

impl Default for ChartView {
    fn default() -> Self {
        Self {
            catalog: SeriesCatalog::default(),
            selected: vec![EntityRef::District],
            years: Vec::new(),
            series: Vec::new(),
            current_year: None,
        }
    }
}

impl ChartView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn catalog(&self) -> &SeriesCatalog {
        &self.catalog
    }

    pub fn selected(&self) -> &[EntityRef] {
        &self.selected
    }

    pub fn series(&self) -> &[ChartSeries] {
        &self.series
    }

    pub fn years(&self) -> &[String] {
        &self.years
    }

    pub fn is_selected(&self, entity: &EntityRef) -> bool {
        self.selected.contains(entity)
    }

    /// Select or deselect a series and rebuild the chart.
    ///
    /// Deselecting the only selected series is rejected and leaves the
    /// selection unchanged.
    pub fn toggle(
        &mut self,
        store: &DataStore,
        entity: &EntityRef,
        checked: bool,
    ) -> Result<(), SelectionError> {
        if self.catalog.position(entity).is_none() {
            return Err(SelectionError::UnknownSeries(entity.clone()));
        }

        if checked {
            if !self.is_selected(entity) {
                self.selected.push(entity.clone());
                let catalog = &self.catalog;
                self.selected
                    .sort_by_key(|e| catalog.position(e).unwrap_or(usize::MAX));
            }
        } else if self.is_selected(entity) {
            if self.selected.len() == 1 {
                return Err(SelectionError::LastSeries);
            }
            self.selected.retain(|e| e != entity);
        }

        log::debug!("Chart selection: {:?}", self.selected);
        self.rebuild(store);
        Ok(())
    }

    fn rebuild(&mut self, store: &DataStore) {
        self.series = match store.dataset() {
            Some(dataset) => Self::build_series(&dataset, &self.catalog, &self.selected),
            None => Vec::new(),
        };
    }

    /// Series for every selected entity, aligned with the declared years.
    pub fn build_series(
        dataset: &Dataset,
        catalog: &SeriesCatalog,
        selected: &[EntityRef],
    ) -> Vec<ChartSeries> {
        selected
            .par_iter()
            .filter_map(|entity| {
                let entry = catalog.get(entity)?;
                let points = dataset
                    .utilization_history(entity)
                    .into_iter()
                    .map(|point| point.utilization)
                    .collect();
                Some(ChartSeries {
                    entity: entity.clone(),
                    label: entry.label.clone(),
                    color: entry.color,
                    points,
                })
            })
            .collect()
    }

    fn draw_legend(&mut self, ui: &mut egui::Ui, store: &DataStore) {
        let mut toggled: Option<(EntityRef, bool)> = None;

        ui.horizontal_wrapped(|ui| {
            for (group, entries) in self.catalog.groups() {
                ui.vertical(|ui| {
                    ui.label(RichText::new(group).size(12.0).strong());
                    for entry in entries {
                        ui.horizontal(|ui| {
                            let mut checked = self.selected.contains(&entry.entity);
                            if ui.checkbox(&mut checked, "").changed() {
                                toggled = Some((entry.entity.clone(), checked));
                            }
                            let (rect, _) = ui
                                .allocate_exact_size(egui::vec2(14.0, 14.0), egui::Sense::hover());
                            ui.painter().rect_filled(rect, 3.0, entry.color);
                            ui.label(RichText::new(&entry.label).size(12.0));
                        });
                    }
                });
                ui.add_space(16.0);
            }
        });

        if let Some((entity, checked)) = toggled {
            if let Err(e) = self.toggle(store, &entity, checked) {
                // Checkbox state is derived from the selection, so it reverts
                log::info!("Rejected chart selection change: {}", e);
            }
        }
    }
}

impl View for ChartView {
    fn title(&self) -> &'static str {
        "Chart"
    }

    fn init(&mut self, store: &DataStore) -> Result<(), ViewError> {
        let dataset = store.dataset().ok_or(ViewError::DataUnavailable)?;
        self.catalog = SeriesCatalog::from_dataset(&dataset);
        self.years = dataset.years.clone();
        self.selected = vec![EntityRef::District];
        self.current_year = None;
        self.rebuild(store);
        Ok(())
    }

    fn set_year(&mut self, store: &DataStore, year: &str) -> Result<(), ViewError> {
        ensure_year(store, year)?;
        self.current_year = Some(year.to_string());
        Ok(())
    }

    fn show(&mut self, ui: &mut egui::Ui, store: &DataStore) {
        if self.series.is_empty() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ui.label(RichText::new("Utilization by Fiscal Year").size(18.0).strong());
        ui.add_space(6.0);
        self.draw_legend(ui, store);
        ui.add_space(10.0);

        let current = self
            .current_year
            .as_ref()
            .and_then(|y| self.years.iter().position(|year| year == y));
        ChartPlotter::draw_utilization_chart(ui, &self.series, &self.years, current);
    }
}
