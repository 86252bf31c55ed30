//! Map View
//! School, cluster or district markers over the district boundary.
//!
//! The viewport is an egui_plot canvas in `[lng, lat]` coordinates. The
//! marker granularity follows the zoom level derived from the visible
//! longitude span.

use crate::config::MapConfig;
use crate::data::{Coordinates, DataStore, EntityRef};
use crate::gui::theme::severity_color;
use crate::gui::{ensure_year, View, ViewError};
use crate::stats::{format_utilization, Aggregate, Severity};
use egui::{Color32, RichText};
use egui_plot::{Plot, PlotBounds, PlotPoint, PlotPoints, Points, Polygon, Text};

/// Tile size used to translate a longitude span into a web-map zoom level.
const TILE_SIZE: f64 = 256.0;

const SCHOOL_RADIUS: f32 = 7.0;
const CLUSTER_RADIUS: f32 = 14.0;
const DISTRICT_RADIUS: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Individual,
    Clustered,
    DistrictWide,
}

impl Granularity {
    pub fn for_zoom(zoom: f64, config: &MapConfig) -> Self {
        if zoom >= config.individual_zoom {
            Granularity::Individual
        } else if zoom >= config.clustered_zoom {
            Granularity::Clustered
        } else {
            Granularity::DistrictWide
        }
    }
}

/// Web-map zoom level showing `lng_span` degrees across `width_px` pixels.
pub fn zoom_for_span(lng_span: f64, width_px: f64) -> f64 {
    if lng_span <= 0.0 || width_px <= 0.0 {
        return 0.0;
    }
    (360.0 * width_px / (TILE_SIZE * lng_span)).log2()
}

/// Longitude span that shows `zoom` across `width_px` pixels.
pub fn span_for_zoom(zoom: f64, width_px: f64) -> f64 {
    360.0 * width_px / (TILE_SIZE * zoom.exp2())
}

/// Zoom the map opens at: half a level below the clustered threshold.
fn opening_zoom(config: &MapConfig) -> f64 {
    config.clustered_zoom - 0.5
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub entity: EntityRef,
    pub name: String,
    pub position: Coordinates,
    pub enrollment: u64,
    pub capacity: Option<u64>,
    pub utilization: Option<u32>,
    pub radius: f32,
}

impl Marker {
    fn from_aggregate(
        entity: EntityRef,
        name: &str,
        position: Coordinates,
        aggregate: Aggregate,
        radius: f32,
    ) -> Self {
        Self {
            entity,
            name: name.to_string(),
            position,
            enrollment: aggregate.total_enrollment,
            capacity: Some(aggregate.total_capacity),
            utilization: aggregate.utilization,
            radius,
        }
    }

    pub fn severity(&self) -> Severity {
        Severity::classify(self.utilization)
    }

    pub fn label(&self) -> String {
        format_utilization(self.utilization)
    }
}

pub struct MapView {
    config: MapConfig,
    /// District outline in plot coordinates, built once at init
    boundary: Vec<[f64; 2]>,
    district_center: Option<Coordinates>,
    year: Option<String>,
    zoom: Option<f64>,
    granularity: Granularity,
    markers: Vec<Marker>,
    selected: Option<EntityRef>,
}

impl MapView {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            boundary: Vec::new(),
            district_center: None,
            year: None,
            zoom: None,
            granularity: Granularity::DistrictWide,
            markers: Vec::new(),
            selected: None,
        }
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn selected(&self) -> Option<&Marker> {
        let entity = self.selected.as_ref()?;
        self.markers.iter().find(|m| &m.entity == entity)
    }

    /// Open the detail panel for a marker, closing any other.
    pub fn select(&mut self, entity: Option<EntityRef>) {
        self.selected = entity;
    }

    /// Record the current zoom level, rebuilding markers when it crosses a
    /// granularity threshold. Returns whether the granularity changed.
    pub fn set_zoom(&mut self, store: &DataStore, zoom: f64) -> bool {
        self.zoom = Some(zoom);
        let granularity = Granularity::for_zoom(zoom, &self.config);
        if granularity == self.granularity {
            return false;
        }

        log::debug!(
            "Map zoom {:.1} switched markers from {:?} to {:?}",
            zoom,
            self.granularity,
            granularity
        );
        self.granularity = granularity;
        self.selected = None;
        self.rebuild(store);
        true
    }

    fn rebuild(&mut self, store: &DataStore) {
        self.markers = match &self.year {
            Some(year) => {
                Self::build_markers(store, year, self.granularity, self.district_center)
            }
            None => Vec::new(),
        };
        if self.selected().is_none() {
            self.selected = None;
        }
    }

    /// Markers for `year` at the given granularity.
    pub fn build_markers(
        store: &DataStore,
        year: &str,
        granularity: Granularity,
        district_center: Option<Coordinates>,
    ) -> Vec<Marker> {
        match granularity {
            Granularity::Individual => store
                .schools_for_year(year)
                .into_iter()
                .filter_map(|entry| {
                    let position = entry.school.location?;
                    Some(Marker {
                        utilization: entry.utilization(),
                        entity: EntityRef::School(entry.school.id),
                        name: entry.school.name,
                        position,
                        enrollment: u64::from(entry.enrollment),
                        capacity: entry.school.capacity.map(u64::from),
                        radius: SCHOOL_RADIUS,
                    })
                })
                .collect(),
            Granularity::Clustered => store
                .clusters()
                .into_iter()
                .filter_map(|cluster| {
                    let position = store.cluster_centroid(&cluster.id, year)?;
                    let aggregate = store.cluster_aggregate(&cluster.id, year)?;
                    Some(Marker::from_aggregate(
                        EntityRef::Cluster(cluster.id.clone()),
                        &cluster.name,
                        position,
                        aggregate,
                        CLUSTER_RADIUS,
                    ))
                })
                .collect(),
            Granularity::DistrictWide => district_center
                .map(|position| {
                    Marker::from_aggregate(
                        EntityRef::District,
                        "District",
                        position,
                        store.aggregate(year),
                        DISTRICT_RADIUS,
                    )
                })
                .into_iter()
                .collect(),
        }
    }

    /// Plot bounds centred on the district at the opening zoom level.
    fn opening_bounds(&self, width_px: f64, height_px: f64) -> Option<PlotBounds> {
        let center = self.district_center?;
        let lng_span = span_for_zoom(opening_zoom(&self.config), width_px.max(1.0));
        let lat_span = lng_span * (height_px / width_px.max(1.0));
        Some(PlotBounds::from_min_max(
            [center.lng - lng_span / 2.0, center.lat - lat_span / 2.0],
            [center.lng + lng_span / 2.0, center.lat + lat_span / 2.0],
        ))
    }

    /// Marker whose center lies within `tolerance` of `point`.
    pub fn marker_at(&self, point: [f64; 2], tolerance: f64) -> Option<&Marker> {
        self.markers
            .iter()
            .map(|m| {
                let dx = m.position.lng - point[0];
                let dy = m.position.lat - point[1];
                (m, (dx * dx + dy * dy).sqrt())
            })
            .filter(|(_, d)| *d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(m, _)| m)
    }

    fn draw_detail_panel(&mut self, ctx: &egui::Context) {
        let Some(marker) = self.selected().cloned() else {
            return;
        };

        let mut open = true;
        egui::Window::new(RichText::new(&marker.name).strong())
            .id(egui::Id::new("map_detail_panel"))
            .open(&mut open)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::RIGHT_TOP, [-12.0, 12.0])
            .show(ctx, |ui| {
                egui::Grid::new("map_detail_grid")
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        ui.label("Enrollment:");
                        ui.label(marker.enrollment.to_string());
                        ui.end_row();

                        ui.label("Capacity:");
                        ui.label(
                            marker
                                .capacity
                                .map(|c| c.to_string())
                                .unwrap_or_else(|| "-".to_string()),
                        );
                        ui.end_row();

                        ui.label("Utilization:");
                        ui.label(
                            RichText::new(marker.label())
                                .strong()
                                .color(severity_color(marker.severity())),
                        );
                        ui.end_row();
                    });
            });

        if !open {
            self.selected = None;
        }
    }
}

impl View for MapView {
    fn title(&self) -> &'static str {
        "Map"
    }

    fn init(&mut self, store: &DataStore) -> Result<(), ViewError> {
        let dataset = store.dataset().ok_or(ViewError::DataUnavailable)?;

        self.boundary = dataset.district_boundary.clone().unwrap_or_default();
        self.district_center = self
            .config
            .district_center
            .map(|[lat, lng]| Coordinates { lat, lng })
            .or_else(|| dataset.boundary_centroid())
            .or_else(|| dataset.schools_centroid());
        if self.district_center.is_none() {
            log::warn!("No district reference point; district-wide marker disabled");
        }

        self.year = None;
        self.zoom = None;
        self.granularity = Granularity::DistrictWide;
        self.markers.clear();
        self.selected = None;
        Ok(())
    }

    fn set_year(&mut self, store: &DataStore, year: &str) -> Result<(), ViewError> {
        ensure_year(store, year)?;
        self.year = Some(year.to_string());
        self.rebuild(store);
        Ok(())
    }

    fn show(&mut self, ui: &mut egui::Ui, store: &DataStore) {
        if self.year.is_none() {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        }

        ui.horizontal(|ui| {
            ui.label(RichText::new("Utilization Map").size(18.0).strong());
            ui.add_space(12.0);
            let zoom = self
                .zoom
                .map(|z| format!("zoom {:.1}", z))
                .unwrap_or_default();
            ui.label(
                RichText::new(format!("{:?} view, {}", self.granularity, zoom))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(6.0);

        let aspect = self
            .district_center
            .map(|c| c.lat.to_radians().cos() as f32)
            .filter(|a| *a > 0.05)
            .unwrap_or(1.0);

        let mut plot = Plot::new("utilization_map")
            .data_aspect(aspect)
            .show_axes(false)
            .show_grid(false)
            .allow_double_click_reset(true)
            .show_x(false)
            .show_y(false);
        for [lng, lat] in &self.boundary {
            plot = plot.include_x(*lng).include_y(*lat);
        }
        for marker in &self.markers {
            plot = plot
                .include_x(marker.position.lng)
                .include_y(marker.position.lat);
        }

        // Start district-wide; later frames keep whatever the user panned to.
        let opening = if self.zoom.is_none() {
            let size = ui.available_size();
            self.opening_bounds(f64::from(size.x), f64::from(size.y))
        } else {
            None
        };

        let boundary = self.boundary.clone();
        let markers = self.markers.clone();
        let response = plot.show(ui, |plot_ui| {
            if let Some(bounds) = opening {
                plot_ui.set_plot_bounds(bounds);
            }

            if !boundary.is_empty() {
                plot_ui.polygon(
                    Polygon::new(PlotPoints::from_iter(boundary.iter().copied()))
                        .fill_color(Color32::from_rgba_unmultiplied(100, 149, 237, 20))
                        .stroke(egui::Stroke::new(2.0, Color32::from_rgb(100, 149, 237)))
                        .name("District boundary"),
                );
            }

            for marker in &markers {
                let color = severity_color(marker.severity());
                let point = [marker.position.lng, marker.position.lat];
                plot_ui.points(
                    Points::new(PlotPoints::from_iter([point]))
                        .radius(marker.radius)
                        .filled(true)
                        .color(color)
                        .name(&marker.name),
                );
                plot_ui.text(
                    Text::new(
                        PlotPoint::new(point[0], point[1]),
                        RichText::new(marker.label()).strong().color(Color32::BLACK),
                    )
                    .anchor(egui::Align2::CENTER_CENTER),
                );
            }
        });

        let transform = response.transform;
        let lng_span = transform.bounds().width();
        let width_px = f64::from(transform.frame().width());
        self.set_zoom(store, zoom_for_span(lng_span, width_px));

        if response.response.clicked() {
            if let Some(pos) = response.response.interact_pointer_pos() {
                let value = transform.value_from_position(pos);
                let per_px = transform.dvalue_dpos()[0].abs();
                let hit = self
                    .markers
                    .iter()
                    .map(|m| m.radius)
                    .fold(0.0f32, f32::max);
                let picked = self
                    .marker_at([value.x, value.y], per_px * f64::from(hit))
                    .map(|m| m.entity.clone());
                self.select(picked);
            }
        }

        self.draw_detail_panel(ui.ctx());
    }
}
