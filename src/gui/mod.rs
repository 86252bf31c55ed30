//! GUI module - User interface components

mod app;
mod chart_view;
mod control_panel;
mod map_view;
mod table_view;
pub mod theme;

use crate::data::DataStore;
use thiserror::Error;

pub use app::EnrollmentApp;
pub use chart_view::{ChartSeries, ChartView};
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use map_view::MapView;
pub use table_view::{TableModel, TableRow, TableView};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewError {
    #[error("School data is not loaded")]
    DataUnavailable,
    #[error("Unknown year '{0}'")]
    UnknownYear(String),
}

/// A view fed from the data store and redrawn on year changes.
pub trait View {
    fn title(&self) -> &'static str;

    /// Build everything that depends only on the loaded dataset.
    fn init(&mut self, store: &DataStore) -> Result<(), ViewError>;

    /// Recompute the view for the selected year.
    fn set_year(&mut self, store: &DataStore, year: &str) -> Result<(), ViewError>;

    fn show(&mut self, ui: &mut egui::Ui, store: &DataStore);
}

/// Fail unless the store holds a dataset declaring `year`.
fn ensure_year(store: &DataStore, year: &str) -> Result<(), ViewError> {
    if !store.is_ready() {
        return Err(ViewError::DataUnavailable);
    }
    if !store.years().iter().any(|y| y == year) {
        return Err(ViewError::UnknownYear(year.to_string()));
    }
    Ok(())
}
