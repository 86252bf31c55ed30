//! Table Export Module
//! Writes the rendered utilization table to CSV using Polars.

use crate::gui::{TableModel, TableRow};
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build a DataFrame with one row per school followed by the totals row.
pub fn table_to_dataframe(model: &TableModel) -> Result<DataFrame, ExportError> {
    let rows: Vec<&TableRow> = model.rows.iter().chain(std::iter::once(&model.totals)).collect();

    let names: Vec<String> = rows.iter().map(|r| r.name.clone()).collect();
    let enrollment: Vec<u64> = rows.iter().map(|r| r.enrollment).collect();
    let capacity: Vec<Option<u64>> = rows.iter().map(|r| r.capacity).collect();
    let utilization: Vec<Option<u32>> = rows.iter().map(|r| r.utilization).collect();

    let df = DataFrame::new(vec![
        Column::new("school".into(), names),
        Column::new("enrollment".into(), enrollment),
        Column::new("capacity".into(), capacity),
        Column::new("utilization_pct".into(), utilization),
    ])?;

    Ok(df)
}

/// Write the table for one year to `path`.
pub fn write_table_csv(model: &TableModel, path: &Path) -> Result<(), ExportError> {
    let mut df = table_to_dataframe(model)?;
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    log::info!(
        "Exported {} rows for {} to {}",
        df.height(),
        model.year,
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::testing::district_store;

    #[test]
    fn dataframe_has_totals_last() {
        let store = district_store();
        let model = TableModel::build(&store, "FY24");
        let df = table_to_dataframe(&model).unwrap();

        assert_eq!(df.height(), 3);
        assert_eq!(df.width(), 4);
        let names = df.column("school").unwrap();
        assert_eq!(
            names.get(2).unwrap().get_str(),
            Some("District Total")
        );
    }

    #[test]
    fn writes_csv_with_header() {
        let store = district_store();
        let model = TableModel::build(&store, "FY26");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");

        write_table_csv(&model, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "school,enrollment,capacity,utilization_pct");
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[1], "Decatur High,980,1000,98");
        assert_eq!(lines[4], "District Total,1900,1900,100");
    }
}
