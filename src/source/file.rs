// src/source/file.rs

use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use std::{
    fs::File,
    io::{BufReader, Read},
    path::PathBuf,
    sync::Arc,
};
use tracing::info;

use super::{TableKind, TableNames, TableSource};
use crate::error::{DashboardError, Result};
use crate::table::{MetricTable, WideTable};

/// Flat-file backend: `<data_dir>/<name>.csv`, one wide table per file.
#[derive(Debug, Clone)]
pub struct CsvSource {
    data_dir: PathBuf,
    names: TableNames,
}

impl CsvSource {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_names(data_dir, TableNames::csv_defaults())
    }

    pub fn with_names(data_dir: impl Into<PathBuf>, names: TableNames) -> Self {
        Self {
            data_dir: data_dir.into(),
            names,
        }
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        self.data_dir.join(format!("{}.csv", name))
    }
}

#[async_trait]
impl TableSource for CsvSource {
    #[tracing::instrument(level = "info", skip(self), fields(dir = %self.data_dir.display()))]
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        let path = self.path_for(name);
        let table = name.to_string();

        // file read + parse is blocking; keep it off the runtime threads
        let wide = tokio::task::spawn_blocking(move || {
            let file = File::open(&path).map_err(|e| {
                DashboardError::unavailable(&table, format!("{}: {}", path.display(), e))
            })?;
            read_wide_csv(&table, BufReader::new(file))
        })
        .await
        .map_err(|e| DashboardError::unavailable(name, e))??;

        info!(
            sectors = wide.sectors().len(),
            years = wide.years().len(),
            "loaded csv table"
        );
        Ok(Arc::new(MetricTable::Wide(wide)))
    }

    fn table_name(&self, kind: TableKind) -> &str {
        self.names.get(kind)
    }

    fn describe(&self) -> String {
        format!("csv:{}", self.data_dir.display())
    }
}

/// Parse a wide CSV: the first column holds sector names, every other header
/// must be an integer year. Empty cells become `NaN`.
pub fn read_wide_csv<R: Read>(table: &str, reader: R) -> Result<WideTable> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DashboardError::malformed(table, e))?
        .clone();
    if headers.is_empty() {
        return Err(DashboardError::malformed(table, "missing header row"));
    }

    let years = headers
        .iter()
        .skip(1)
        .map(|h| {
            h.parse::<i32>().map_err(|_| {
                DashboardError::malformed(table, format!("column header `{}` is not a year", h))
            })
        })
        .collect::<Result<Vec<i32>>>()?;

    let mut sectors = Vec::new();
    let mut cells = Vec::new();
    for record in rdr.records() {
        let record = record.map_err(|e| DashboardError::malformed(table, e))?;
        let sector = record.get(0).unwrap_or_default().to_string();

        let row = record
            .iter()
            .skip(1)
            .zip(&years)
            .map(|(cell, year)| {
                parse_cell(cell).ok_or_else(|| {
                    DashboardError::malformed(
                        table,
                        format!("cell `{}` for ({}, {}) is not numeric", cell, sector, year),
                    )
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        sectors.push(sector);
        cells.push(row);
    }

    WideTable::new(table, sectors, years, cells)
}

/// Coerce a cell to a number; empty cells are missing observations.
fn parse_cell(raw: &str) -> Option<f64> {
    let v = raw.trim().trim_matches('"');
    if v.is_empty() {
        return Some(f64::NAN);
    }
    v.parse::<f64>().ok()
}
