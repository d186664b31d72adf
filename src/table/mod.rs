// src/table/mod.rs

use std::collections::HashSet;

use crate::error::{DashboardError, Result};

/// A table of numeric observations as handed out by a `TableSource`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricTable {
    /// One row per sector, one column per year.
    Wide(WideTable),
    /// One row per (sector, year) observation.
    Long(LongTable),
}

impl MetricTable {
    /// Number of (sector, year) cells held by the table.
    pub fn cell_count(&self) -> usize {
        match self {
            MetricTable::Wide(w) => w.sectors.len() * w.years.len(),
            MetricTable::Long(l) => l.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    pub fn shape(&self) -> &'static str {
        match self {
            MetricTable::Wide(_) => "wide",
            MetricTable::Long(_) => "long",
        }
    }
}

/// Wide shape: sector row keys × year column keys.
///
/// Cells that were empty in the source hold `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    sectors: Vec<String>,
    years: Vec<i32>,
    /// `cells[row][col]` is the value for `sectors[row]` in `years[col]`
    cells: Vec<Vec<f64>>,
}

impl WideTable {
    /// Build a wide table, rejecting duplicate keys and ragged rows.
    ///
    /// `table` is only used to label errors.
    pub fn new(
        table: &str,
        sectors: Vec<String>,
        years: Vec<i32>,
        cells: Vec<Vec<f64>>,
    ) -> Result<Self> {
        if cells.len() != sectors.len() {
            return Err(DashboardError::malformed(
                table,
                format!("{} sector keys but {} rows", sectors.len(), cells.len()),
            ));
        }
        if let Some((i, row)) = cells
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != years.len())
        {
            return Err(DashboardError::malformed(
                table,
                format!(
                    "row `{}` has {} cells, expected {}",
                    sectors[i],
                    row.len(),
                    years.len()
                ),
            ));
        }

        let mut seen = HashSet::with_capacity(sectors.len());
        if let Some(dup) = sectors.iter().find(|s| !seen.insert(s.as_str())) {
            return Err(DashboardError::malformed(
                table,
                format!("duplicate sector `{}`", dup),
            ));
        }
        let mut seen = HashSet::with_capacity(years.len());
        if let Some(dup) = years.iter().find(|y| !seen.insert(**y)) {
            return Err(DashboardError::malformed(
                table,
                format!("duplicate year column {}", dup),
            ));
        }

        Ok(Self {
            sectors,
            years,
            cells,
        })
    }

    pub fn sectors(&self) -> &[String] {
        &self.sectors
    }

    pub fn years(&self) -> &[i32] {
        &self.years
    }

    /// Iterate `(sector, row cells)` in source order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.sectors
            .iter()
            .map(String::as_str)
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Look up a single cell.
    pub fn value(&self, sector: &str, year: i32) -> Option<f64> {
        let row = self.sectors.iter().position(|s| s == sector)?;
        let col = self.years.iter().position(|y| *y == year)?;
        Some(self.cells[row][col])
    }

    /// Melt into long shape, sector-major.
    pub fn to_long(&self) -> LongTable {
        let rows = self
            .rows()
            .flat_map(|(sector, cells)| {
                self.years.iter().zip(cells).map(move |(&year, &value)| LongRow {
                    sector: sector.to_string(),
                    year,
                    value,
                })
            })
            .collect();
        LongTable { rows }
    }
}

/// A single long-shape observation as stored by a source.
#[derive(Debug, Clone, PartialEq)]
pub struct LongRow {
    pub sector: String,
    pub year: i32,
    pub value: f64,
}

/// Long shape: explicit `(sector, year, value)` rows, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LongTable {
    rows: Vec<LongRow>,
}

impl LongTable {
    /// Build a long table, rejecting repeated (sector, year) pairs.
    pub fn new(table: &str, rows: Vec<LongRow>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(rows.len());
        for row in &rows {
            if !seen.insert((row.sector.as_str(), row.year)) {
                return Err(DashboardError::malformed(
                    table,
                    format!("duplicate row for (`{}`, {})", row.sector, row.year),
                ));
            }
        }
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LongRow] {
        &self.rows
    }
}
