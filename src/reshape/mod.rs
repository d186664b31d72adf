// src/reshape/mod.rs

pub mod combine;

pub use combine::{combine, SeriesType};

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::index::DomainIndex;
use crate::table::MetricTable;

/// How many sectors are pre-selected when no explicit choice is made.
pub const DEFAULT_SECTOR_COUNT: usize = 3;

/// User-chosen sector subset and inclusive year range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterSelection {
    pub sectors: HashSet<String>,
    pub from: i32,
    pub to: i32,
}

impl FilterSelection {
    pub fn new<I, S>(sectors: I, from: i32, to: i32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sectors: sectors.into_iter().map(Into::into).collect(),
            from,
            to,
        }
    }

    /// Initial control state: the first few sectors and the full year range.
    pub fn defaults(index: &DomainIndex) -> Self {
        Self::new(
            index.sectors.iter().take(DEFAULT_SECTOR_COUNT).cloned(),
            index.first_year().unwrap_or_default(),
            index.last_year().unwrap_or_default(),
        )
    }

    /// Clamp the range into the index's year bounds and keep `from <= to`,
    /// the way a range slider constrains its endpoints.
    pub fn clamp_to(mut self, index: &DomainIndex) -> Self {
        if let (Some(lo), Some(hi)) = (index.first_year(), index.last_year()) {
            self.from = self.from.clamp(lo, hi);
            self.to = self.to.clamp(lo, hi);
        }
        if self.from > self.to {
            std::mem::swap(&mut self.from, &mut self.to);
        }
        self
    }

    pub fn contains_year(&self, year: i32) -> bool {
        (self.from..=self.to).contains(&year)
    }
}

/// One long-form observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub sector: String,
    pub year: i32,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_type: Option<SeriesType>,
}

impl LongRecord {
    pub fn new(sector: impl Into<String>, year: i32, value: f64) -> Self {
        Self {
            sector: sector.into(),
            year,
            value,
            series_type: None,
        }
    }
}

/// A batch of long records together with the field name their values are
/// exposed under (`salary`, `salary_real`, `growth`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct LongSeries {
    pub value_field: String,
    pub records: Vec<LongRecord>,
}

impl LongSeries {
    pub fn empty(value_field: impl Into<String>) -> Self {
        Self {
            value_field: value_field.into(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Filter `table` by `selection` and reshape the surviving cells into long form.
///
/// Requested sectors the table does not know are dropped. An empty sector set
/// or an inverted range gives an empty series. Records come out grouped by
/// sector in table order.
pub fn apply(table: &MetricTable, selection: &FilterSelection, value_field: &str) -> LongSeries {
    if selection.sectors.is_empty() {
        return LongSeries::empty(value_field);
    }
    if selection.from > selection.to {
        debug!(
            from = selection.from,
            to = selection.to,
            "inverted year range, nothing selected"
        );
        return LongSeries::empty(value_field);
    }

    let records = match table {
        MetricTable::Wide(w) => {
            // year columns to keep, by position, in ascending year order
            let mut cols: Vec<(usize, i32)> = w
                .years()
                .iter()
                .copied()
                .enumerate()
                .filter(|(_, y)| selection.contains_year(*y))
                .collect();
            cols.sort_by_key(|(_, y)| *y);

            w.rows()
                .filter(|(sector, _)| selection.sectors.contains(*sector))
                .flat_map(|(sector, cells)| {
                    cols.iter()
                        .map(move |&(i, year)| LongRecord::new(sector, year, cells[i]))
                })
                .collect()
        }
        MetricTable::Long(l) => l
            .rows()
            .iter()
            .filter(|r| selection.sectors.contains(&r.sector) && selection.contains_year(r.year))
            .map(|r| LongRecord::new(r.sector.clone(), r.year, r.value))
            .collect(),
    };

    LongSeries {
        value_field: value_field.to_string(),
        records,
    }
}
