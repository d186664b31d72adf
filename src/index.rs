// src/index.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::table::MetricTable;

/// Canonical ordering policy for the sector list of a `DomainIndex`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectorOrder {
    /// Order of first appearance in the source table.
    #[default]
    Source,
    /// Sorted ascending.
    Alphabetical,
}

/// Distinct years (ascending) and sectors found in a loaded table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DomainIndex {
    pub years: Vec<i32>,
    pub sectors: Vec<String>,
}

impl DomainIndex {
    /// Derive the selection domains of `table`. An empty table yields empty domains.
    pub fn build(table: &MetricTable, order: SectorOrder) -> Self {
        let (years, mut sectors): (BTreeSet<i32>, Vec<String>) = match table {
            MetricTable::Wide(w) => (w.years().iter().copied().collect(), w.sectors().to_vec()),
            MetricTable::Long(l) => {
                let mut seen = HashSet::new();
                let sectors = l
                    .rows()
                    .iter()
                    .filter(|r| seen.insert(r.sector.as_str()))
                    .map(|r| r.sector.clone())
                    .collect();
                (l.rows().iter().map(|r| r.year).collect(), sectors)
            }
        };

        if order == SectorOrder::Alphabetical {
            sectors.sort();
        }

        Self {
            years: years.into_iter().collect(),
            sectors,
        }
    }

    /// True when either domain is empty, so no selection can match anything.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty() || self.sectors.is_empty()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.years.first().copied()
    }

    pub fn last_year(&self) -> Option<i32> {
        self.years.last().copied()
    }

    /// Compare `other` against `self` (the reference domain).
    pub fn compare(&self, other: &DomainIndex) -> DomainDrift {
        let ours: HashSet<&String> = self.sectors.iter().collect();
        let theirs: HashSet<&String> = other.sectors.iter().collect();

        DomainDrift {
            missing_sectors: self
                .sectors
                .iter()
                .filter(|s| !theirs.contains(s))
                .cloned()
                .collect(),
            extra_sectors: other
                .sectors
                .iter()
                .filter(|s| !ours.contains(s))
                .cloned()
                .collect(),
            missing_years: self
                .years
                .iter()
                .filter(|y| other.years.binary_search(y).is_err())
                .copied()
                .collect(),
            extra_years: other
                .years
                .iter()
                .filter(|y| self.years.binary_search(y).is_err())
                .copied()
                .collect(),
        }
    }
}

/// Differences between a table's domain and the reference domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainDrift {
    /// Reference sectors absent from the other table.
    pub missing_sectors: Vec<String>,
    /// Sectors only the other table has.
    pub extra_sectors: Vec<String>,
    /// Reference years absent from the other table, ascending.
    pub missing_years: Vec<i32>,
    /// Years only the other table has, ascending.
    pub extra_years: Vec<i32>,
}

impl DomainDrift {
    pub fn is_aligned(&self) -> bool {
        self.missing_sectors.is_empty()
            && self.extra_sectors.is_empty()
            && self.missing_years.is_empty()
            && self.extra_years.is_empty()
    }

    /// True when the only difference is a run of missing years at the start of
    /// the reference range, as growth tables lack a prior-year baseline.
    pub fn is_leading_years_only(&self, reference: &DomainIndex) -> bool {
        if !self.missing_sectors.is_empty()
            || !self.extra_sectors.is_empty()
            || !self.extra_years.is_empty()
            || self.missing_years.is_empty()
        {
            return false;
        }
        reference.years.starts_with(&self.missing_years)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{LongRow, LongTable, WideTable};

    fn long(rows: &[(&str, i32)]) -> MetricTable {
        MetricTable::Long(
            LongTable::new(
                "t",
                rows.iter()
                    .map(|(s, y)| LongRow {
                        sector: s.to_string(),
                        year: *y,
                        value: 1.0,
                    })
                    .collect(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn wide_keeps_source_order() {
        let t = MetricTable::Wide(
            WideTable::new(
                "t",
                vec!["Mining".into(), "Education".into()],
                vec![2001, 2000],
                vec![vec![1.0, 2.0], vec![3.0, 4.0]],
            )
            .unwrap(),
        );
        let idx = DomainIndex::build(&t, SectorOrder::Source);
        assert_eq!(idx.years, vec![2000, 2001]);
        assert_eq!(idx.sectors, vec!["Mining", "Education"]);

        let idx = DomainIndex::build(&t, SectorOrder::Alphabetical);
        assert_eq!(idx.sectors, vec!["Education", "Mining"]);
    }

    #[test]
    fn long_dedups_years_and_sectors() {
        let t = long(&[("B", 2002), ("A", 2001), ("B", 2001), ("A", 2002)]);
        let idx = DomainIndex::build(&t, SectorOrder::Source);
        assert_eq!(idx.years, vec![2001, 2002]);
        assert_eq!(idx.sectors, vec!["B", "A"]);
        assert_eq!(idx.first_year(), Some(2001));
        assert_eq!(idx.last_year(), Some(2002));
    }

    #[test]
    fn empty_table_gives_empty_domains() {
        let idx = DomainIndex::build(&MetricTable::Long(LongTable::default()), SectorOrder::Source);
        assert!(idx.is_empty());
        assert_eq!(idx.first_year(), None);
    }

    #[test]
    fn header_only_table_is_empty() {
        let t = MetricTable::Wide(WideTable::new("t", vec![], vec![2000, 2001], vec![]).unwrap());
        let idx = DomainIndex::build(&t, SectorOrder::Source);
        assert_eq!(idx.years, vec![2000, 2001]);
        assert!(idx.sectors.is_empty());
        assert!(idx.is_empty());
    }

    #[test]
    fn drift_detects_leading_gap() {
        let salary = DomainIndex::build(
            &long(&[("A", 2000), ("A", 2001), ("A", 2002)]),
            SectorOrder::Source,
        );
        let growth = DomainIndex::build(&long(&[("A", 2001), ("A", 2002)]), SectorOrder::Source);

        let drift = salary.compare(&growth);
        assert!(!drift.is_aligned());
        assert_eq!(drift.missing_years, vec![2000]);
        assert!(drift.is_leading_years_only(&salary));

        let holed = DomainIndex::build(&long(&[("A", 2000), ("A", 2002)]), SectorOrder::Source);
        let drift = salary.compare(&holed);
        assert!(!drift.is_leading_years_only(&salary));

        let other = DomainIndex::build(&long(&[("B", 2000)]), SectorOrder::Source);
        let drift = salary.compare(&other);
        assert_eq!(drift.missing_sectors, vec!["A"]);
        assert_eq!(drift.extra_sectors, vec!["B"]);
    }
}
