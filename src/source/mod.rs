// src/source/mod.rs

pub mod cache;
pub mod duck;
pub mod file;

pub use cache::{CachedSource, TableCache};
pub use duck::DuckSource;
pub use file::CsvSource;

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::Result;
use crate::table::MetricTable;

/// The four logical tables every dashboard loads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    NominalSalary,
    RealSalary,
    NominalGrowth,
    RealGrowth,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::NominalSalary,
        TableKind::RealSalary,
        TableKind::NominalGrowth,
        TableKind::RealGrowth,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TableKind::NominalSalary => "nominal_salary",
            TableKind::RealSalary => "real_salary",
            TableKind::NominalGrowth => "nominal_growth",
            TableKind::RealGrowth => "real_growth",
        }
    }
}

/// Physical table name for each `TableKind` on a given backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableNames {
    pub nominal_salary: String,
    pub real_salary: String,
    pub nominal_growth: String,
    pub real_growth: String,
}

impl TableNames {
    /// File names (without `.csv`) used by the flat-file layout.
    pub fn csv_defaults() -> Self {
        Self {
            nominal_salary: "nominal".into(),
            real_salary: "real".into(),
            nominal_growth: "growth_nom".into(),
            real_growth: "growth_real".into(),
        }
    }

    /// Relational table names used by the database layout.
    pub fn duck_defaults() -> Self {
        Self {
            nominal_salary: "salaries".into(),
            real_salary: "salaries_real".into(),
            nominal_growth: "growth_nom".into(),
            real_growth: "growth_real".into(),
        }
    }

    pub fn get(&self, kind: TableKind) -> &str {
        match kind {
            TableKind::NominalSalary => &self.nominal_salary,
            TableKind::RealSalary => &self.real_salary,
            TableKind::NominalGrowth => &self.nominal_growth,
            TableKind::RealGrowth => &self.real_growth,
        }
    }
}

/// A backend able to hand out metric tables by name.
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Load the table called `name`. Any failure is fatal for the caller.
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>>;

    /// Physical name of `kind` on this backend.
    fn table_name(&self, kind: TableKind) -> &str;

    /// Short human-readable description for logs.
    fn describe(&self) -> String;

    async fn load_kind(&self, kind: TableKind) -> Result<Arc<MetricTable>> {
        self.load(self.table_name(kind)).await
    }
}

#[async_trait]
impl<S: TableSource + ?Sized> TableSource for Arc<S> {
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        (**self).load(name).await
    }

    fn table_name(&self, kind: TableKind) -> &str {
        (**self).table_name(kind)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[async_trait]
impl<S: TableSource + ?Sized> TableSource for Box<S> {
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        (**self).load(name).await
    }

    fn table_name(&self, kind: TableKind) -> &str {
        (**self).table_name(kind)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
