// src/config.rs

//! Runtime configuration.
//!
//! Read from a YAML file (every field optional). The database connection
//! string is a secret and is normally supplied through `WAGEDASH_DATABASE_URL`
//! instead, which takes precedence over the file.

use serde::Deserialize;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};
use tracing::info;

use crate::error::{DashboardError, Result};
use crate::index::SectorOrder;
use crate::source::{CachedSource, CsvSource, DuckSource, TableCache, TableNames, TableSource};

pub const DATABASE_URL_ENV: &str = "WAGEDASH_DATABASE_URL";
pub const DEFAULT_CONFIG_PATH: &str = "wagedash.yaml";
pub const DEFAULT_CAPTION: &str = "Data: Rosstat";

/// Default lifetime of cached database tables.
pub const DEFAULT_DB_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Csv,
    Duckdb,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub backend: Backend,
    /// Directory holding `<table>.csv` files.
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    /// Cache lifetime; unset means process lifetime for csv, one hour for duckdb.
    pub cache_ttl_secs: Option<u64>,
    pub sector_order: SectorOrder,
    pub pool_max_size: Option<usize>,
    /// Where rendered chart specs are written.
    pub output_dir: PathBuf,
    /// Shown under every chart title; `null` in the file hides it.
    pub caption: Option<String>,
    /// Physical table names; backend defaults when unset.
    pub tables: Option<TableNames>,
    /// Extra `table -> value column` bindings for the database backend.
    pub value_columns: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Csv,
            data_dir: PathBuf::from("data"),
            database_url: None,
            cache_ttl_secs: None,
            sector_order: SectorOrder::Source,
            pool_max_size: None,
            output_dir: PathBuf::from("charts"),
            caption: Some(DEFAULT_CAPTION.to_string()),
            tables: None,
            value_columns: HashMap::new(),
        }
    }
}

impl Config {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| DashboardError::Config(e.to_string()))
    }

    /// Read `path`. A missing file yields defaults unless `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_yaml_str(&text)
                .map_err(|e| DashboardError::Config(format!("{}: {}", path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
                info!(path = %path.display(), "no config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(DashboardError::Config(format!(
                "reading {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Let the environment override the database URL.
    pub fn with_env(self) -> Self {
        self.with_database_url(std::env::var(DATABASE_URL_ENV).ok())
    }

    pub fn with_database_url(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            self.database_url = Some(url);
        }
        self
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        match (self.cache_ttl_secs, self.backend) {
            (Some(secs), _) => Some(Duration::from_secs(secs)),
            (None, Backend::Csv) => None,
            (None, Backend::Duckdb) => Some(DEFAULT_DB_TTL),
        }
    }

    /// Build the configured backend behind a fresh table cache.
    pub fn open_source(&self) -> Result<CachedSource<Box<dyn TableSource>>> {
        let inner: Box<dyn TableSource> = match self.backend {
            Backend::Csv => {
                let names = self.tables.clone().unwrap_or_else(TableNames::csv_defaults);
                Box::new(CsvSource::with_names(&self.data_dir, names))
            }
            Backend::Duckdb => {
                let url = self.database_url.as_deref().ok_or_else(|| {
                    DashboardError::Config(format!(
                        "duckdb backend needs a database url (set {})",
                        DATABASE_URL_ENV
                    ))
                })?;
                let mut src = DuckSource::connect(url, self.pool_max_size)?;
                if let Some(names) = &self.tables {
                    src = src.with_names(names.clone());
                }
                for (table, column) in &self.value_columns {
                    src = src.with_value_column(table, column);
                }
                Box::new(src)
            }
        };

        let cache = Arc::new(TableCache::new(self.cache_ttl()));
        Ok(CachedSource::new(inner, cache))
    }
}
