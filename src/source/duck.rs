// src/source/duck.rs

use async_trait::async_trait;
use deadpool::managed::{self, Metrics, RecycleResult};
use duckdb::arrow::{
    array::{Array, Float64Array, Int32Array, StringArray},
    compute::cast,
    datatypes::{DataType, Schema},
    record_batch::RecordBatch,
};
use duckdb::{AccessMode, Config, Connection, ToSql};
use std::{collections::HashMap, sync::Arc, sync::Mutex};
use tracing::{debug, info};

use super::{TableKind, TableNames, TableSource};
use crate::error::{DashboardError, Result};
use crate::table::{LongRow, LongTable, MetricTable};

pub const SECTOR_COLUMN: &str = "sector";
pub const YEAR_COLUMN: &str = "year";

/// Value column of each default database table.
pub fn default_value_columns() -> HashMap<String, String> {
    [
        ("salaries", "salary_nom"),
        ("salaries_real", "salary_real"),
        ("growth_nom", "growth_nom"),
        ("growth_real", "growth_real"),
    ]
    .into_iter()
    .map(|(t, c)| (t.to_string(), c.to_string()))
    .collect()
}

/// Hands out connections cloned from one root connection, so every pooled
/// connection sees the same database (in-memory databases included).
pub struct DuckManager {
    root: Mutex<Connection>,
}

impl DuckManager {
    pub fn new(root: Connection) -> Self {
        Self {
            root: Mutex::new(root),
        }
    }
}

impl managed::Manager for DuckManager {
    type Type = Connection;
    type Error = duckdb::Error;

    async fn create(&self) -> std::result::Result<Connection, duckdb::Error> {
        let root = self.root.lock().unwrap_or_else(|p| p.into_inner());
        root.try_clone()
    }

    /// Health check on checkout: a connection that cannot answer `SELECT 1`
    /// is discarded and replaced.
    async fn recycle(&self, conn: &mut Connection, _: &Metrics) -> RecycleResult<duckdb::Error> {
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }
}

pub type DuckPool = managed::Pool<DuckManager>;

/// Database backend: long tables with `sector`, `year` and one value column.
pub struct DuckSource {
    pool: DuckPool,
    label: String,
    names: TableNames,
    value_columns: HashMap<String, String>,
}

impl DuckSource {
    /// Open the database at `url` (a file path, optionally `duckdb://`-prefixed,
    /// or `:memory:`). Files are opened read-only.
    pub fn connect(url: &str, max_size: Option<usize>) -> Result<Self> {
        let path = url.strip_prefix("duckdb://").unwrap_or(url);
        let opened = match path {
            ":memory:" => Connection::open_in_memory(),
            _ => Config::default()
                .access_mode(AccessMode::ReadOnly)
                .and_then(|cfg| Connection::open_with_flags(path, cfg)),
        };
        let conn = opened.map_err(|e| DashboardError::unavailable(url, e))?;

        Self::from_connection(conn, url, max_size)
    }

    /// Serve tables from an already open connection.
    pub fn from_connection(conn: Connection, label: &str, max_size: Option<usize>) -> Result<Self> {
        let mut builder =
            managed::Pool::builder(DuckManager::new(conn)).runtime(deadpool::Runtime::Tokio1);
        if let Some(max_size) = max_size {
            builder = builder.max_size(max_size.max(1));
        }
        let pool = builder
            .build()
            .map_err(|e| DashboardError::unavailable(label, e))?;

        Ok(Self {
            pool,
            label: label.to_string(),
            names: TableNames::duck_defaults(),
            value_columns: default_value_columns(),
        })
    }

    pub fn with_names(mut self, names: TableNames) -> Self {
        self.names = names;
        self
    }

    /// Override or add the value column used for `table`.
    pub fn with_value_column(mut self, table: &str, column: &str) -> Self {
        self.value_columns
            .insert(table.to_string(), column.to_string());
        self
    }

    pub fn value_column(&self, table: &str) -> Option<&str> {
        self.value_columns.get(table).map(String::as_str)
    }

    pub fn pool(&self) -> &DuckPool {
        &self.pool
    }
}

#[async_trait]
impl TableSource for DuckSource {
    #[tracing::instrument(level = "info", skip(self), fields(db = %self.label))]
    async fn load(&self, name: &str) -> Result<Arc<MetricTable>> {
        let conn = self
            .pool
            .get()
            .await
            .map_err(|e| DashboardError::unavailable(name, e))?;
        let table = name.to_string();
        let value_column = self.value_column(name).map(str::to_string);

        let long = tokio::task::spawn_blocking(move || {
            read_long_table(&conn, &table, value_column.as_deref())
        })
        .await
        .map_err(|e| DashboardError::unavailable(name, e))??;

        info!(rows = long.rows().len(), "loaded database table");
        Ok(Arc::new(MetricTable::Long(long)))
    }

    fn table_name(&self, kind: TableKind) -> &str {
        self.names.get(kind)
    }

    fn describe(&self) -> String {
        format!("duckdb:{}", self.label)
    }
}

/// Double-quote an identifier for interpolation into SQL.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Full-table read of `table`, returned in table order.
///
/// When `value_column` is `None` the table must have exactly one column
/// besides `sector` and `year`. Columns are resolved from the result schema
/// before any batch is read, so an empty table is validated too.
pub fn read_long_table(
    conn: &Connection,
    table: &str,
    value_column: Option<&str>,
) -> Result<LongTable> {
    let sql = format!("SELECT * FROM {}", quote_ident(table));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| DashboardError::unavailable(table, e))?;
    let arrow = stmt
        .query_arrow([])
        .map_err(|e| DashboardError::unavailable(table, e))?;

    let columns = KeyColumns::resolve(table, &arrow.get_schema(), value_column)?;
    let batches: Vec<RecordBatch> = arrow.collect();

    let mut rows = Vec::new();
    for batch in &batches {
        rows.extend(decode_batch(table, batch, &columns)?);
    }
    debug!(table, batches = batches.len(), rows = rows.len(), "decoded");

    LongTable::new(table, rows)
}

/// Positions of the sector, year and value columns in a result schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct KeyColumns {
    sector: usize,
    year: usize,
    value: usize,
}

impl KeyColumns {
    fn resolve(table: &str, schema: &Schema, value_column: Option<&str>) -> Result<Self> {
        let column_index = |name: &str| {
            schema
                .index_of(name)
                .map_err(|_| DashboardError::malformed(table, format!("missing column `{}`", name)))
        };

        let sector = column_index(SECTOR_COLUMN)?;
        let year = column_index(YEAR_COLUMN)?;
        let value = match value_column {
            Some(name) => column_index(name)?,
            None => {
                let others: Vec<usize> = (0..schema.fields().len())
                    .filter(|i| *i != sector && *i != year)
                    .collect();
                match others.as_slice() {
                    [only] => *only,
                    _ => {
                        return Err(DashboardError::malformed(
                            table,
                            format!("expected one value column, found {}", others.len()),
                        ))
                    }
                }
            }
        };

        Ok(Self {
            sector,
            year,
            value,
        })
    }
}

fn decode_batch(table: &str, batch: &RecordBatch, columns: &KeyColumns) -> Result<Vec<LongRow>> {
    let schema = batch.schema();
    let coerce = |idx: usize, ty: &DataType| {
        cast(batch.column(idx), ty).map_err(|e| {
            DashboardError::malformed(
                table,
                format!("column `{}`: {}", schema.field(idx).name(), e),
            )
        })
    };
    let sectors = coerce(columns.sector, &DataType::Utf8)?;
    let years = coerce(columns.year, &DataType::Int32)?;
    let values = coerce(columns.value, &DataType::Float64)?;

    let downcast_err = || DashboardError::malformed(table, "unexpected array type after cast");
    let sectors = sectors
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(downcast_err)?;
    let years = years
        .as_any()
        .downcast_ref::<Int32Array>()
        .ok_or_else(downcast_err)?;
    let values = values
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(downcast_err)?;

    (0..batch.num_rows())
        .map(|i| {
            if sectors.is_null(i) || years.is_null(i) {
                return Err(DashboardError::malformed(
                    table,
                    format!("null sector or year at row {}", i),
                ));
            }
            Ok(LongRow {
                sector: sectors.value(i).to_string(),
                year: years.value(i),
                value: if values.is_null(i) {
                    f64::NAN
                } else {
                    values.value(i)
                },
            })
        })
        .collect()
}

/// Create (or replace) `table` as `(sector VARCHAR, year INTEGER, <value_column> DOUBLE)`
/// and bulk-append `rows`.
pub fn write_long_table(
    conn: &Connection,
    table: &str,
    value_column: &str,
    rows: &[LongRow],
) -> Result<()> {
    conn.execute_batch(&format!(
        "CREATE OR REPLACE TABLE {} ({} VARCHAR, {} INTEGER, {} DOUBLE);",
        quote_ident(table),
        quote_ident(SECTOR_COLUMN),
        quote_ident(YEAR_COLUMN),
        quote_ident(value_column),
    ))
    .map_err(|e| DashboardError::unavailable(table, e))?;

    let mut appender = conn
        .appender(table)
        .map_err(|e| DashboardError::unavailable(table, e))?;
    appender
        .append_rows(rows.iter().map(|r| {
            [
                &r.sector as &dyn ToSql,
                &r.year as &dyn ToSql,
                &r.value as &dyn ToSql,
            ]
        }))
        .map_err(|e| DashboardError::unavailable(table, e))?;
    appender
        .flush()
        .map_err(|e| DashboardError::unavailable(table, e))?;
    Ok(())
}
