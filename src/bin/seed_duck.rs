// Build the database layout from the flat-file layout: each wide CSV becomes a
// long `(sector, year, <value>)` DuckDB table.

use anyhow::{Context, Result};
use clap::Parser;
use duckdb::Connection;
use std::{fs, path::PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use wagedash::{
    source::{
        duck::{default_value_columns, write_long_table},
        CsvSource, TableKind, TableNames, TableSource,
    },
    MetricTable,
};

#[derive(Debug, Parser)]
#[command(name = "seed_duck")]
struct Args {
    /// Directory with nominal.csv, real.csv, growth_nom.csv, growth_real.csv
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// DuckDB file to create
    #[arg(long, default_value = "wagedash.duckdb")]
    db: PathBuf,

    /// Remove an existing database file first
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();
    let args = Args::parse();

    // 1. If asked, start from an empty file
    if args.fresh && args.db.exists() {
        fs::remove_file(&args.db)
            .with_context(|| format!("removing {}", args.db.display()))?;
    }

    // 2. Open (or create) the DuckDB database file
    let conn = Connection::open(&args.db)
        .with_context(|| format!("opening {}", args.db.display()))?;

    // 3. Copy each wide CSV into its long table
    let csv = CsvSource::new(&args.data_dir);
    let db_names = TableNames::duck_defaults();
    let value_columns = default_value_columns();

    for kind in TableKind::ALL {
        let table = csv
            .load_kind(kind)
            .await
            .with_context(|| format!("loading {}", kind.as_str()))?;
        let rows = match table.as_ref() {
            MetricTable::Wide(w) => w.to_long(),
            MetricTable::Long(l) => l.clone(),
        };

        let target = db_names.get(kind);
        let value_column = value_columns
            .get(target)
            .with_context(|| format!("no value column for {}", target))?;
        write_long_table(&conn, target, value_column, rows.rows())
            .with_context(|| format!("writing {}", target))?;
        info!(table = target, rows = rows.rows().len(), "seeded");
    }

    println!("seeded {} tables into {}", TableKind::ALL.len(), args.db.display());
    Ok(())
}
