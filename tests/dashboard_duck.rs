mod common;

use common::write_csv_fixtures;
use duckdb::Connection;
use std::path::Path;
use tempfile::tempdir;
use wagedash::{
    config::{Backend, Config},
    source::{
        duck::{default_value_columns, write_long_table},
        CsvSource, DuckSource, TableKind, TableNames, TableSource,
    },
    Dashboard, DashboardError, FilterSelection, LongRecord, MetricTable, SectorOrder, Tab,
};

/// Seed `db` with the long form of the CSV fixtures, like the `seed_duck` tool.
async fn seed(db: &Path, data_dir: &Path) {
    let conn = Connection::open(db).unwrap();
    let csv = CsvSource::new(data_dir);
    let names = TableNames::duck_defaults();
    let columns = default_value_columns();

    for kind in TableKind::ALL {
        let table = csv.load_kind(kind).await.unwrap();
        let MetricTable::Wide(wide) = table.as_ref() else {
            panic!("csv tables are wide");
        };
        let target = names.get(kind);
        write_long_table(&conn, target, &columns[target], wide.to_long().rows()).unwrap();
    }
}

#[tokio::test]
async fn duckdb_dashboard_matches_csv_dashboard() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    let db = dir.path().join("wagedash.duckdb");
    seed(&db, dir.path()).await;

    let duck = DuckSource::connect(db.to_str().unwrap(), Some(2)).unwrap();
    let from_db = Dashboard::load(&duck, SectorOrder::Source).await.unwrap();
    let from_csv = Dashboard::load(&CsvSource::new(dir.path()), SectorOrder::Source)
        .await
        .unwrap();

    assert!(matches!(
        from_db.table(TableKind::NominalSalary),
        MetricTable::Long(_)
    ));
    assert_eq!(from_db.index(), from_csv.index());

    let sel = FilterSelection::new(["Mining", "Finance"], 2001, 2002);
    for tab in Tab::ALL {
        let mut a = from_db.series(tab, &sel).records;
        let mut b = from_csv.series(tab, &sel).records;
        let key = |r: &LongRecord| (r.sector.clone(), r.year, r.series_type.map(|t| t.as_str()));
        a.sort_by_key(key);
        b.sort_by_key(key);
        assert_eq!(a, b, "tab {}", tab.as_str());
    }
}

#[tokio::test]
async fn config_opens_cached_duckdb_source() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    let db = dir.path().join("wagedash.duckdb");
    seed(&db, dir.path()).await;

    let cfg = Config {
        backend: Backend::Duckdb,
        ..Config::default()
    }
    .with_database_url(Some(db.display().to_string()));

    let src = cfg.open_source().unwrap();
    assert!(src.describe().starts_with("duckdb:"));
    let d = Dashboard::load(&src, cfg.sector_order).await.unwrap();
    assert_eq!(d.index().years, vec![2000, 2001, 2002]);
    assert_eq!(src.cache().len().await, 4);
}

#[tokio::test]
async fn missing_database_table_aborts_startup() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("empty.duckdb");
    {
        let conn = Connection::open(&db).unwrap();
        conn.execute_batch("CREATE TABLE placeholder (x INTEGER);")
            .unwrap();
    }

    let duck = DuckSource::connect(db.to_str().unwrap(), None).unwrap();
    let err = Dashboard::load(&duck, SectorOrder::Source).await.unwrap_err();
    assert!(matches!(err, DashboardError::DataSourceUnavailable { .. }));
}

#[tokio::test]
async fn unreachable_database_is_unavailable() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope").join("missing.duckdb");
    let err = DuckSource::connect(missing.to_str().unwrap(), None)
        .err()
        .expect("opening a read-only database in a missing directory fails");
    assert!(matches!(err, DashboardError::DataSourceUnavailable { .. }));
}
