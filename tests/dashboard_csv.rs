mod common;

use common::write_csv_fixtures;
use std::collections::HashSet;
use tempfile::tempdir;
use wagedash::{
    source::{CsvSource, TableKind, TableSource},
    Dashboard, DashboardError, FilterSelection, SectorOrder, SeriesType, Tab,
};

#[tokio::test]
async fn csv_dashboard_end_to_end() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());

    let d = Dashboard::load(&CsvSource::new(dir.path()), SectorOrder::Source)
        .await
        .unwrap();
    assert_eq!(d.index().years, vec![2000, 2001, 2002]);
    assert_eq!(
        d.index().sectors,
        vec!["Education", "Mining", "Finance", "Agriculture"]
    );

    let sel = FilterSelection::new(["Mining"], 2001, 2002);
    let nominal = d.series(Tab::Nominal, &sel);
    let got: HashSet<(String, i32)> = nominal
        .records
        .iter()
        .map(|r| (r.sector.clone(), r.year))
        .collect();
    assert_eq!(
        got,
        HashSet::from([("Mining".to_string(), 2001), ("Mining".to_string(), 2002)])
    );
    assert_eq!(nominal.records[0].value, 6.0);
    assert_eq!(nominal.records[1].value, 7.0);
}

#[tokio::test]
async fn growth_tab_has_twice_the_cells() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    let d = Dashboard::load(&CsvSource::new(dir.path()), SectorOrder::Alphabetical)
        .await
        .unwrap();
    assert_eq!(d.index().sectors[0], "Agriculture");

    let sel = FilterSelection::new(d.index().sectors.clone(), 2000, 2002);
    let growth = d.series(Tab::Growth, &sel);
    // growth tables start in 2001
    assert_eq!(growth.len(), 2 * 4 * 2);
    let real = growth
        .records
        .iter()
        .filter(|r| r.series_type == Some(SeriesType::Real))
        .count();
    assert_eq!(real, 8);

    let json = serde_json::to_value(d.render(Tab::Growth, &sel)).unwrap();
    assert_eq!(json["encoding"]["strokeDash"]["field"], "type");
    assert_eq!(json["encoding"]["y"]["axis"]["format"], ".1f");
    assert_eq!(json["data"]["values"].as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn default_selection_is_first_three_sectors() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    let d = Dashboard::load(&CsvSource::new(dir.path()), SectorOrder::Source)
        .await
        .unwrap();

    let sel = FilterSelection::defaults(d.index());
    assert_eq!(
        sel.sectors,
        HashSet::from(["Education".into(), "Mining".into(), "Finance".into()])
    );
    assert_eq!(d.render(Tab::Real, &sel).row_count(), 9);
}

#[tokio::test]
async fn missing_table_aborts_startup() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    std::fs::remove_file(dir.path().join("growth_real.csv")).unwrap();

    let err = Dashboard::load(&CsvSource::new(dir.path()), SectorOrder::Source)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DashboardError::DataSourceUnavailable { ref table, .. } if table == "growth_real"
    ));
}

#[tokio::test]
async fn malformed_header_aborts_startup() {
    let dir = tempdir().unwrap();
    write_csv_fixtures(dir.path());
    std::fs::write(dir.path().join("real.csv"), "sector,2000,y2001\nA,1,2\n").unwrap();

    let src = CsvSource::new(dir.path());
    assert!(src.load_kind(TableKind::NominalSalary).await.is_ok());
    let err = Dashboard::load(&src, SectorOrder::Source).await.unwrap_err();
    assert!(matches!(err, DashboardError::MalformedSchema { .. }));
}
