// src/dashboard.rs

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::chart::{to_chart_spec, ChartSpec, Encoding, NumberFormat, SERIES_FIELD};
use crate::error::Result;
use crate::index::{DomainIndex, SectorOrder};
use crate::reshape::{apply, combine, FilterSelection, LongSeries, SeriesType};
use crate::source::{TableKind, TableSource};
use crate::table::MetricTable;

/// The three views of the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Tab {
    Nominal,
    Real,
    Growth,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Nominal, Tab::Real, Tab::Growth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Nominal => "nominal",
            Tab::Real => "real",
            Tab::Growth => "growth",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Nominal => "Nominal salary, RUB",
            Tab::Real => "Real salary (2000 prices)",
            Tab::Growth => "Growth rate, % to previous year",
        }
    }

    /// Field name the tab's values are exposed under.
    pub fn value_field(&self) -> &'static str {
        match self {
            Tab::Nominal => "salary",
            Tab::Real => "salary_real",
            Tab::Growth => "growth",
        }
    }

    pub fn number_format(&self) -> NumberFormat {
        match self {
            Tab::Nominal | Tab::Real => NumberFormat::Thousands,
            Tab::Growth => NumberFormat::OneDecimal,
        }
    }

    pub fn encoding(&self) -> Encoding {
        let enc = Encoding::lines(self.value_field(), self.number_format());
        match self {
            Tab::Growth => enc.dashed_by(SERIES_FIELD),
            _ => enc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DriftLevel {
    Aligned,
    Expected,
    Unexpected,
}

/// Loaded tables plus the selection domain derived from them.
///
/// Rendering is a pure function of the loaded data and a `FilterSelection`.
#[derive(Debug, Clone)]
pub struct Dashboard {
    nominal: Arc<MetricTable>,
    real: Arc<MetricTable>,
    growth_nom: Arc<MetricTable>,
    growth_real: Arc<MetricTable>,
    index: DomainIndex,
    caption: Option<String>,
}

impl Dashboard {
    /// Load all four tables from `source`; any failure aborts.
    #[tracing::instrument(level = "info", skip_all, fields(source = %source.describe()))]
    pub async fn load<S>(source: &S, order: SectorOrder) -> Result<Self>
    where
        S: TableSource + ?Sized,
    {
        let (nominal, real, growth_nom, growth_real) = tokio::try_join!(
            source.load_kind(TableKind::NominalSalary),
            source.load_kind(TableKind::RealSalary),
            source.load_kind(TableKind::NominalGrowth),
            source.load_kind(TableKind::RealGrowth),
        )?;

        let dashboard = Self::from_tables(nominal, real, growth_nom, growth_real, order);
        info!(
            sectors = dashboard.index.sectors.len(),
            years = dashboard.index.years.len(),
            "dashboard ready"
        );
        Ok(dashboard)
    }

    /// Build from already loaded tables. The nominal salary table defines the
    /// selection domain; the others are checked against it.
    pub fn from_tables(
        nominal: Arc<MetricTable>,
        real: Arc<MetricTable>,
        growth_nom: Arc<MetricTable>,
        growth_real: Arc<MetricTable>,
        order: SectorOrder,
    ) -> Self {
        let index = DomainIndex::build(&nominal, order);
        if index.is_empty() {
            warn!(
                years = index.years.len(),
                sectors = index.sectors.len(),
                "nominal salary table has no selectable data"
            );
        }
        let dashboard = Self {
            nominal,
            real,
            growth_nom,
            growth_real,
            index,
            caption: None,
        };

        for kind in [
            TableKind::RealSalary,
            TableKind::NominalGrowth,
            TableKind::RealGrowth,
        ] {
            dashboard.check_domain(kind, order);
        }
        dashboard
    }

    pub fn with_caption(mut self, caption: Option<String>) -> Self {
        self.caption = caption;
        self
    }

    /// Compare the domain of `kind` with the nominal salary index and log
    /// any drift. Growth tables lacking only leading years are expected.
    fn check_domain(&self, kind: TableKind, order: SectorOrder) -> DriftLevel {
        let other = DomainIndex::build(self.table(kind), order);
        let drift = self.index.compare(&other);
        if drift.is_aligned() {
            return DriftLevel::Aligned;
        }

        let growth = matches!(kind, TableKind::NominalGrowth | TableKind::RealGrowth);
        if growth && drift.is_leading_years_only(&self.index) {
            debug!(
                table = kind.as_str(),
                missing_years = ?drift.missing_years,
                "growth table starts later than salaries"
            );
            DriftLevel::Expected
        } else {
            warn!(
                table = kind.as_str(),
                missing_sectors = ?drift.missing_sectors,
                extra_sectors = ?drift.extra_sectors,
                missing_years = ?drift.missing_years,
                extra_years = ?drift.extra_years,
                "table domain differs from nominal salaries"
            );
            DriftLevel::Unexpected
        }
    }

    pub fn index(&self) -> &DomainIndex {
        &self.index
    }

    pub fn table(&self, kind: TableKind) -> &MetricTable {
        match kind {
            TableKind::NominalSalary => self.nominal.as_ref(),
            TableKind::RealSalary => self.real.as_ref(),
            TableKind::NominalGrowth => self.growth_nom.as_ref(),
            TableKind::RealGrowth => self.growth_real.as_ref(),
        }
    }

    /// Long records backing `tab` for `selection`.
    pub fn series(&self, tab: Tab, selection: &FilterSelection) -> LongSeries {
        let field = tab.value_field();
        match tab {
            Tab::Nominal => apply(&self.nominal, selection, field),
            Tab::Real => apply(&self.real, selection, field),
            Tab::Growth => combine(
                apply(&self.growth_nom, selection, field),
                SeriesType::Nominal,
                apply(&self.growth_real, selection, field),
                SeriesType::Real,
            ),
        }
    }

    pub fn render(&self, tab: Tab, selection: &FilterSelection) -> ChartSpec {
        let series = self.series(tab, selection);
        debug!(tab = tab.as_str(), records = series.len(), "rendered");
        to_chart_spec(&series, &tab.encoding()).with_title(tab.title(), self.caption.clone())
    }

    pub fn render_all(&self, selection: &FilterSelection) -> Vec<(Tab, ChartSpec)> {
        Tab::ALL
            .iter()
            .map(|&tab| (tab, self.render(tab, selection)))
            .collect()
    }
}
