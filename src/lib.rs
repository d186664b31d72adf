pub mod chart;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod index;
pub mod reshape;
pub mod source;
pub mod table;

pub use dashboard::{Dashboard, Tab};
pub use error::{DashboardError, Result};
pub use index::{DomainIndex, SectorOrder};
pub use reshape::{FilterSelection, LongRecord, LongSeries, SeriesType};
pub use table::{LongRow, LongTable, MetricTable, WideTable};
