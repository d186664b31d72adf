use thiserror::Error;

/// Errors raised while loading and preparing dashboard data.
///
/// Every variant is fatal for the session: a dashboard either starts with all
/// of its tables or not at all.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The source file/table is missing or unreadable, or the database
    /// connection could not be established.
    #[error("data source unavailable for `{table}`: {reason}")]
    DataSourceUnavailable { table: String, reason: String },

    /// A year header is not an integer, a required column is absent, or a
    /// cell cannot be coerced to a number.
    #[error("malformed schema in `{table}`: {reason}")]
    MalformedSchema { table: String, reason: String },

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn unavailable(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::DataSourceUnavailable {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn malformed(table: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedSchema {
            table: table.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
