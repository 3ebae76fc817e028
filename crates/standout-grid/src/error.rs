//! Error types for the grid crate.

use thiserror::Error;

/// Errors that can occur when compiling or executing a grid request.
///
/// Every validation variant is raised before the query target is touched,
/// so a failed request never executes a partial query.
#[derive(Debug, Error)]
pub enum GridError {
    /// A filter or advanced condition references a column outside the filter allowlist.
    #[error("column '{column}' cannot be used for filtering, add it to the '{grid}' filter columns")]
    UnknownFilterColumn { column: String, grid: String },

    /// An order-by entry references a column outside the sort allowlist.
    #[error("column '{column}' cannot be used for sorting, add it to the '{grid}' order columns")]
    UnknownSortColumn { column: String, grid: String },

    /// A search term was supplied but no searchable columns are configured.
    #[error("grid '{grid}' has no searchable columns, add them to its search columns")]
    SearchNotConfigured { grid: String },

    /// A searchable column is missing from the filter allowlist.
    #[error("column '{column}' cannot be used for searching, add it to the '{grid}' filter columns")]
    UnknownSearchColumn { column: String, grid: String },

    /// A condition entry is missing its column, operator, or value.
    #[error("malformed condition: {reason}")]
    MalformedCondition { reason: String },

    /// The grid was built without a base query.
    #[error("grid '{grid}' has no base query, configure a source before use")]
    MissingSearchQuery { grid: String },

    /// Configuration could not be decoded.
    #[error("invalid grid configuration: {0}")]
    Config(String),

    /// A request could not be decoded.
    #[error("invalid grid request: {0}")]
    Request(String),

    /// The query target failed. The original error is kept as the source.
    #[error("query target failed: {0}")]
    Target(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl GridError {
    /// Create a malformed-condition error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedCondition {
            reason: reason.into(),
        }
    }

    /// Wrap a query target error.
    pub fn target(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Target(Box::new(err))
    }

    /// Create a request decoding error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Returns `true` for errors caused by the request or the allowlists,
    /// as opposed to configuration or target failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnknownFilterColumn { .. }
                | Self::UnknownSortColumn { .. }
                | Self::SearchNotConfigured { .. }
                | Self::UnknownSearchColumn { .. }
                | Self::MalformedCondition { .. }
                | Self::Request(_)
        )
    }
}

impl From<serde_json::Error> for GridError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<serde_yaml::Error> for GridError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for grid operations.
pub type Result<T> = std::result::Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_allowlist() {
        let err = GridError::UnknownSortColumn {
            column: "Unknown".to_string(),
            grid: "entities".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "column 'Unknown' cannot be used for sorting, add it to the 'entities' order columns"
        );
    }

    #[test]
    fn target_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline exceeded");
        let err = GridError::target(io);
        let source = std::error::Error::source(&err).unwrap();
        let io = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::TimedOut);
        assert!(!err.is_validation());
    }

    #[test]
    fn validation_classification() {
        assert!(GridError::malformed("missing column").is_validation());
        assert!(!GridError::MissingSearchQuery {
            grid: "g".to_string()
        }
        .is_validation());
    }
}
