use thiserror::Error;

/// Dashboard engine error types
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("aggregate query failed: {0}")]
    Aggregation(String),

    #[error("cache unavailable: {0}")]
    CacheUnavailable(String),

    #[error("invalid date window: {0}")]
    InvalidWindow(String),

    #[error("cache invalidation incomplete after {deleted} deletions: {message}")]
    PartialInvalidation { deleted: usize, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Unified Result type
pub type DashboardResult<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub fn cache_error<S: Into<String>>(msg: S) -> Self {
        Self::CacheUnavailable(msg.into())
    }

    pub fn invalid_window<S: Into<String>>(msg: S) -> Self {
        Self::InvalidWindow(msg.into())
    }

    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Whether the operation is safe and sensible to retry as-is.
    /// Invalidation is idempotent, so a partial clear may simply be re-run.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DashboardError::CacheUnavailable(_) | DashboardError::PartialInvalidation { .. }
        )
    }

    /// Whether the error invalidates the computed data itself rather than
    /// a cache tier around it.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            DashboardError::Database(_)
                | DashboardError::Aggregation(_)
                | DashboardError::InvalidWindow(_)
        )
    }
}

impl From<serde_json::Error> for DashboardError {
    fn from(err: serde_json::Error) -> Self {
        DashboardError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for DashboardError {
    fn from(err: anyhow::Error) -> Self {
        DashboardError::Internal(err.to_string())
    }
}
