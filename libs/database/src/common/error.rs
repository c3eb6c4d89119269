/// Unified database error type for connector operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Driver-level MongoDB errors
    #[cfg(feature = "mongodb")]
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    /// Connection failed after retries
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl DatabaseError {
    /// Whether another attempt could plausibly succeed
    ///
    /// URI parse errors and authentication failures are permanent; server
    /// selection and I/O failures are typical while a cluster is starting.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed(_) => true,
            #[cfg(feature = "mongodb")]
            Self::Mongo(e) => matches!(
                *e.kind,
                mongodb::error::ErrorKind::ServerSelection { .. } | mongodb::error::ErrorKind::Io(_)
            ),
            Self::HealthCheckFailed(_) | Self::ConfigError(_) => false,
        }
    }
}
