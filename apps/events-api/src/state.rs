//! Shared application state.

use mongodb::{Client, Database};

/// State for the operational endpoints.
///
/// The events routes carry their own service state; this one only backs
/// health and readiness.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded from environment variables
    pub config: crate::config::Config,
    /// MongoDB client (cloneable, shares underlying connection pool)
    pub mongo_client: Client,
    /// MongoDB database instance
    pub db: Database,
}
