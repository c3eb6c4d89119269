//! HTTP routes
//!
//! Everything under `/api` belongs to the events domain; health and
//! readiness sit at the root so probes don't depend on the API prefix.

pub mod health;

use axum::Router;
use domain_events::{EventService, MongoEventRepository};

use crate::state::AppState;

/// Build the events routes backed by MongoDB
/// Note: These are nested under /api by `server::create_router`
pub fn routes(state: &AppState) -> Router {
    let repository = MongoEventRepository::new(&state.db);
    let service = EventService::new(repository, state.config.pagination.clone());
    domain_events::router(service)
}

/// Create the indexes the events queries depend on
pub async fn init_indexes(db: &mongodb::Database) -> eyre::Result<()> {
    MongoEventRepository::new(db)
        .init_indexes()
        .await
        .map_err(|e| eyre::eyre!("Failed to create event indexes: {}", e))
}
