//! Storage traits for the events domain
//!
//! Writes and plan execution are separate traits so the service can be
//! exercised against a mock store that only answers query plans.

use crate::error::Result;
use crate::models::{Event, Session};
use crate::pipeline::QueryPlan;
use async_trait::async_trait;
use uuid::Uuid;

/// Event and session persistence
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Store a new event
    async fn insert_event(&self, event: Event) -> Result<Event>;

    /// Store a new session; a duplicate (start, end) pair is a validation error
    async fn insert_session(&self, session: Session) -> Result<Session>;

    /// Whether an event exists for this tenant
    async fn event_exists(&self, tenant_id: &str, id: Uuid) -> Result<bool>;
}

/// Runs query plans against the store
#[async_trait]
pub trait EventQueryExecutor: Send + Sync {
    /// Run the full plan and decode each row with its joined sessions
    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<Event>>;

    /// Count all rows the plan pages over
    ///
    /// Failures are logged and reported as `None`; they never fail a query.
    async fn fetch_count(&self, plan: &QueryPlan) -> Option<u64>;
}
