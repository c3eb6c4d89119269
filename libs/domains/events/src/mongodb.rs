//! MongoDB implementation of the event store

use async_trait::async_trait;
use bson::{Bson, Document, doc};
use futures::TryStreamExt;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Collection, Database, IndexModel};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::error::{EventError, Result};
use crate::models::{Event, Session};
use crate::pipeline::{EVENTS_COLLECTION, QueryPlan, SESSIONS_COLLECTION, uuid_bson};
use crate::repository::{EventQueryExecutor, EventRepository};

const DUPLICATE_KEY: i32 = 11000;

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(e)) if e.code == DUPLICATE_KEY
    )
}

/// Reads `total` from a `$count` result
fn count_from(document: &Document) -> Option<u64> {
    match document.get("total")? {
        Bson::Int32(n) => u64::try_from(*n).ok(),
        Bson::Int64(n) => u64::try_from(*n).ok(),
        _ => None,
    }
}

/// MongoDB-backed events and sessions
#[derive(Clone)]
pub struct MongoEventRepository {
    events: Collection<Event>,
    sessions: Collection<Session>,
}

impl MongoEventRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            events: db.collection::<Event>(EVENTS_COLLECTION),
            sessions: db.collection::<Session>(SESSIONS_COLLECTION),
        }
    }

    /// Create the indexes the query plans rely on
    ///
    /// The 2dsphere index is required for `$geoWithin` on large collections
    /// and the unique session index rejects duplicate (start, end) pairs.
    pub async fn init_indexes(&self) -> Result<()> {
        let event_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "location": "2dsphere" })
                .options(
                    IndexOptions::builder()
                        .name("idx_location_2dsphere".to_string())
                        .build(),
                )
                .build(),
            // Tenant listing, newest first
            IndexModel::builder()
                .keys(doc! { "tenant_id": 1, "status": 1, "visibility": 1, "created_at": -1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_tenant_status_visibility".to_string())
                        .build(),
                )
                .build(),
        ];

        let session_indexes = vec![
            IndexModel::builder()
                .keys(doc! { "event_id": 1, "start_time": 1 })
                .options(
                    IndexOptions::builder()
                        .name("idx_event_start".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "event_id": 1, "start_time": 1, "end_time": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_event_start_end_unique".to_string())
                        .build(),
                )
                .build(),
        ];

        self.events.create_indexes(event_indexes).await?;
        self.sessions.create_indexes(session_indexes).await?;
        tracing::info!("Event indexes created successfully");
        Ok(())
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_id = %event.id, tenant_id = %event.tenant_id))]
    async fn insert_event(&self, event: Event) -> Result<Event> {
        self.events.insert_one(&event).await?;
        Ok(event)
    }

    #[instrument(skip(self, session), fields(session_id = %session.id, event_id = %session.event_id))]
    async fn insert_session(&self, session: Session) -> Result<Session> {
        match self.sessions.insert_one(&session).await {
            Ok(_) => Ok(session),
            Err(e) if is_duplicate_key(&e) => Err(EventError::Validation(
                "a session with the same start and end time already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    async fn event_exists(&self, tenant_id: &str, id: Uuid) -> Result<bool> {
        let count = self
            .events
            .count_documents(doc! { "_id": uuid_bson(id), "tenant_id": tenant_id })
            .await?;
        Ok(count > 0)
    }
}

#[async_trait]
impl EventQueryExecutor for MongoEventRepository {
    #[instrument(skip(self, plan), fields(cursor_mode = plan.is_cursor_mode(), limit = plan.limit))]
    async fn fetch_page(&self, plan: &QueryPlan) -> Result<Vec<Event>> {
        let cursor = self.events.aggregate(plan.to_pipeline()).await?;
        let rows: Vec<Document> = cursor.try_collect().await?;

        rows.into_iter()
            .map(|row| bson::from_document::<Event>(row).map_err(EventError::from))
            .collect()
    }

    #[instrument(skip(self, plan))]
    async fn fetch_count(&self, plan: &QueryPlan) -> Option<u64> {
        let result = async {
            let mut cursor = self.events.aggregate(plan.count_pipeline()).await?;
            cursor.try_next().await
        }
        .await;

        match result {
            // $count emits nothing when no document matched
            Ok(None) => Some(0),
            Ok(Some(document)) => {
                let total = count_from(&document);
                if total.is_none() {
                    warn!(result = %document, "Unexpected $count result shape");
                }
                total
            }
            Err(e) => {
                warn!(error = %e, "Event count failed, falling back to page heuristics");
                None
            }
        }
    }
}
