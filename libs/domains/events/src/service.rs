//! Event service layer

use core_config::PaginationConfig;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, Result};
use crate::filter::{Audience, EventFilter};
use crate::models::{CreateEvent, CreateSession, Event, Session};
use crate::pagination::{Page, PageMode, paginate};
use crate::pipeline::QueryPlanBuilder;
use crate::repository::{EventQueryExecutor, EventRepository};

/// Event queries and minimal event/session writes
///
/// A query costs at most two store round-trips: the page itself and, in
/// offset mode only, a count over the same plan.
pub struct EventService<R> {
    repository: Arc<R>,
    config: PaginationConfig,
}

impl<R> Clone for EventService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            config: self.config.clone(),
        }
    }
}

impl<R: EventRepository + EventQueryExecutor> EventService<R> {
    pub fn new(repository: R, config: PaginationConfig) -> Self {
        Self {
            repository: Arc::new(repository),
            config,
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Tenant-scoped console listing
    #[instrument(skip(self, filter), fields(tenant_id = ?filter.tenant_id))]
    pub async fn find(&self, filter: &EventFilter) -> Result<Page<Event>> {
        self.run(filter, Audience::Console).await
    }

    /// Published, public events only
    #[instrument(skip(self, filter))]
    pub async fn find_public(&self, filter: &EventFilter) -> Result<Page<Event>> {
        self.run(filter, Audience::Public).await
    }

    /// Like [`find`](Self::find) / [`find_public`](Self::find_public), but
    /// abandons the store calls as soon as `token` is cancelled
    #[instrument(skip(self, filter, token))]
    pub async fn find_with_cancellation(
        &self,
        filter: &EventFilter,
        audience: Audience,
        token: &CancellationToken,
    ) -> Result<Page<Event>> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Event query cancelled by caller");
                Err(EventError::Cancelled)
            }
            result = self.run(filter, audience) => result,
        }
    }

    async fn run(&self, filter: &EventFilter, audience: Audience) -> Result<Page<Event>> {
        if audience == Audience::Console
            && filter.tenant_id.as_deref().is_none_or(|t| t.trim().is_empty())
        {
            return Err(EventError::Validation("tenant id is required".to_string()));
        }

        let plan = QueryPlanBuilder::new(&self.config).build(filter, audience)?;
        let rows = self.repository.fetch_page(&plan).await?;

        let mode = if plan.is_cursor_mode() {
            PageMode::Cursor
        } else {
            PageMode::Offset {
                offset: plan.offset,
                total_count: self.repository.fetch_count(&plan).await,
            }
        };

        let page = paginate(rows, plan.limit, mode);
        debug!(
            returned = page.items.len(),
            has_next = page.pagination.has_next,
            total_count = ?page.pagination.total_count,
            "Event query completed"
        );
        Ok(page)
    }

    /// Single event with all of its sessions
    #[instrument(skip(self))]
    pub async fn get_event(&self, tenant_id: &str, id: Uuid) -> Result<Event> {
        let mut filter = EventFilter::for_tenant(tenant_id).with_limit(1);
        filter.event_id = Some(id);

        let plan = QueryPlanBuilder::new(&self.config).build(&filter, Audience::Console)?;
        self.repository
            .fetch_page(&plan)
            .await?
            .into_iter()
            .next()
            .ok_or(EventError::NotFound(id))
    }

    /// Create a draft event; a missing location is stored as (0, 0)
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_event(
        &self,
        tenant_id: &str,
        actor: Option<String>,
        input: CreateEvent,
    ) -> Result<Event> {
        input.validate()?;

        let event = self
            .repository
            .insert_event(Event::new(tenant_id, actor, input))
            .await?;
        info!(event_id = %event.id, "Event created");
        Ok(event)
    }

    /// Add a session to an existing event
    #[instrument(skip(self, input))]
    pub async fn create_session(
        &self,
        tenant_id: &str,
        event_id: Uuid,
        input: CreateSession,
    ) -> Result<Session> {
        input.validate()?;

        if input.start_time >= input.end_time {
            return Err(EventError::Validation(
                "start_time must be before end_time".to_string(),
            ));
        }

        if !self.repository.event_exists(tenant_id, event_id).await? {
            return Err(EventError::NotFound(event_id));
        }

        let session = self
            .repository
            .insert_session(Session::new(event_id, input))
            .await?;
        info!(session_id = %session.id, "Session created");
        Ok(session)
    }
}
