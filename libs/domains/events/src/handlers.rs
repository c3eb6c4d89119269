//! HTTP handlers for the events API

use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::error::{ErrorResponse, EventError};
use crate::filter::EventQuery;
use crate::models::{
    CreateEvent, CreateSession, EventListResponse, EventResponse, SessionResponse,
};
use crate::repository::{EventQueryExecutor, EventRepository};
use crate::service::EventService;

/// Header carrying the already-authorised tenant id
pub const TENANT_HEADER: &str = "x-tenant-id";

/// Optional header naming the user performing a write
pub const ACTOR_HEADER: &str = "x-actor-id";

/// Events router state
pub type EventsState<R> = Arc<EventService<R>>;

/// Tenant id taken from the `x-tenant-id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for TenantId {
    type Rejection = EventError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(TENANT_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| TenantId(value.to_string()))
            .ok_or_else(|| EventError::Validation(format!("missing {} header", TENANT_HEADER)))
    }
}

/// [`EventQuery`] from the query string
///
/// Unlike a bare `Query`, a malformed value (an unknown `sort_order`, a
/// non-numeric `limit`) is answered with the JSON error body.
#[derive(Debug, Clone)]
pub struct ListQuery(pub EventQuery);

impl<S: Send + Sync> FromRequestParts<S> for ListQuery {
    type Rejection = EventError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(query) = Query::<EventQuery>::from_request_parts(parts, state).await?;
        Ok(Self(query))
    }
}

fn actor(headers: &HeaderMap) -> Option<String> {
    headers
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Tenant-scoped management routes, mounted at `/console/events`
pub fn console_router<R>() -> Router<EventsState<R>>
where
    R: EventRepository + EventQueryExecutor + 'static,
{
    Router::new()
        .route("/", get(list_console_events::<R>).post(create_event::<R>))
        .route("/{id}", get(get_event::<R>))
        .route("/{id}/sessions", post(create_session::<R>))
}

/// Public listing, mounted at `/public/events`
pub fn public_router<R>() -> Router<EventsState<R>>
where
    R: EventRepository + EventQueryExecutor + 'static,
{
    Router::new().route("/", get(list_public_events::<R>))
}

/// Both routers with the service attached as state
pub fn router<R>(service: EventService<R>) -> Router
where
    R: EventRepository + EventQueryExecutor + 'static,
{
    Router::new()
        .nest("/console/events", console_router())
        .nest("/public/events", public_router())
        .with_state(Arc::new(service))
}

/// List a tenant's events
#[utoipa::path(
    get,
    path = "/api/console/events",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant id"),
        EventQuery,
    ),
    responses(
        (status = 200, description = "Page of events", body = EventListResponse),
        (status = 400, description = "Invalid filter or pagination token", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, query))]
pub async fn list_console_events<R>(
    State(state): State<EventsState<R>>,
    TenantId(tenant_id): TenantId,
    ListQuery(query): ListQuery,
) -> Result<Json<EventListResponse>, EventError>
where
    R: EventRepository + EventQueryExecutor,
{
    let mut filter = query.into_filter(state.config())?;
    filter.tenant_id = Some(tenant_id);

    let page = state.find(&filter).await?;
    Ok(Json(page.into()))
}

/// List published public events
#[utoipa::path(
    get,
    path = "/api/public/events",
    params(EventQuery),
    responses(
        (status = 200, description = "Page of events", body = EventListResponse),
        (status = 400, description = "Invalid filter or pagination token", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, query))]
pub async fn list_public_events<R>(
    State(state): State<EventsState<R>>,
    ListQuery(query): ListQuery,
) -> Result<Json<EventListResponse>, EventError>
where
    R: EventRepository + EventQueryExecutor,
{
    let filter = query.into_filter(state.config())?;
    let page = state.find_public(&filter).await?;
    Ok(Json(page.into()))
}

/// Get one event with its sessions
#[utoipa::path(
    get,
    path = "/api/console/events/{id}",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant id"),
        ("id" = Uuid, Path, description = "Event id")
    ),
    responses(
        (status = 200, description = "Event found", body = EventResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_event<R>(
    State(state): State<EventsState<R>>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
) -> Result<Json<EventResponse>, EventError>
where
    R: EventRepository + EventQueryExecutor,
{
    let event = state.get_event(&tenant_id, id).await?;
    Ok(Json(event.into()))
}

/// Create an event
#[utoipa::path(
    post,
    path = "/api/console/events",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant id"),
        ("x-actor-id" = Option<String>, Header, description = "User performing the change")
    ),
    request_body = CreateEvent,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, headers, input), fields(title = %input.title))]
pub async fn create_event<R>(
    State(state): State<EventsState<R>>,
    TenantId(tenant_id): TenantId,
    headers: HeaderMap,
    Json(input): Json<CreateEvent>,
) -> Result<impl IntoResponse, EventError>
where
    R: EventRepository + EventQueryExecutor,
{
    let event = state
        .create_event(&tenant_id, actor(&headers), input)
        .await?;
    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// Add a session to an event
#[utoipa::path(
    post,
    path = "/api/console/events/{id}/sessions",
    params(
        ("x-tenant-id" = String, Header, description = "Tenant id"),
        ("id" = Uuid, Path, description = "Event id")
    ),
    request_body = CreateSession,
    responses(
        (status = 201, description = "Session created", body = SessionResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "Event not found", body = ErrorResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    ),
    tag = "events"
)]
#[instrument(skip(state, input))]
pub async fn create_session<R>(
    State(state): State<EventsState<R>>,
    TenantId(tenant_id): TenantId,
    Path(id): Path<Uuid>,
    Json(input): Json<CreateSession>,
) -> Result<impl IntoResponse, EventError>
where
    R: EventRepository + EventQueryExecutor,
{
    let session = state.create_session(&tenant_id, id, input).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse::from(session))))
}
