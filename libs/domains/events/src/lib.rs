//! Events Domain
//!
//! Multi-tenant events with child sessions, stored in MongoDB, and a single
//! query engine that serves both the tenant console and the public listing.
//!
//! # Query flow
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────────┐   ┌────────────┐
//! │ EventQuery   │──►│ EventFilter  │──►│ QueryPlanBuilder │──►│ QueryPlan  │
//! │ (raw params) │   │ (normalised) │   │                  │   │ (stages)   │
//! └──────────────┘   └──────────────┘   └──────────────────┘   └─────┬──────┘
//!                                                                     │
//!                       ┌─────────────────────────────────────────────┤
//!                       ▼                                             ▼
//!               fetch_page (rows)                      fetch_count (offset mode)
//!                       │                                             │
//!                       └────────────────► paginate ◄─────────────────┘
//!                                             │
//!                                             ▼
//!                                 Page<Event> + Pagination
//! ```
//!
//! Sessions live in their own collection and are joined in at read time.
//! Paging is either by offset (page numbers, exact totals when the count
//! succeeds) or by opaque cursor token (no totals, one sentinel row).

use utoipa::OpenApi;

pub mod cursor;
mod error;
pub mod filter;
pub mod handlers;
mod models;
mod mongodb;
pub mod pagination;
pub mod pipeline;
mod repository;
mod service;

pub use cursor::Cursor;
pub use error::{ErrorResponse, EventError, Result};
pub use filter::{Audience, EventFilter, EventQuery, GeoFilter, SessionWindow, SortField, SortOrder};
pub use handlers::{EventsState, ListQuery, TenantId, console_router, public_router, router};
pub use models::{
    CreateEvent, CreateSession, Event, EventListResponse, EventResponse, EventStatus,
    EventVisibility, FaqEntry, GeoPoint, Location, Session, SessionResponse,
};
pub use self::mongodb::MongoEventRepository;
pub use pagination::{Page, PageMode, Paginated, Pagination, paginate};
pub use pipeline::{QueryPlan, QueryPlanBuilder, Stage};
pub use repository::{EventQueryExecutor, EventRepository};
pub use service::EventService;

/// OpenAPI documentation for Events API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_console_events,
        handlers::list_public_events,
        handlers::get_event,
        handlers::create_event,
        handlers::create_session,
    ),
    components(schemas(
        EventListResponse,
        EventResponse,
        SessionResponse,
        CreateEvent,
        CreateSession,
        Location,
        FaqEntry,
        EventStatus,
        EventVisibility,
        SortField,
        SortOrder,
        Pagination,
        ErrorResponse,
    )),
    tags(
        (name = "events", description = "Event queries with cursor and offset pagination")
    )
)]
pub struct ApiDoc;
