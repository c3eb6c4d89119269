//! Filter model for event queries
//!
//! [`EventQuery`] is the raw query string as a client sends it. It is
//! normalised once into an [`EventFilter`], which is what the plan builder
//! consumes: limits are clamped, page numbers are turned into offsets, and a
//! page number always wins over a cursor token.

use chrono::{DateTime, Utc};
use core_config::PaginationConfig;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::{EventError, Result};
use crate::models::{EventStatus, EventVisibility};

/// Radius used when neither the request nor configuration provides one
pub const DEFAULT_RADIUS_METERS: f64 = 1000.0;

/// Which listing a query is served for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Audience {
    /// Tenant-scoped management listing
    Console,
    /// Published, public events only
    Public,
}

/// Sortable event fields
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Title,
}

impl SortField {
    /// Document field this sort applies to
    pub fn as_field(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::UpdatedAt => "updated_at",
            Self::Title => "title",
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    /// `1` or `-1`, as used in `$sort`
    pub fn direction(&self) -> i32 {
        match self {
            Self::Asc => 1,
            Self::Desc => -1,
        }
    }

    /// Comparison operator that selects rows after a boundary in this order
    pub fn boundary_operator(&self) -> &'static str {
        match self {
            Self::Asc => "$gt",
            Self::Desc => "$lt",
        }
    }
}

/// Circle around a point
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    pub lng: f64,
    pub lat: f64,
    /// Meters; falls back to configuration, then [`DEFAULT_RADIUS_METERS`]
    pub radius: Option<f64>,
}

impl GeoFilter {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            lng,
            lat,
            radius: None,
        }
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    /// Effective radius: request, then configured default, then the constant
    pub fn radius_meters(&self, configured: Option<f64>) -> f64 {
        let usable = |r: &f64| r.is_finite() && *r > 0.0;
        self.radius
            .filter(usable)
            .or_else(|| configured.filter(usable))
            .unwrap_or(DEFAULT_RADIUS_METERS)
    }
}

/// Inclusive bounds on session `start_time`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionWindow {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl SessionWindow {
    /// Build a window, `None` when neither bound is set
    pub fn new(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Result<Option<Self>> {
        match (from, to) {
            (None, None) => Ok(None),
            (Some(from), Some(to)) if from > to => Err(EventError::Validation(
                "session_start_from must not be later than session_start_to".to_string(),
            )),
            _ => Ok(Some(Self { from, to })),
        }
    }
}

/// Query string accepted by the event listing endpoints
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventQuery {
    /// Narrows the public listing to one tenant; ignored on the console
    pub tenant_id: Option<String>,

    pub status: Option<EventStatus>,

    pub visibility: Option<EventVisibility>,

    /// Case-insensitive match on title and detail
    pub search: Option<String>,

    #[validate(range(min = -180.0, max = 180.0, message = "lng must be within [-180, 180]"))]
    pub lng: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]"))]
    pub lat: Option<f64>,

    /// Meters
    #[validate(range(exclusive_min = 0.0, message = "radius must be positive"))]
    pub radius: Option<f64>,

    /// Keep events with a session starting at or after this instant
    pub session_start_from: Option<DateTime<Utc>>,

    /// Keep events with a session starting at or before this instant
    pub session_start_to: Option<DateTime<Utc>>,

    pub sort_by: Option<SortField>,

    pub sort_order: Option<SortOrder>,

    pub limit: Option<u64>,

    pub offset: Option<u64>,

    /// 1-based page number; clears `page_token` when present
    pub page: Option<u64>,

    /// Alias of `limit`, takes precedence over it
    pub page_size: Option<u64>,

    /// Opaque token from a previous response's `next_token`
    pub page_token: Option<String>,
}

impl EventQuery {
    /// Validate and normalise into an [`EventFilter`]
    pub fn into_filter(self, config: &PaginationConfig) -> Result<EventFilter> {
        self.validate()?;

        let geo = match (self.lng, self.lat) {
            (Some(lng), Some(lat)) => Some(GeoFilter {
                lng,
                lat,
                radius: self.radius,
            }),
            (None, None) => None,
            _ => {
                return Err(EventError::Validation(
                    "lng and lat must be provided together".to_string(),
                ));
            }
        };

        let session_window = SessionWindow::new(self.session_start_from, self.session_start_to)?;

        let limit = config.page_size(self.page_size.or(self.limit));

        let (offset, page_token) = match self.page {
            Some(page) => (page.max(1).saturating_sub(1).saturating_mul(limit), None),
            None => (
                self.offset.unwrap_or(0),
                self.page_token.filter(|token| !token.trim().is_empty()),
            ),
        };

        Ok(EventFilter {
            tenant_id: self.tenant_id.filter(|t| !t.trim().is_empty()),
            event_id: None,
            status: self.status,
            visibility: self.visibility,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            geo,
            session_window,
            sort_by: self.sort_by.unwrap_or_default(),
            sort_order: self.sort_order.unwrap_or_default(),
            limit,
            offset,
            page_token,
        })
    }
}

/// Normalised filter criteria
///
/// `limit` is always at least 1. `page_token` is only set when no page number
/// was requested.
#[derive(Debug, Clone, PartialEq)]
pub struct EventFilter {
    pub tenant_id: Option<String>,
    /// Restricts the query to a single event
    pub event_id: Option<Uuid>,
    pub status: Option<EventStatus>,
    pub visibility: Option<EventVisibility>,
    pub search: Option<String>,
    pub geo: Option<GeoFilter>,
    pub session_window: Option<SessionWindow>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: u64,
    pub offset: u64,
    pub page_token: Option<String>,
}

impl EventFilter {
    pub fn for_tenant(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            ..Self::default()
        }
    }

    /// Whether the query pages by cursor rather than offset
    pub fn is_cursor_mode(&self) -> bool {
        self.page_token.is_some()
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_page_token(mut self, token: impl Into<String>) -> Self {
        self.page_token = Some(token.into());
        self
    }

    pub fn with_geo(mut self, geo: GeoFilter) -> Self {
        self.geo = Some(geo);
        self
    }

    pub fn with_session_window(mut self, window: SessionWindow) -> Self {
        self.session_window = Some(window);
        self
    }

    pub fn with_sort(mut self, sort_by: SortField, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }
}

impl Default for EventFilter {
    fn default() -> Self {
        Self {
            tenant_id: None,
            event_id: None,
            status: None,
            visibility: None,
            search: None,
            geo: None,
            session_window: None,
            sort_by: SortField::default(),
            sort_order: SortOrder::default(),
            limit: PaginationConfig::default().default_page_size,
            offset: 0,
            page_token: None,
        }
    }
}
