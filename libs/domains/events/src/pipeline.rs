//! Query plan builder
//!
//! A filter becomes an ordered list of [`Stage`]s:
//!
//! ```text
//! Match ─► Lookup(sessions) ─► [RequireSessions] ─► Sort ─► [Skip] ─► Limit
//! ```
//!
//! `RequireSessions` only follows a time-filtered lookup. `Skip` is only
//! emitted in offset mode, and always after `Sort` so it skips sorted rows. In cursor mode `Limit` asks for one extra row.
//! The cursor boundary and the sort direction both come from the same
//! [`SortOrder`] value, so they cannot disagree.

use bson::{Bson, Document, doc};
use core_config::PaginationConfig;
use tracing::debug;
use uuid::Uuid;

use crate::cursor::Cursor;
use crate::error::Result;
use crate::filter::{Audience, EventFilter, SessionWindow, SortField, SortOrder};
use crate::models::{EventStatus, EventVisibility};

/// Equatorial radius used to turn meters into radians for `$centerSphere`
pub const EARTH_RADIUS_METERS: f64 = 6_378_100.0;

pub const EVENTS_COLLECTION: &str = "events";
pub const SESSIONS_COLLECTION: &str = "sessions";

pub(crate) fn uuid_bson(id: Uuid) -> Bson {
    Bson::from(bson::Uuid::from(id))
}

fn saturating_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// One step of an event query
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    /// ANDed selection predicates
    Match(Document),
    /// Attach sessions, optionally only those starting inside a window
    Lookup(Option<SessionWindow>),
    /// Drop events left without sessions by a time-filtered lookup
    RequireSessions,
    Skip(u64),
    Sort { field: SortField, order: SortOrder },
    Limit(u64),
}

impl Stage {
    /// Render as an aggregation stage
    pub fn to_document(&self) -> Document {
        match self {
            Self::Match(predicates) => doc! { "$match": predicates.clone() },
            Self::Lookup(window) => {
                let mut matcher = doc! { "$expr": { "$eq": ["$event_id", "$$event_id"] } };
                if let Some(window) = window {
                    let mut start_time = Document::new();
                    if let Some(from) = window.from {
                        start_time.insert("$gte", bson::DateTime::from_chrono(from));
                    }
                    if let Some(to) = window.to {
                        start_time.insert("$lte", bson::DateTime::from_chrono(to));
                    }
                    matcher.insert("start_time", start_time);
                }

                doc! {
                    "$lookup": {
                        "from": SESSIONS_COLLECTION,
                        "let": { "event_id": "$_id" },
                        "pipeline": [
                            { "$match": matcher },
                            { "$sort": { "start_time": 1, "_id": 1 } },
                        ],
                        "as": "sessions",
                    }
                }
            }
            Self::RequireSessions => doc! { "$match": { "sessions": { "$ne": [] } } },
            Self::Skip(n) => doc! { "$skip": saturating_i64(*n) },
            Self::Sort { field, order } => {
                let direction = order.direction();
                let mut sort = Document::new();
                sort.insert(field.as_field(), direction);
                // _id breaks ties so equal sort keys page deterministically
                sort.insert("_id", direction);
                doc! { "$sort": sort }
            }
            Self::Limit(n) => doc! { "$limit": saturating_i64(*n) },
        }
    }
}

/// Built query: its stages plus what the pagination processor needs
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    pub stages: Vec<Stage>,
    /// Requested page size
    pub limit: u64,
    pub offset: u64,
    /// Decoded token when paging by cursor
    pub cursor: Option<Cursor>,
}

impl QueryPlan {
    pub fn is_cursor_mode(&self) -> bool {
        self.cursor.is_some()
    }

    /// Aggregation pipeline that fetches the page
    pub fn to_pipeline(&self) -> Vec<Document> {
        self.stages.iter().map(Stage::to_document).collect()
    }

    /// Aggregation pipeline that counts every row the plan could page over
    ///
    /// Skip, sort and limit do not change the count and are dropped. The
    /// lookup is only kept when a later stage filters on its result.
    pub fn count_pipeline(&self) -> Vec<Document> {
        let needs_sessions = self.stages.contains(&Stage::RequireSessions);

        let mut pipeline: Vec<Document> = self
            .stages
            .iter()
            .filter(|stage| match stage {
                Stage::Match(_) | Stage::RequireSessions => true,
                Stage::Lookup(_) => needs_sessions,
                Stage::Skip(_) | Stage::Sort { .. } | Stage::Limit(_) => false,
            })
            .map(Stage::to_document)
            .collect();

        pipeline.push(doc! { "$count": "total" });
        pipeline
    }
}

/// Builds [`QueryPlan`]s from normalised filters
#[derive(Debug, Clone, Copy)]
pub struct QueryPlanBuilder<'a> {
    config: &'a PaginationConfig,
}

impl<'a> QueryPlanBuilder<'a> {
    pub fn new(config: &'a PaginationConfig) -> Self {
        Self { config }
    }

    pub fn build(&self, filter: &EventFilter, audience: Audience) -> Result<QueryPlan> {
        let cursor = filter
            .page_token
            .as_deref()
            .map(Cursor::decode)
            .transpose()?;

        let limit = filter.limit.max(1);
        let mut stages = vec![
            Stage::Match(self.selection(filter, audience, cursor.as_ref())),
            Stage::Lookup(filter.session_window),
        ];

        if filter.session_window.is_some() {
            stages.push(Stage::RequireSessions);
        }

        stages.push(Stage::Sort {
            field: filter.sort_by,
            order: filter.sort_order,
        });

        if cursor.is_none() && filter.offset > 0 {
            stages.push(Stage::Skip(filter.offset));
        }

        let fetch = if cursor.is_some() {
            limit.saturating_add(1)
        } else {
            limit
        };
        stages.push(Stage::Limit(fetch));

        debug!(
            audience = %audience,
            cursor_mode = cursor.is_some(),
            stage_count = stages.len(),
            limit,
            offset = filter.offset,
            "Built event query plan"
        );

        Ok(QueryPlan {
            stages,
            limit,
            offset: if cursor.is_some() { 0 } else { filter.offset },
            cursor,
        })
    }

    fn selection(
        &self,
        filter: &EventFilter,
        audience: Audience,
        cursor: Option<&Cursor>,
    ) -> Document {
        let mut selection = Document::new();

        if let Some(tenant_id) = &filter.tenant_id {
            selection.insert("tenant_id", tenant_id.as_str());
        }

        match audience {
            Audience::Public => {
                selection.insert("status", EventStatus::Published.to_string());
                selection.insert("visibility", EventVisibility::Public.to_string());
            }
            Audience::Console => {
                if let Some(status) = filter.status {
                    selection.insert("status", status.to_string());
                }
                if let Some(visibility) = filter.visibility {
                    selection.insert("visibility", visibility.to_string());
                }
            }
        }

        let mut id = Document::new();
        if let Some(event_id) = filter.event_id {
            id.insert("$eq", uuid_bson(event_id));
        }
        if let Some(last_id) = cursor.and_then(|c| c.last_id) {
            id.insert(filter.sort_order.boundary_operator(), uuid_bson(last_id));
        }
        if !id.is_empty() {
            selection.insert("_id", id);
        }

        if let Some(search) = &filter.search {
            let pattern = regex::escape(search);
            selection.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": pattern.as_str(), "$options": "i" } },
                    doc! { "detail": { "$regex": pattern.as_str(), "$options": "i" } },
                ],
            );
        }

        if let Some(geo) = &filter.geo {
            let radians = geo.radius_meters(self.config.default_location_radius)
                / EARTH_RADIUS_METERS;
            selection.insert(
                "location",
                doc! {
                    "$geoWithin": {
                        "$centerSphere": [[geo.lng, geo.lat], radians]
                    }
                },
            );
        }

        // Documents without a usable point are never returned
        selection.insert(
            "location.coordinates",
            doc! { "$exists": true, "$type": "array" },
        );

        selection
    }
}
