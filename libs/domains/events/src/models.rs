//! Event domain models

use bson::serde_helpers::{chrono_datetime_as_bson_datetime, uuid_1_as_binary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pagination::{Page, Paginated, Pagination};

/// Event lifecycle status
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
pub enum EventStatus {
    #[default]
    Draft,
    Published,
    Archived,
}

/// Who may see an event on the public listing
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
pub enum EventVisibility {
    Public,
    #[default]
    Private,
}

/// GeoJSON geometry type; only points are stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryType {
    #[default]
    Point,
}

/// GeoJSON point, `coordinates` is `[lng, lat]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    #[serde(rename = "type")]
    pub kind: GeometryType,
    pub coordinates: [f64; 2],
}

impl GeoPoint {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self {
            kind: GeometryType::Point,
            coordinates: [lng, lat],
        }
    }

    /// Stand-in for "no location", keeps documents valid for the 2dsphere index
    pub fn sentinel() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn lng(&self) -> f64 {
        self.coordinates[0]
    }

    pub fn lat(&self) -> f64 {
        self.coordinates[1]
    }

    pub fn is_sentinel(&self) -> bool {
        self.coordinates == [0.0, 0.0]
    }
}

impl Default for GeoPoint {
    fn default() -> Self {
        Self::sentinel()
    }
}

/// One question/answer pair shown on the event page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

/// Event aggregate as stored in the `events` collection
///
/// `sessions` is never persisted; it is filled by the session join when the
/// event is read back through a query plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "_id", with = "uuid_1_as_binary")]
    pub id: Uuid,

    pub tenant_id: String,

    #[serde(default)]
    pub status: EventStatus,

    #[serde(default)]
    pub visibility: EventVisibility,

    pub title: String,

    #[serde(default)]
    pub location: GeoPoint,

    #[serde(default)]
    pub detail: String,

    #[serde(default)]
    pub faq: Vec<FaqEntry>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,

    #[serde(default)]
    pub created_by: Option<String>,

    #[serde(default)]
    pub updated_by: Option<String>,

    #[serde(default, skip_serializing)]
    pub sessions: Vec<Session>,
}

impl Event {
    /// Create a draft event for a tenant from a validated request
    pub fn new(tenant_id: impl Into<String>, actor: Option<String>, input: CreateEvent) -> Self {
        let now = Utc::now();
        let location = input
            .location
            .map(|l| GeoPoint::new(l.lng, l.lat))
            .unwrap_or_default();

        Self {
            id: Uuid::now_v7(),
            tenant_id: tenant_id.into(),
            status: input.status.unwrap_or_default(),
            visibility: input.visibility.unwrap_or_default(),
            title: input.title,
            location,
            detail: input.detail.unwrap_or_default(),
            faq: input.faq,
            created_at: now,
            updated_at: now,
            created_by: actor.clone(),
            updated_by: actor,
            sessions: Vec::new(),
        }
    }
}

impl Paginated for Event {
    fn cursor_id(&self) -> Uuid {
        self.id
    }

    fn cursor_timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Scheduled occurrence of an event, stored in the `sessions` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "_id", with = "uuid_1_as_binary")]
    pub id: Uuid,

    #[serde(with = "uuid_1_as_binary")]
    pub event_id: Uuid,

    #[serde(default)]
    pub name: Option<String>,

    /// `None` means unlimited
    #[serde(default)]
    pub capacity: Option<u32>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub start_time: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub end_time: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,

    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(event_id: Uuid, input: CreateSession) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            event_id,
            name: input.name,
            capacity: input.capacity,
            start_time: input.start_time,
            end_time: input.end_time,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Longitude/latitude pair as accepted on the wire
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
pub struct Location {
    #[validate(range(min = -180.0, max = 180.0, message = "lng must be within [-180, 180]"))]
    pub lng: f64,

    #[validate(range(min = -90.0, max = 90.0, message = "lat must be within [-90, 90]"))]
    pub lat: f64,
}

/// DTO for creating an event
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[serde(default)]
    pub status: Option<EventStatus>,

    #[serde(default)]
    pub visibility: Option<EventVisibility>,

    /// Omitted location is stored as (0, 0)
    #[serde(default)]
    #[validate(nested)]
    pub location: Option<Location>,

    #[serde(default)]
    pub detail: Option<String>,

    #[serde(default)]
    pub faq: Vec<FaqEntry>,
}

/// DTO for adding a session to an event
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateSession {
    #[serde(default)]
    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    #[serde(default)]
    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub capacity: Option<u32>,

    pub start_time: DateTime<Utc>,

    pub end_time: DateTime<Utc>,
}

/// Session as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub event_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            id: session.id,
            event_id: session.event_id,
            name: session.name,
            capacity: session.capacity,
            start_time: session.start_time,
            end_time: session.end_time,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// Event with its sessions as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub tenant_id: String,
    pub status: EventStatus,
    pub visibility: EventVisibility,
    pub title: String,
    pub location: Location,
    pub detail: String,
    pub faq: Vec<FaqEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    pub sessions: Vec<SessionResponse>,
}

impl From<Event> for EventResponse {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            tenant_id: event.tenant_id,
            status: event.status,
            visibility: event.visibility,
            title: event.title,
            location: Location {
                lng: event.location.lng(),
                lat: event.location.lat(),
            },
            detail: event.detail,
            faq: event.faq,
            created_at: event.created_at,
            updated_at: event.updated_at,
            created_by: event.created_by,
            updated_by: event.updated_by,
            sessions: event.sessions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Page of events with pagination metadata
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventListResponse {
    pub data: Vec<EventResponse>,
    pub pagination: Pagination,
}

impl From<Page<Event>> for EventListResponse {
    fn from(page: Page<Event>) -> Self {
        Self {
            data: page.items.into_iter().map(Into::into).collect(),
            pagination: page.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};
    use chrono::Duration;

    fn create_event_input() -> CreateEvent {
        CreateEvent {
            title: "Night market tour".to_string(),
            status: None,
            visibility: None,
            location: None,
            detail: None,
            faq: vec![],
        }
    }

    #[test]
    fn test_missing_location_becomes_sentinel() {
        let event = Event::new("tenant-a", None, create_event_input());
        assert!(event.location.is_sentinel());
        assert_eq!(event.status, EventStatus::Draft);
        assert_eq!(event.visibility, EventVisibility::Private);
    }

    #[test]
    fn test_event_bson_layout() {
        let mut input = create_event_input();
        input.location = Some(Location {
            lng: 121.5654,
            lat: 25.0330,
        });
        let event = Event::new("tenant-a", Some("user-1".into()), input);

        let document = bson::to_document(&event).unwrap();
        assert!(matches!(document.get("_id"), Some(Bson::Binary(_))));
        assert!(matches!(document.get("created_at"), Some(Bson::DateTime(_))));
        assert_eq!(document.get_str("status").unwrap(), "draft");
        assert!(document.get("sessions").is_none());

        let location = document.get_document("location").unwrap();
        assert_eq!(location.get_str("type").unwrap(), "Point");
        assert_eq!(
            location.get_array("coordinates").unwrap(),
            &vec![Bson::Double(121.5654), Bson::Double(25.0330)]
        );
    }

    #[test]
    fn test_event_decodes_joined_sessions() {
        let event = Event::new("tenant-a", None, create_event_input());
        let start = Utc::now();
        let session = Session::new(
            event.id,
            CreateSession {
                name: Some("Morning".into()),
                capacity: None,
                start_time: start,
                end_time: start + Duration::hours(2),
            },
        );

        let mut document = bson::to_document(&event).unwrap();
        document.insert("sessions", vec![bson::to_bson(&session).unwrap()]);

        let decoded: Event = bson::from_document(document).unwrap();
        assert_eq!(decoded.id, event.id);
        assert_eq!(decoded.sessions.len(), 1);
        assert_eq!(decoded.sessions[0].event_id, event.id);
        assert_eq!(decoded.sessions[0].name.as_deref(), Some("Morning"));
    }

    #[test]
    fn test_event_response_flattens_location() {
        let mut input = create_event_input();
        input.location = Some(Location { lng: 10.0, lat: 20.0 });
        let response = EventResponse::from(Event::new("tenant-a", None, input));
        assert_eq!(response.location, Location { lng: 10.0, lat: 20.0 });
        assert!(response.sessions.is_empty());
    }

    #[test]
    fn test_create_event_validation() {
        let mut input = create_event_input();
        input.title = String::new();
        assert!(input.validate().is_err());

        let mut input = create_event_input();
        input.location = Some(Location { lng: 200.0, lat: 0.0 });
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_legacy_document_without_optional_fields_decodes() {
        let id = Uuid::now_v7();
        let now = bson::DateTime::now();
        let document = doc! {
            "_id": bson::Uuid::from(id),
            "tenant_id": "tenant-a",
            "title": "Legacy",
            "created_at": now,
            "updated_at": now,
        };
        let event: Event = bson::from_document(document).unwrap();
        assert_eq!(event.id, id);
        assert!(event.location.is_sentinel());
        assert!(event.faq.is_empty());
    }
}
