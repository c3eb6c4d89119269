//! Integration tests for the events query engine
//!
//! These run the real aggregation pipelines against MongoDB started in a
//! container, so they need Docker:
//!
//! ```text
//! cargo test -p domain_events -- --ignored
//! ```

use chrono::{Duration, TimeZone, Utc};
use core_config::PaginationConfig;
use domain_events::*;
use test_utils::assertions::{assert_some, assert_unique_ids};
use test_utils::{TestDataBuilder, TestMongo};

const TAIPEI_101: (f64, f64) = (121.5654, 25.0330);

async fn service(mongo: &TestMongo) -> EventService<MongoEventRepository> {
    let repository = MongoEventRepository::new(&mongo.database());
    repository.init_indexes().await.unwrap();
    EventService::new(repository, PaginationConfig::default())
}

fn input(title: &str) -> CreateEvent {
    CreateEvent {
        title: title.to_string(),
        status: Some(EventStatus::Published),
        visibility: Some(EventVisibility::Public),
        location: None,
        detail: None,
        faq: vec![],
    }
}

fn session(start: chrono::DateTime<Utc>) -> CreateSession {
    CreateSession {
        name: None,
        capacity: None,
        start_time: start,
        end_time: start + Duration::hours(2),
    }
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_geo_radius_includes_near_and_excludes_far() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let tenant = TestDataBuilder::from_test_name("geo_radius").tenant_id();

    let (lng, lat) = TAIPEI_101;

    let mut near = input("200m north");
    near.location = Some(Location {
        lng,
        lat: lat + 0.0018,
    });
    let near = service.create_event(&tenant, None, near).await.unwrap();

    let mut far = input("50km north");
    far.location = Some(Location {
        lng,
        lat: lat + 0.45,
    });
    service.create_event(&tenant, None, far).await.unwrap();

    let filter =
        EventFilter::for_tenant(&tenant).with_geo(GeoFilter::new(lng, lat).with_radius(1000.0));
    let page = service.find(&filter).await.unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, near.id);
    assert_eq!(page.pagination.total_count, Some(1));
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_session_window_excludes_events_without_matching_sessions() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let tenant = TestDataBuilder::from_test_name("session_window").tenant_id();

    let march = Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap();
    let june = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();

    let in_window = service
        .create_event(&tenant, None, input("March workshop"))
        .await
        .unwrap();
    service
        .create_session(&tenant, in_window.id, session(march))
        .await
        .unwrap();
    service
        .create_session(&tenant, in_window.id, session(june))
        .await
        .unwrap();

    let out_of_window = service
        .create_event(&tenant, None, input("June workshop"))
        .await
        .unwrap();
    service
        .create_session(&tenant, out_of_window.id, session(june))
        .await
        .unwrap();

    service
        .create_event(&tenant, None, input("No sessions yet"))
        .await
        .unwrap();

    let window = SessionWindow::new(
        Some(Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()),
        Some(Utc.with_ymd_and_hms(2025, 3, 31, 23, 59, 59).unwrap()),
    )
    .unwrap()
    .unwrap();

    let page = service
        .find(&EventFilter::for_tenant(&tenant).with_session_window(window))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, in_window.id);
    // Only the session inside the window is attached
    assert_eq!(page.items[0].sessions.len(), 1);
    assert_eq!(page.items[0].sessions[0].start_time, march);
    assert_eq!(page.pagination.total_count, Some(1));

    // Without a window every event comes back, each with all of its sessions
    let page = service.find(&EventFilter::for_tenant(&tenant)).await.unwrap();
    assert_eq!(page.items.len(), 3);
    let hydrated = assert_some(
        page.items.iter().find(|e| e.id == in_window.id),
        "event with two sessions",
    );
    assert_eq!(hydrated.sessions.len(), 2);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_cursor_walk_is_complete_and_repeatable() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let builder = TestDataBuilder::from_test_name("cursor_walk");
    let tenant = builder.tenant_id();

    let mut created = Vec::new();
    for i in 0..7 {
        let event = service
            .create_event(&tenant, None, input(&builder.name("event", &i.to_string())))
            .await
            .unwrap();
        created.push(event.id);
    }

    let first = service
        .find(&EventFilter::for_tenant(&tenant).with_limit(3))
        .await
        .unwrap();
    assert_eq!(first.items.len(), 3);
    assert!(first.pagination.has_next);

    let mut seen: Vec<_> = first.items.iter().map(|e| e.id).collect();
    let mut token = first.pagination.next_token.clone();

    while let Some(current) = token {
        let filter = EventFilter::for_tenant(&tenant)
            .with_limit(3)
            .with_page_token(current.clone());

        let page = service.find(&filter).await.unwrap();
        let again = service.find(&filter).await.unwrap();

        let ids: Vec<_> = page.items.iter().map(|e| e.id).collect();
        let ids_again: Vec<_> = again.items.iter().map(|e| e.id).collect();
        assert_eq!(ids, ids_again);
        assert_eq!(page.pagination.next_token, again.pagination.next_token);
        assert!(page.pagination.has_prev);
        assert!(page.pagination.total_count.is_none());

        seen.extend(ids);
        token = page.pagination.next_token;
    }

    assert_unique_ids(&seen, "cursor walk");
    assert_eq!(seen.len(), created.len());

    // Newest first
    created.reverse();
    assert_eq!(seen, created);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_offset_pages_report_exact_counts() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let builder = TestDataBuilder::from_test_name("offset_counts");
    let tenant = builder.tenant_id();

    let mut created = Vec::new();
    for i in 0..25 {
        let event = service
            .create_event(&tenant, None, input(&builder.name("event", &i.to_string())))
            .await
            .unwrap();
        created.push(event.id);
    }
    // Newest first
    created.reverse();

    let last = service
        .find(&EventFilter::for_tenant(&tenant).with_limit(10).with_offset(20))
        .await
        .unwrap();
    assert_eq!(last.items.len(), 5);
    // The third page holds the five oldest events, still newest first
    let last_ids: Vec<_> = last.items.iter().map(|e| e.id).collect();
    assert_eq!(last_ids, created[20..]);
    assert_eq!(last.pagination.total_count, Some(25));
    assert_eq!(last.pagination.current_page, Some(3));
    assert_eq!(last.pagination.total_pages, Some(3));
    assert!(!last.pagination.has_next);
    assert!(last.pagination.has_prev);

    let first = service
        .find(&EventFilter::for_tenant(&tenant).with_limit(10))
        .await
        .unwrap();
    assert_eq!(first.pagination.current_page, Some(1));
    assert!(first.pagination.has_next);
    assert!(!first.pagination.has_prev);
    let first_ids: Vec<_> = first.items.iter().map(|e| e.id).collect();
    assert_eq!(first_ids, created[..10]);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_page_number_walk_is_complete_and_ordered() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let builder = TestDataBuilder::from_test_name("page_walk");
    let tenant = builder.tenant_id();
    let config = PaginationConfig::default();

    let mut created = Vec::new();
    for i in 0..25 {
        let event = service
            .create_event(&tenant, None, input(&builder.name("event", &i.to_string())))
            .await
            .unwrap();
        created.push(event.id);
    }

    let mut seen = Vec::new();
    for page in 1..=3 {
        let query = EventQuery {
            tenant_id: Some(tenant.clone()),
            page: Some(page),
            page_size: Some(10),
            ..EventQuery::default()
        };
        let result = service
            .find(&query.into_filter(&config).unwrap())
            .await
            .unwrap();

        assert_eq!(result.pagination.current_page, Some(page as u32));
        assert_eq!(result.pagination.has_next, page < 3);
        seen.extend(result.items.iter().map(|e| e.id));
    }

    assert_unique_ids(&seen, "page walk");
    created.reverse();
    assert_eq!(seen, created);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_public_listing_and_tenant_isolation() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let tenant_a = TestDataBuilder::from_test_name("isolation_a").tenant_id();
    let tenant_b = TestDataBuilder::from_test_name("isolation_b").tenant_id();

    let public = service
        .create_event(&tenant_a, None, input("Open day"))
        .await
        .unwrap();

    let mut draft = input("Unannounced");
    draft.status = Some(EventStatus::Draft);
    service.create_event(&tenant_a, None, draft).await.unwrap();

    let mut private = input("Staff party");
    private.visibility = Some(EventVisibility::Private);
    service.create_event(&tenant_a, None, private).await.unwrap();

    service
        .create_event(&tenant_b, None, input("Other tenant"))
        .await
        .unwrap();

    let console = service.find(&EventFilter::for_tenant(&tenant_a)).await.unwrap();
    assert_eq!(console.items.len(), 3);
    assert!(console.items.iter().all(|e| e.tenant_id == tenant_a));

    let narrowed = service
        .find_public(&EventFilter::for_tenant(&tenant_a))
        .await
        .unwrap();
    assert_eq!(narrowed.items.len(), 1);
    assert_eq!(narrowed.items[0].id, public.id);

    let everyone = service.find_public(&EventFilter::default()).await.unwrap();
    assert_eq!(everyone.items.len(), 2);
}

#[tokio::test]
#[ignore] // Requires Docker
async fn test_get_event_and_duplicate_session() {
    let mongo = TestMongo::new().await;
    let service = service(&mongo).await;
    let builder = TestDataBuilder::from_test_name("get_event");
    let tenant = builder.tenant_id();

    let event = service
        .create_event(&tenant, Some(builder.actor_id()), input("Concert"))
        .await
        .unwrap();
    let start = Utc.with_ymd_and_hms(2025, 8, 1, 19, 0, 0).unwrap();
    service
        .create_session(&tenant, event.id, session(start))
        .await
        .unwrap();

    let duplicate = service
        .create_session(&tenant, event.id, session(start))
        .await;
    assert!(matches!(duplicate, Err(EventError::Validation(_))));

    let fetched = service.get_event(&tenant, event.id).await.unwrap();
    assert_eq!(fetched.sessions.len(), 1);
    assert_eq!(fetched.created_by, Some(builder.actor_id()));
    assert!(fetched.location.is_sentinel());

    let other_tenant = service.get_event("someone-else", event.id).await;
    assert!(matches!(other_tenant, Err(EventError::NotFound(_))));
}
