use std::sync::Arc;

use axum::http::StatusCode;
use tower::ServiceExt;

use super::common::*;
use crate::actor::Actor;
use crate::notifications::domain::ScheduleChannels;
use crate::notifications::router::{notification_router, NotificationState};
use crate::notifications::schedules::ScheduleService;
use crate::store::MemoryStore;

fn router(store: &MemoryStore) -> axum::Router {
    let schedules = Arc::new(ScheduleService::new(Arc::new(store.clone())));
    let (engine, _) = engine(store);
    notification_router(NotificationState {
        schedules,
        engine: Arc::new(engine),
    })
}

fn post_schedule(actor: Actor, body: serde_json::Value) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::post("/api/v1/notifications/schedules")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .extension(actor)
        .body(axum::body::Body::from(
            serde_json::to_vec(&body).expect("serializes"),
        ))
        .expect("request builds")
}

#[tokio::test]
async fn schedule_creation_round_trips() {
    let store = MemoryStore::default();
    let body = serde_json::json!({
        "days_before_expiry": 7,
        "notification_type": "both"
    });

    let response = router(&store)
        .oneshot(post_schedule(system_admin(), body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(store.schedule_rows().len(), 1);
    assert_eq!(store.schedule_rows()[0].days_before_expiry, 7);
}

#[tokio::test]
async fn duplicate_schedule_maps_to_conflict() {
    let store = MemoryStore::default();
    insert_schedule(&store, schedule("g-7", None, 7, ScheduleChannels::Email));

    let body = serde_json::json!({
        "days_before_expiry": 7,
        "notification_type": "email"
    });
    let response = router(&store)
        .oneshot(post_schedule(system_admin(), body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn out_of_range_schedule_offsets_map_to_unprocessable() {
    let store = MemoryStore::default();
    let body = serde_json::json!({
        "days_before_expiry": 99999,
        "notification_type": "email"
    });

    let response = router(&store)
        .oneshot(post_schedule(system_admin(), body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.schedule_rows().is_empty());
}

#[tokio::test]
async fn tenant_admin_cannot_create_global_schedules_over_http() {
    let store = MemoryStore::default();
    let body = serde_json::json!({
        "days_before_expiry": 14,
        "notification_type": "in_app"
    });

    let response = router(&store)
        .oneshot(post_schedule(school_admin("lincoln-high"), body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn dispatch_trigger_is_admin_only_and_reports_counts() {
    let (store, _, _) = store_with_expiring_cert();
    insert_schedule(&store, schedule("g-7", None, 7, ScheduleChannels::InApp));

    let forbidden = router(&store)
        .oneshot(
            axum::http::Request::post("/api/v1/notifications/dispatch?as_of=2026-04-15")
                .extension(school_admin("lincoln-high"))
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let response = router(&store)
        .oneshot(
            axum::http::Request::post("/api/v1/notifications/dispatch?as_of=2026-04-15")
                .extension(system_admin())
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body is readable");
    let payload: serde_json::Value = serde_json::from_slice(&body).expect("body is json");
    assert_eq!(payload["notifications_sent"], 1);
    assert_eq!(payload["failures"], 0);
}

#[tokio::test]
async fn mark_read_endpoint_maps_ownership_to_not_found() {
    let (store, coach, _) = store_with_expiring_cert();
    insert_schedule(&store, schedule("g-7", None, 7, ScheduleChannels::InApp));
    let (engine, _) = engine(&store);
    engine.run_cycle(reference());
    let notification_id = store.notifications_for(&coach)[0].id.0.clone();

    let wrong_user = router(&store)
        .oneshot(
            axum::http::Request::post(format!(
                "/api/v1/notifications/{notification_id}/read"
            ))
            .extension(school_admin("lincoln-high"))
            .body(axum::body::Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(wrong_user.status(), StatusCode::NOT_FOUND);

    let recipient = Actor {
        user: crate::actor::UserId(coach.0.clone()),
        role: crate::actor::Role::Coach,
        tenant: Some(tenant()),
    };
    let response = router(&store)
        .oneshot(
            axum::http::Request::post(format!(
                "/api/v1/notifications/{notification_id}/read"
            ))
            .extension(recipient)
            .body(axum::body::Body::empty())
            .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}
