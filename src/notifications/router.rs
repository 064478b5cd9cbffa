use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use crate::actor::Actor;

use super::dispatch::{DispatchEngine, MarkReadError};
use super::domain::NotificationId;
use super::repository::{EmailTransport, NotificationStore, ScheduleStore};
use super::schedules::{ScheduleDraft, ScheduleError, ScheduleService};

/// Shared state for the notification routes. Hand-rolled `Clone` because the
/// derive would demand `Clone` of the store types behind the `Arc`s.
pub struct NotificationState<S, N, E> {
    pub schedules: Arc<ScheduleService<S>>,
    pub engine: Arc<DispatchEngine<S, N, E>>,
}

impl<S, N, E> Clone for NotificationState<S, N, E> {
    fn clone(&self) -> Self {
        Self {
            schedules: Arc::clone(&self.schedules),
            engine: Arc::clone(&self.engine),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct DispatchQuery {
    /// Reference date for the cycle; defaults to today.
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

/// Router builder exposing schedule management, the dispatch trigger, and
/// notification read-marking.
pub fn notification_router<S, N, E>(state: NotificationState<S, N, E>) -> Router
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    Router::new()
        .route(
            "/api/v1/notifications/schedules",
            get(list_schedules_handler::<S, N, E>).post(create_schedule_handler::<S, N, E>),
        )
        .route(
            "/api/v1/notifications/dispatch",
            post(dispatch_handler::<S, N, E>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<S, N, E>),
        )
        .with_state(state)
}

pub(crate) async fn list_schedules_handler<S, N, E>(
    State(state): State<NotificationState<S, N, E>>,
    Extension(actor): Extension<Actor>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    match state.schedules.resolve(actor.tenant.as_ref()) {
        Ok(schedules) => (StatusCode::OK, axum::Json(schedules)).into_response(),
        Err(err) => schedule_error_response(err),
    }
}

pub(crate) async fn create_schedule_handler<S, N, E>(
    State(state): State<NotificationState<S, N, E>>,
    Extension(actor): Extension<Actor>,
    axum::Json(draft): axum::Json<ScheduleDraft>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    match state.schedules.create(&actor, draft) {
        Ok(schedule) => (StatusCode::CREATED, axum::Json(schedule)).into_response(),
        Err(err) => schedule_error_response(err),
    }
}

pub(crate) async fn dispatch_handler<S, N, E>(
    State(state): State<NotificationState<S, N, E>>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<DispatchQuery>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    if !actor.can_run_dispatch() {
        let payload = json!({ "error": "dispatch is restricted to system administrators" });
        return (StatusCode::FORBIDDEN, axum::Json(payload)).into_response();
    }

    let reference = query.as_of.unwrap_or_else(|| Local::now().date_naive());
    let outcome = state.engine.run_cycle(reference);
    (StatusCode::OK, axum::Json(outcome)).into_response()
}

pub(crate) async fn mark_read_handler<S, N, E>(
    State(state): State<NotificationState<S, N, E>>,
    Extension(actor): Extension<Actor>,
    Path(notification_id): Path<String>,
) -> Response
where
    S: ScheduleStore + 'static,
    N: NotificationStore + 'static,
    E: EmailTransport + 'static,
{
    match state
        .engine
        .mark_read(&actor, &NotificationId(notification_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(MarkReadError::NotFound) => {
            let payload = json!({ "error": "notification not found" });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn schedule_error_response(err: ScheduleError) -> Response {
    let status = match &err {
        ScheduleError::Forbidden => StatusCode::FORBIDDEN,
        ScheduleError::Duplicate => StatusCode::CONFLICT,
        ScheduleError::InvalidOffset => StatusCode::UNPROCESSABLE_ENTITY,
        ScheduleError::NotFound => StatusCode::NOT_FOUND,
        ScheduleError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
