use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Extension, Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use crate::actor::Actor;

use super::domain::{CoachId, ProgramId};
use super::evaluator::{ComplianceEvaluator, EvaluationError, RequirementDraft};
use super::repository::ComplianceStore;

#[derive(Debug, Deserialize)]
pub(crate) struct ComplianceQuery {
    /// Reference date for classification; defaults to today.
    #[serde(default)]
    as_of: Option<NaiveDate>,
}

/// Router builder exposing the compliance read and requirement-edit endpoints.
/// The identity layer is expected to install an [`Actor`] extension upstream.
pub fn compliance_router<S>(evaluator: Arc<ComplianceEvaluator<S>>) -> Router
where
    S: ComplianceStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/coaches/:coach_id/compliance",
            get(compliance_handler::<S>),
        )
        .route(
            "/api/v1/programs/:program_id/requirements",
            put(requirements_handler::<S>),
        )
        .with_state(evaluator)
}

pub(crate) async fn compliance_handler<S>(
    State(evaluator): State<Arc<ComplianceEvaluator<S>>>,
    Extension(actor): Extension<Actor>,
    Path(coach_id): Path<String>,
    Query(query): Query<ComplianceQuery>,
) -> Response
where
    S: ComplianceStore + 'static,
{
    let reference = query.as_of.unwrap_or_else(|| Local::now().date_naive());
    match evaluator.evaluate(&actor, &CoachId(coach_id), reference) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

pub(crate) async fn requirements_handler<S>(
    State(evaluator): State<Arc<ComplianceEvaluator<S>>>,
    Extension(actor): Extension<Actor>,
    Path(program_id): Path<String>,
    axum::Json(drafts): axum::Json<Vec<RequirementDraft>>,
) -> Response
where
    S: ComplianceStore + 'static,
{
    match evaluator.sync_requirements(&actor, &ProgramId(program_id), drafts) {
        Ok(requirements) => (StatusCode::OK, axum::Json(requirements)).into_response(),
        Err(err) => evaluation_error_response(err),
    }
}

fn evaluation_error_response(err: EvaluationError) -> Response {
    let status = match &err {
        EvaluationError::Forbidden | EvaluationError::LockedRequirement(_) => {
            StatusCode::FORBIDDEN
        }
        EvaluationError::UnknownCoach | EvaluationError::UnknownProgram => StatusCode::NOT_FOUND,
        EvaluationError::TenantMismatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EvaluationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
