use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{LearnerId, MonthKey, ScheduleId};
use super::repository::{ComplianceRepository, NotificationDispatcher, RepositoryError};
use super::schedule::DownloadOutcome;
use super::scoring::EngagementSignal;
use super::service::{AcknowledgeOutcome, ComplianceEngine, EngineError};

/// Router builder exposing the engine operations over HTTP.
pub fn compliance_router<R, N>(engine: Arc<ComplianceEngine<R, N>>) -> Router
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    Router::new()
        .route("/api/v1/learners/:learner_id/score", get(score_handler::<R, N>))
        .route(
            "/api/v1/learners/:learner_id/points",
            get(points_handler::<R, N>),
        )
        .route(
            "/api/v1/learners/:learner_id/snapshots/:year/:month",
            get(snapshot_handler::<R, N>),
        )
        .route(
            "/api/v1/learners/:learner_id/trend",
            get(trend_handler::<R, N>),
        )
        .route(
            "/api/v1/learners/:learner_id/feedback/:year/:month/rating",
            post(rating_handler::<R, N>),
        )
        .route(
            "/api/v1/learners/:learner_id/feedback/:year/:month/acknowledge",
            post(acknowledge_handler::<R, N>),
        )
        .route(
            "/api/v1/timesheets/:schedule_id/download",
            post(download_handler::<R, N>),
        )
        .with_state(engine)
}

fn error_response(error: EngineError) -> Response {
    let status = match &error {
        EngineError::UnknownLearner => StatusCode::NOT_FOUND,
        EngineError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        EngineError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) async fn score_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let learner = LearnerId(learner_id);
    let today = Local::now().date_naive();
    match engine.score_for(&learner, today, EngagementSignal::default()) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn points_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let learner = LearnerId(learner_id);
    match engine.lifetime_points(&learner) {
        Ok(points) => (
            StatusCode::OK,
            axum::Json(json!({
                "learner_id": learner.0,
                "lifetime_points": points,
            })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn snapshot_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path((learner_id, year, month)): Path<(String, i32, u32)>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let Some(month) = MonthKey::new(year, month) else {
        let payload = json!({ "error": "month must be between 1 and 12" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    let learner = LearnerId(learner_id);
    match engine.snapshot_for(&learner, month, EngagementSignal::default()) {
        Ok(snapshot) => (StatusCode::OK, axum::Json(snapshot)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn trend_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path(learner_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let learner = LearnerId(learner_id);
    let today = Local::now().date_naive();
    match engine.trend_for(&learner, today) {
        Ok(trend) => (StatusCode::OK, axum::Json(json!({ "trend": trend }))).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RatingRequest {
    pub rating: u8,
}

pub(crate) async fn rating_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path((learner_id, year, month)): Path<(String, i32, u32)>,
    axum::Json(request): axum::Json<RatingRequest>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let Some(month) = MonthKey::new(year, month) else {
        let payload = json!({ "error": "month must be between 1 and 12" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };
    if !(1..=3).contains(&request.rating) {
        let payload = json!({ "error": "rating must be between 1 and 3" });
        return (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response();
    }

    let learner = LearnerId(learner_id);
    let today = Local::now().date_naive();
    match engine.apply_mentor_rating(&learner, month, request.rating, today) {
        Ok(outcome) => (StatusCode::OK, axum::Json(json!({ "outcome": outcome }))).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcknowledgeRequest {
    pub expected: bool,
    pub value: bool,
}

pub(crate) async fn acknowledge_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path((learner_id, year, month)): Path<(String, i32, u32)>,
    axum::Json(request): axum::Json<AcknowledgeRequest>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let Some(month) = MonthKey::new(year, month) else {
        let payload = json!({ "error": "month must be between 1 and 12" });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    let learner = LearnerId(learner_id);
    match engine.acknowledge_feedback(&learner, month, request.expected, request.value) {
        Ok(AcknowledgeOutcome::Applied) => {
            (StatusCode::OK, axum::Json(json!({ "outcome": "applied" }))).into_response()
        }
        Ok(AcknowledgeOutcome::StaleToggle) => {
            let payload = json!({ "error": "acknowledgement state changed underneath this toggle" });
            (StatusCode::CONFLICT, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn download_handler<R, N>(
    State(engine): State<Arc<ComplianceEngine<R, N>>>,
    Path(schedule_id): Path<String>,
) -> Response
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let schedule = ScheduleId(schedule_id);
    let today = Local::now().date_naive();
    match engine.record_download(&schedule, today) {
        Ok(DownloadOutcome::Recorded { download_count }) => (
            StatusCode::OK,
            axum::Json(json!({ "download_count": download_count })),
        )
            .into_response(),
        Ok(DownloadOutcome::Forbidden(reason)) => {
            let payload = json!({ "forbidden": reason });
            (StatusCode::FORBIDDEN, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}
