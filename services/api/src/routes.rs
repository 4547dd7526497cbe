use crate::infra::{deserialize_optional_date, AppState, BulkSettings};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use learntrack::compliance::bulk::{score_roster, RosterScore};
use learntrack::compliance::{
    compliance_router, ComplianceEngine, ComplianceRepository, EngineError, LearnerId,
    NotificationDispatcher,
};
use learntrack::error::AppError;

pub(crate) fn with_compliance_routes<R, N>(
    engine: Arc<ComplianceEngine<R, N>>,
) -> axum::Router
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    compliance_router(engine)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/roster/scores",
            axum::routing::post(roster_scores_endpoint::<R, N>),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RosterScoresRequest {
    /// Learners to score; defaults to the full roster when omitted.
    #[serde(default)]
    pub(crate) learner_ids: Option<Vec<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_date")]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn roster_scores_endpoint<R, N>(
    Extension(engine): Extension<Arc<ComplianceEngine<R, N>>>,
    Extension(bulk): Extension<BulkSettings>,
    Json(request): Json<RosterScoresRequest>,
) -> Result<Json<Vec<RosterScore>>, AppError>
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let learners = match request.learner_ids {
        Some(ids) => ids.into_iter().map(LearnerId).collect(),
        None => engine.repository().roster().map_err(EngineError::from)?,
    };
    let today = request.today.unwrap_or_else(|| Local::now().date_naive());

    tracing::info!(batch = learners.len(), concurrency = bulk.concurrency, "roster scoring batch");
    let scores = score_roster(
        engine,
        learners,
        bulk.concurrency,
        bulk.cancel.clone(),
        today,
    )
    .await;

    Ok(Json(scores))
}
