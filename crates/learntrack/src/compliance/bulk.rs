use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::Semaphore;

use super::domain::LearnerId;
use super::repository::{ComplianceRepository, NotificationDispatcher};
use super::scoring::{EngagementSignal, ScoreBreakdown};
use super::service::ComplianceEngine;

/// One roster row from a bulk enrichment pass. A store failure for one
/// learner lands here instead of failing the batch.
#[derive(Debug, Clone, Serialize)]
pub struct RosterScore {
    pub learner_id: LearnerId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<ScoreBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compute breakdowns for a roster with bounded concurrency.
///
/// At most `limit` learners are in flight at once, so a large roster
/// cannot overwhelm the backing store. The cancel flag is checked before
/// each learner's fetches begin; once set, no further work is issued and
/// already-started learners finish without mutating anything beyond
/// their own cached score. Cancelled learners are simply omitted.
pub async fn score_roster<R, N>(
    engine: Arc<ComplianceEngine<R, N>>,
    learners: Vec<LearnerId>,
    limit: usize,
    cancel: Arc<AtomicBool>,
    today: NaiveDate,
) -> Vec<RosterScore>
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut handles = Vec::with_capacity(learners.len());

    for learner in learners {
        let engine = engine.clone();
        let semaphore = semaphore.clone();
        let cancel = cancel.clone();

        handles.push(tokio::spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok()?;
            if cancel.load(Ordering::Acquire) {
                return None;
            }

            tokio::task::spawn_blocking(move || {
                match engine.score_for(&learner, today, EngagementSignal::default()) {
                    Ok(breakdown) => RosterScore {
                        learner_id: learner,
                        breakdown: Some(breakdown),
                        error: None,
                    },
                    Err(error) => RosterScore {
                        learner_id: learner,
                        breakdown: None,
                        error: Some(error.to_string()),
                    },
                }
            })
            .await
            .ok()
        }));
    }

    let mut scores = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(Some(score)) = handle.await {
            scores.push(score);
        }
    }
    scores
}
