use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::common::*;
use crate::compliance::bulk::score_roster;
use crate::compliance::domain::{DocumentKind, LearnerId};
use crate::compliance::memory::{MemoryNotifier, MemoryStore};
use crate::compliance::scoring::ScoreCalculator;
use crate::compliance::service::ComplianceEngine;
use crate::compliance::ComplianceRepository;

fn roster_engine(count: usize) -> (Arc<ComplianceEngine<MemoryStore, MemoryNotifier>>, Vec<LearnerId>) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let mut roster = Vec::with_capacity(count);
    for index in 0..count {
        let id = LearnerId(format!("lrn-{index:03}"));
        store.upsert_learner(profile(&id));
        seed_document(&store, &id, DocumentKind::IdDocument, date(2024, 1, 12));
        roster.push(id);
    }
    let engine = Arc::new(ComplianceEngine::new(
        store,
        notifier,
        ScoreCalculator::default(),
    ));
    (engine, roster)
}

#[tokio::test]
async fn bounded_fanout_scores_the_whole_roster() {
    let (engine, roster) = roster_engine(12);

    let scores = score_roster(
        engine.clone(),
        roster.clone(),
        3,
        Arc::new(AtomicBool::new(false)),
        date(2024, 4, 10),
    )
    .await;

    assert_eq!(scores.len(), roster.len());
    assert!(scores.iter().all(|row| row.breakdown.is_some()));
    // Every cached score matches the row the batch produced.
    for row in &scores {
        let cached = engine
            .repository()
            .learner(&row.learner_id)
            .expect("fetch")
            .expect("profile")
            .compliance_score;
        let overall = row.breakdown.as_ref().expect("breakdown").overall;
        assert!((cached - overall).abs() < 1e-9);
    }
}

#[tokio::test]
async fn cancel_flag_stops_the_batch_before_any_work() {
    let (engine, roster) = roster_engine(8);
    let cancel = Arc::new(AtomicBool::new(false));
    cancel.store(true, Ordering::Release);

    let scores = score_roster(engine, roster, 2, cancel, date(2024, 4, 10)).await;
    assert!(scores.is_empty());
}

#[tokio::test]
async fn one_failing_learner_never_fails_the_batch() {
    let (engine, mut roster) = roster_engine(3);
    roster.push(LearnerId("lrn-missing".to_string()));

    let scores = score_roster(
        engine,
        roster,
        4,
        Arc::new(AtomicBool::new(false)),
        date(2024, 4, 10),
    )
    .await;

    assert_eq!(scores.len(), 4);
    let failed: Vec<_> = scores.iter().filter(|row| row.error.is_some()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].learner_id.0, "lrn-missing");
    assert!(failed[0].breakdown.is_none());
}

#[tokio::test]
async fn zero_limit_is_clamped_rather_than_deadlocked() {
    let (engine, roster) = roster_engine(2);
    let scores = score_roster(
        engine,
        roster,
        0,
        Arc::new(AtomicBool::new(false)),
        date(2024, 4, 10),
    )
    .await;
    assert_eq!(scores.len(), 2);
}
