use super::common::*;
use crate::compliance::domain::DocumentKind;
use crate::compliance::repository::parse_document_rows;
use crate::compliance::scoring::{
    EngagementSignal, ScoreCalculator, ScoreContext, ScoreInputs, DOCUMENT_WEIGHT,
    ENGAGEMENT_WEIGHT, FEEDBACK_WEIGHT, TIMESHEET_WEIGHT,
};
use crate::compliance::ComplianceRepository;

/// Three elapsed months (Jan-Mar 2024): on-time January feedback, Feb
/// inside the grace window, March missing; February period 2 never
/// uploaded and March period 1 expired; two checklist documents missing.
fn seeded_context() -> (
    crate::compliance::service::ComplianceEngine<
        crate::compliance::memory::MemoryStore,
        crate::compliance::memory::MemoryNotifier,
    >,
    std::sync::Arc<crate::compliance::memory::MemoryStore>,
) {
    let (engine, store, _) = build_engine();
    let id = learner();

    store.put_feedback(feedback_row(
        &id,
        month(2024, 1),
        Some(date(2024, 1, 30)),
        Some(3),
    ));
    store.put_feedback(feedback_row(
        &id,
        month(2024, 2),
        Some(date(2024, 3, 3)),
        Some(2),
    ));

    seed_timesheets(&store, &id, month(2024, 1), &[(0, false), (1, false)]);
    seed_timesheets(&store, &id, month(2024, 2), &[(0, false)]);
    seed_timesheets(&store, &id, month(2024, 3), &[(0, true), (1, false)]);

    seed_document(&store, &id, DocumentKind::IdDocument, date(2024, 1, 12));
    seed_document(
        &store,
        &id,
        DocumentKind::LearnershipAgreement,
        date(2024, 1, 12),
    );
    seed_document(&store, &id, DocumentKind::BankConfirmation, date(2024, 1, 20));

    (engine, store)
}

fn breakdown_for(
    store: &crate::compliance::memory::MemoryStore,
    engagement: EngagementSignal,
) -> crate::compliance::scoring::ScoreBreakdown {
    let id = learner();
    let calculator = ScoreCalculator::default();
    let profile = store.learner(&id).expect("fetch").expect("seeded");
    let feedback = store.feedback_history(&id).expect("feedback");
    let timesheets = store.timesheet_history(&id).expect("timesheets");
    let documents = parse_document_rows(store.document_rows(&id).expect("documents"));
    let context = ScoreContext::for_learner(&profile, date(2024, 4, 10));
    let inputs = ScoreInputs {
        feedback: &feedback,
        timesheets: &timesheets,
        documents: &documents,
        engagement,
    };
    calculator.compute(&context, &inputs)
}

#[test]
fn subscores_follow_partial_credit_and_checklists() {
    let (_, store) = seeded_context();
    let breakdown = breakdown_for(&store, EngagementSignal { delivered: 10, read: 9 });

    // (1.0 on-time + 0.75 grace + 0 missing) / 3 months.
    assert!((breakdown.feedback - 175.0 / 3.0).abs() < 1e-9);
    // 4 of 6 required periods uploaded and unexpired.
    assert!((breakdown.timesheet - 400.0 / 6.0).abs() < 1e-9);
    // 3 of 5 applicable documents present.
    assert!((breakdown.document - 60.0).abs() < 1e-9);
    assert!((breakdown.engagement - 90.0).abs() < 1e-9);
}

#[test]
fn overall_is_the_fixed_weighted_sum_clamped() {
    let (_, store) = seeded_context();
    let breakdown = breakdown_for(&store, EngagementSignal { delivered: 10, read: 9 });

    let expected = FEEDBACK_WEIGHT * breakdown.feedback
        + TIMESHEET_WEIGHT * breakdown.timesheet
        + DOCUMENT_WEIGHT * breakdown.document
        + ENGAGEMENT_WEIGHT * breakdown.engagement;
    assert!((breakdown.overall - expected).abs() < 1e-9);
    assert!((0.0..=100.0).contains(&breakdown.overall));
}

#[test]
fn next_actions_are_ordered_and_deterministic() {
    let (_, store) = seeded_context();
    let signal = EngagementSignal { delivered: 10, read: 2 };
    let first = breakdown_for(&store, signal);
    let second = breakdown_for(&store, signal);

    assert_eq!(first, second);
    assert_eq!(
        first.next_actions,
        vec![
            "Submit March 2024 feedback".to_string(),
            "Upload Period 2 timesheet for February 2024".to_string(),
            "Replace expired Period 1 timesheet for March 2024".to_string(),
            "Upload your proof of address".to_string(),
            "Upload your medical certificate".to_string(),
            "Catch up on unread portal notifications".to_string(),
        ]
    );
}

#[test]
fn fresh_learner_scores_clean() {
    let (_, store, _) = build_engine();
    // No month has fully elapsed ten days into the programme.
    let id = learner();
    let calculator = ScoreCalculator::default();
    let profile = store.learner(&id).expect("fetch").expect("seeded");
    let context = ScoreContext::for_learner(&profile, date(2024, 1, 20));
    let inputs = ScoreInputs {
        feedback: &[],
        timesheets: &[],
        documents: &[],
        engagement: EngagementSignal::default(),
    };
    let breakdown = calculator.compute(&context, &inputs);

    assert!((breakdown.feedback - 100.0).abs() < 1e-9);
    assert!((breakdown.timesheet - 100.0).abs() < 1e-9);
    // Documents are still owed from day one.
    assert!(breakdown.document < 100.0);
    assert!(breakdown
        .next_actions
        .iter()
        .all(|action| action.starts_with("Upload your")));
}

#[test]
fn empty_notification_window_is_not_a_deficiency() {
    assert!((EngagementSignal::default().score() - 100.0).abs() < 1e-9);
    let partial = EngagementSignal { delivered: 4, read: 1 };
    assert!((partial.score() - 25.0).abs() < 1e-9);
}
