use std::sync::Arc;

use chrono::NaiveDate;

use crate::compliance::domain::{
    DocumentKind, DocumentRecord, FeedbackSubmission, LearnerId, LearnerProfile, MonthKey,
    TimesheetSubmission,
};
use crate::compliance::memory::{MemoryNotifier, MemoryStore};
use crate::compliance::repository::{
    Notification, NotificationDispatcher, NotificationError, RawDocumentRow,
};
use crate::compliance::schedule::expected_periods;
use crate::compliance::scoring::ScoreCalculator;
use crate::compliance::service::ComplianceEngine;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn month(year: i32, month: u32) -> MonthKey {
    MonthKey::new(year, month).expect("valid month")
}

pub(super) fn learner() -> LearnerId {
    LearnerId("lrn-001".to_string())
}

pub(super) fn profile(id: &LearnerId) -> LearnerProfile {
    LearnerProfile {
        id: id.clone(),
        full_name: "Thandi Mokoena".to_string(),
        email: "thandi@example.com".to_string(),
        program_start: date(2024, 1, 10),
        applicable_documents: vec![DocumentKind::MedicalCertificate],
        compliance_score: 0.0,
        points: 0,
    }
}

pub(super) fn build_engine() -> (
    ComplianceEngine<MemoryStore, MemoryNotifier>,
    Arc<MemoryStore>,
    Arc<MemoryNotifier>,
) {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    store.upsert_learner(profile(&learner()));
    let engine = ComplianceEngine::new(store.clone(), notifier.clone(), ScoreCalculator::default());
    (engine, store, notifier)
}

pub(super) fn feedback_row(
    id: &LearnerId,
    key: MonthKey,
    submitted_at: Option<NaiveDate>,
    mentor_rating: Option<u8>,
) -> FeedbackSubmission {
    FeedbackSubmission {
        learner_id: id.clone(),
        month: key,
        due_date: key.last_day(),
        submitted_at,
        mentor_rating,
        mentor_approved_at: None,
        acknowledged: false,
    }
}

/// Seed a month's two schedule slots, uploading the periods listed in
/// `uploads` as (period index, expired) pairs.
pub(super) fn seed_timesheets(store: &MemoryStore, id: &LearnerId, key: MonthKey, uploads: &[(usize, bool)]) {
    let periods = expected_periods(id, key);
    for (index, schedule) in periods.iter().enumerate() {
        store.put_schedule(schedule.clone());
        if let Some((_, expired)) = uploads.iter().find(|(uploaded, _)| *uploaded == index) {
            store.put_submission(TimesheetSubmission {
                schedule_id: schedule.id.clone(),
                uploaded_at: schedule.due_date,
                absent_days: None,
                expiration_date: None,
                is_expired: *expired,
                file_path: Some(format!("timesheets/{}.pdf", schedule.id.0)),
                download_count: 0,
            });
        }
    }
}

pub(super) fn seed_document(store: &MemoryStore, id: &LearnerId, kind: DocumentKind, day: NaiveDate) {
    let record = DocumentRecord {
        schema_version: 1,
        learner_id: id.clone(),
        kind,
        uploaded_at: day,
        file_path: format!("documents/{}/{:?}.pdf", id.0, kind),
    };
    store.put_document_row(
        id,
        RawDocumentRow {
            row_id: format!("doc-{:?}", kind),
            payload: serde_json::to_string(&record).expect("serialize document"),
        },
    );
}

/// Notifier whose transport always fails, for fire-and-forget checks.
#[derive(Default, Clone)]
pub(super) struct FailingNotifier;

impl NotificationDispatcher for FailingNotifier {
    fn dispatch(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Transport("smtp offline".to_string()))
    }
}
