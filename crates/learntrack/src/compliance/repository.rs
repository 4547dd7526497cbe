use serde::{Deserialize, Serialize};

use super::domain::{
    Achievement, BadgeType, DocumentRecord, FeedbackSubmission, LearnerId, LearnerProfile,
    MonthKey, ScheduleId,
};
use super::schedule::PeriodRecord;

/// Storage abstraction over the hosted relational store.
///
/// Injected explicitly into every engine entry point; there is no ambient
/// connection singleton. The store must enforce the milestone uniqueness
/// constraint and provide the atomic increment and compare-and-swap
/// operations itself — the trait methods only expose them.
pub trait ComplianceRepository: Send + Sync {
    fn learner(&self, id: &LearnerId) -> Result<Option<LearnerProfile>, RepositoryError>;
    fn roster(&self) -> Result<Vec<LearnerId>, RepositoryError>;

    fn feedback_history(&self, id: &LearnerId) -> Result<Vec<FeedbackSubmission>, RepositoryError>;
    fn timesheet_history(&self, id: &LearnerId) -> Result<Vec<PeriodRecord>, RepositoryError>;
    fn period_record(&self, schedule: &ScheduleId) -> Result<Option<PeriodRecord>, RepositoryError>;

    /// Raw document payloads; decoding happens in [`parse_document_rows`]
    /// so malformed rows can be skipped instead of failing the fetch.
    fn document_rows(&self, id: &LearnerId) -> Result<Vec<RawDocumentRow>, RepositoryError>;

    fn achievements(&self, id: &LearnerId) -> Result<Vec<Achievement>, RepositoryError>;
    fn achievement_exists(
        &self,
        id: &LearnerId,
        badge_type: BadgeType,
        badge_name: &str,
    ) -> Result<bool, RepositoryError>;
    /// Insert an achievement row. For milestone badge types the store's
    /// uniqueness constraint on (learner, badge_type, badge_name) is the
    /// authoritative guard; a duplicate insert fails with
    /// [`RepositoryError::Conflict`].
    fn insert_achievement(&self, achievement: Achievement) -> Result<(), RepositoryError>;

    /// Atomic increment of a timesheet submission's download counter.
    /// Returns the new count. Never implemented as read-then-write.
    fn increment_download(&self, schedule: &ScheduleId) -> Result<u64, RepositoryError>;

    /// Compare-and-swap on the feedback acknowledgement flag, keyed on
    /// the expected prior state. Returns `false` (and writes nothing)
    /// when the stored flag no longer matches `expected`.
    fn set_feedback_acknowledged(
        &self,
        id: &LearnerId,
        month: MonthKey,
        expected: bool,
        value: bool,
    ) -> Result<bool, RepositoryError>;

    fn update_compliance_score(&self, id: &LearnerId, score: f64) -> Result<(), RepositoryError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Undecoded document row as fetched from the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDocumentRow {
    pub row_id: String,
    pub payload: String,
}

/// Decode stored document payloads, skipping rows that fail to parse.
///
/// A malformed payload is a data problem in one row, not a reason to
/// abort the enclosing aggregation.
pub fn parse_document_rows(rows: Vec<RawDocumentRow>) -> Vec<DocumentRecord> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_str(&row.payload) {
            Ok(record) => Some(record),
            Err(error) => {
                tracing::warn!(row_id = %row.row_id, %error, "skipping malformed document row");
                None
            }
        })
        .collect()
}

/// Trait describing the outbound notification hook.
pub trait NotificationDispatcher: Send + Sync {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// User-facing message persisted/delivered by the collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub user_id: LearnerId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Achievement,
    Acknowledgement,
}

/// Notification dispatch error.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
