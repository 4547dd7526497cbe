//! Compliance scoring and achievement engine.
//!
//! Leaf-first: `status` derives lifecycle state from dates, `schedule`
//! tracks bi-weekly timesheet periods, `scoring` aggregates the four
//! weighted signals, `achievements` grants badges idempotently, and
//! `snapshot` rolls everything up per month. `service` is the facade the
//! HTTP router and bulk enrichment drive.

pub mod achievements;
pub mod bulk;
pub mod domain;
pub mod memory;
pub mod repository;
pub mod router;
pub mod schedule;
pub mod scoring;
pub mod service;
pub mod snapshot;
pub mod status;

#[cfg(test)]
mod tests;

pub use achievements::{rating_points, AwardOutcome, AwardRequest, Awarder};
pub use domain::{
    Achievement, BadgeCategory, BadgeType, DocumentKind, DocumentRecord, FeedbackSubmission,
    LearnerId, LearnerProfile, MonthKey, MonthlyComplianceSnapshot, ScheduleId, SubmissionStatus,
    TimesheetPeriod, TimesheetSchedule, TimesheetSubmission,
};
pub use repository::{
    parse_document_rows, ComplianceRepository, Notification, NotificationDispatcher,
    NotificationError, NotificationKind, RawDocumentRow, RepositoryError,
};
pub use router::compliance_router;
pub use schedule::{
    expected_periods, month_complete, DownloadOutcome, ForbiddenReason, PeriodRecord,
};
pub use scoring::{
    EngagementSignal, ScoreBreakdown, ScoreCalculator, ScoreContext, ScoreInputs, ScoringConfig,
};
pub use service::{AcknowledgeOutcome, ComplianceEngine, EngineError};
pub use snapshot::{lifetime_points, snapshot, trend, Trend};
pub use status::status_of;
