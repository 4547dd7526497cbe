use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Identifier wrapper for learners enrolled in a programme.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LearnerId(pub String);

/// Identifier wrapper for timesheet schedule slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScheduleId(pub String);

/// Calendar month used to key feedback, timesheet, and snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(self) -> NaiveDate {
        self.succ()
            .first_day()
            .pred_opt()
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Inclusive iteration from `self` through `end`, in calendar order.
    pub fn months_through(self, end: MonthKey) -> Vec<MonthKey> {
        let mut months = Vec::new();
        let mut current = self;
        while current <= end {
            months.push(current);
            current = current.succ();
        }
        months
    }
}

/// Profile record cached alongside the learner's identity.
///
/// `points` mirrors the sum of achievement rows and is maintained by the
/// store on insert; the authoritative total is always recomputed from the
/// raw rows (see `snapshot::lifetime_points`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnerProfile {
    pub id: LearnerId,
    pub full_name: String,
    pub email: String,
    pub program_start: NaiveDate,
    pub applicable_documents: Vec<DocumentKind>,
    pub compliance_score: f64,
    pub points: u64,
}

/// Monthly mentor-feedback submission, unique per (learner, month, year).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackSubmission {
    pub learner_id: LearnerId,
    pub month: MonthKey,
    pub due_date: NaiveDate,
    pub submitted_at: Option<NaiveDate>,
    pub mentor_rating: Option<u8>,
    pub mentor_approved_at: Option<NaiveDate>,
    pub acknowledged: bool,
}

/// One of the two required bi-weekly timesheet slots in a month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimesheetPeriod {
    First,
    Second,
}

impl TimesheetPeriod {
    pub const fn number(self) -> u8 {
        match self {
            TimesheetPeriod::First => 1,
            TimesheetPeriod::Second => 2,
        }
    }
}

/// Expected upload slot for a learner's timesheet period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetSchedule {
    pub id: ScheduleId,
    pub learner_id: LearnerId,
    pub month: MonthKey,
    pub period: TimesheetPeriod,
    pub due_date: NaiveDate,
}

/// Uploaded timesheet, one-to-one with a schedule slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimesheetSubmission {
    pub schedule_id: ScheduleId,
    pub uploaded_at: NaiveDate,
    pub absent_days: Option<u32>,
    pub expiration_date: Option<NaiveDate>,
    pub is_expired: bool,
    pub file_path: Option<String>,
    pub download_count: u64,
}

/// Checklist categories for supporting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    IdDocument,
    LearnershipAgreement,
    ProofOfAddress,
    BankConfirmation,
    MedicalCertificate,
    DisabilityEvidence,
}

impl DocumentKind {
    pub const fn label(self) -> &'static str {
        match self {
            DocumentKind::IdDocument => "certified ID copy",
            DocumentKind::LearnershipAgreement => "signed learnership agreement",
            DocumentKind::ProofOfAddress => "proof of address",
            DocumentKind::BankConfirmation => "bank confirmation letter",
            DocumentKind::MedicalCertificate => "medical certificate",
            DocumentKind::DisabilityEvidence => "disability evidence",
        }
    }

    /// Kinds every learner must supply; the remaining kinds apply only
    /// when flagged on the learner profile.
    pub const fn always_required(self) -> bool {
        matches!(
            self,
            DocumentKind::IdDocument
                | DocumentKind::LearnershipAgreement
                | DocumentKind::ProofOfAddress
                | DocumentKind::BankConfirmation
        )
    }
}

/// Typed, schema-versioned document record.
///
/// The hosted store persists these as a serialized payload in their own
/// table; `repository::parse_document_rows` is the one place the payload
/// is decoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub schema_version: u32,
    pub learner_id: LearnerId,
    pub kind: DocumentKind,
    pub uploaded_at: NaiveDate,
    pub file_path: String,
}

/// Badge taxonomy. Milestone badges are at-most-once per
/// (learner, badge_type, badge_name); repeatable badges insert freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeType {
    FirstFeedback,
    PerfectMonth,
    ThreeStarExcellence,
    MentorRating,
    TimesheetUpload,
    DocumentUpload,
}

/// Category used to bucket achievement points into the four snapshot
/// totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BadgeCategory {
    Feedback,
    Timesheet,
    Document,
    Engagement,
}

impl BadgeType {
    pub const fn is_milestone(self) -> bool {
        matches!(
            self,
            BadgeType::FirstFeedback | BadgeType::PerfectMonth | BadgeType::ThreeStarExcellence
        )
    }

    pub const fn category(self) -> BadgeCategory {
        match self {
            BadgeType::FirstFeedback | BadgeType::MentorRating => BadgeCategory::Feedback,
            BadgeType::PerfectMonth | BadgeType::TimesheetUpload => BadgeCategory::Timesheet,
            BadgeType::DocumentUpload => BadgeCategory::Document,
            BadgeType::ThreeStarExcellence => BadgeCategory::Engagement,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            BadgeType::FirstFeedback => "first_feedback",
            BadgeType::PerfectMonth => "perfect_month",
            BadgeType::ThreeStarExcellence => "three_star_excellence",
            BadgeType::MentorRating => "mentor_rating",
            BadgeType::TimesheetUpload => "timesheet_upload",
            BadgeType::DocumentUpload => "document_upload",
        }
    }
}

/// Point-bearing award record. Created once, never mutated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub learner_id: LearnerId,
    pub badge_type: BadgeType,
    pub badge_name: String,
    pub description: String,
    pub points_awarded: u64,
    pub color: String,
    pub icon: String,
    pub earned_at: NaiveDate,
}

/// Per-month rollup of scores and points; recomputed on demand and
/// always reproducible from the underlying rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyComplianceSnapshot {
    pub learner_id: LearnerId,
    pub month: MonthKey,
    pub feedback_score: f64,
    pub timesheet_score: f64,
    pub document_score: f64,
    pub engagement_score: f64,
    pub overall_compliance_percent: f64,
    pub feedback_points: u64,
    pub timesheet_points: u64,
    pub document_points: u64,
    pub engagement_points: u64,
    pub total_monthly_points: u64,
}

/// Lifecycle state derived from timestamps, never stored as ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Submitted,
    Overdue,
    Expired,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Submitted => "submitted",
            SubmissionStatus::Overdue => "overdue",
            SubmissionStatus::Expired => "expired",
        }
    }
}
