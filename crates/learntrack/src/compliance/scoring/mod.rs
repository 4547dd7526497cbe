mod actions;
mod subscores;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{DocumentKind, DocumentRecord, FeedbackSubmission, LearnerProfile};
use super::schedule::PeriodRecord;

/// Fixed weights for the four sub-scores. They sum to 1.0 and are part
/// of the engine's published contract.
pub const FEEDBACK_WEIGHT: f64 = 0.40;
pub const TIMESHEET_WEIGHT: f64 = 0.35;
pub const DOCUMENT_WEIGHT: f64 = 0.15;
pub const ENGAGEMENT_WEIGHT: f64 = 0.10;

/// Tuning knobs for the calculator. The weights themselves are fixed;
/// only the partial-credit curve and the nudge threshold are adjustable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Days after the due date during which a late submission still earns
    /// the grace credit.
    pub late_grace_days: i64,
    /// Credit for a submission inside the grace window.
    pub grace_credit: f64,
    /// Credit for a submission after the grace window. Must not exceed
    /// `grace_credit` so the curve stays monotonic.
    pub late_credit: f64,
    /// Engagement score below which a remediation nudge is generated.
    pub low_engagement_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            late_grace_days: 7,
            grace_credit: 0.75,
            late_credit: 0.5,
            low_engagement_threshold: 60.0,
        }
    }
}

/// Externally collected engagement signal for the scoring window.
///
/// Defined as the notification-read ratio: the engine does not collect
/// it, callers inject the counts. An empty window scores 100 — nothing
/// delivered is not a deficiency.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementSignal {
    pub delivered: u32,
    pub read: u32,
}

impl EngagementSignal {
    pub fn score(self) -> f64 {
        if self.delivered == 0 {
            return 100.0;
        }
        let ratio = f64::from(self.read.min(self.delivered)) / f64::from(self.delivered);
        ratio * 100.0
    }
}

/// Window and learner facts the calculator needs beyond the histories.
#[derive(Debug, Clone)]
pub struct ScoreContext {
    pub program_start: NaiveDate,
    pub today: NaiveDate,
    pub applicable_documents: Vec<DocumentKind>,
}

impl ScoreContext {
    pub fn for_learner(profile: &LearnerProfile, today: NaiveDate) -> Self {
        Self {
            program_start: profile.program_start,
            today,
            applicable_documents: profile.applicable_documents.clone(),
        }
    }
}

/// Histories the calculator aggregates over.
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    pub feedback: &'a [FeedbackSubmission],
    pub timesheets: &'a [PeriodRecord],
    pub documents: &'a [DocumentRecord],
    pub engagement: EngagementSignal,
}

/// Weighted composite plus the remediation list consumed by dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub overall: f64,
    pub feedback: f64,
    pub timesheet: f64,
    pub document: f64,
    pub engagement: f64,
    pub next_actions: Vec<String>,
}

/// Stateless calculator applying the fixed weights to the four signals.
#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Aggregate the histories into one weighted score and an ordered,
    /// deterministic remediation list. Identical inputs yield identical
    /// output; nothing here consults the wall clock.
    pub fn compute(&self, context: &ScoreContext, inputs: &ScoreInputs<'_>) -> ScoreBreakdown {
        let (scores, gaps) = subscores::collect(context, inputs, &self.config);

        let overall = (FEEDBACK_WEIGHT * scores.feedback
            + TIMESHEET_WEIGHT * scores.timesheet
            + DOCUMENT_WEIGHT * scores.document
            + ENGAGEMENT_WEIGHT * scores.engagement)
            .clamp(0.0, 100.0);

        ScoreBreakdown {
            overall,
            feedback: scores.feedback,
            timesheet: scores.timesheet,
            document: scores.document,
            engagement: scores.engagement,
            next_actions: actions::remediation(&gaps),
        }
    }
}
