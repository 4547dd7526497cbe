use chrono::Duration;

use super::super::domain::{DocumentKind, MonthKey, SubmissionStatus, TimesheetPeriod};
use super::super::status::status_of;
use super::{ScoreContext, ScoreInputs, ScoringConfig};

/// Checklist order. Fixed so document shares and remediation ordering
/// are stable across callers.
pub(crate) const DOCUMENT_CHECKLIST: [DocumentKind; 6] = [
    DocumentKind::IdDocument,
    DocumentKind::LearnershipAgreement,
    DocumentKind::ProofOfAddress,
    DocumentKind::BankConfirmation,
    DocumentKind::MedicalCertificate,
    DocumentKind::DisabilityEvidence,
];

pub(crate) struct Subscores {
    pub feedback: f64,
    pub timesheet: f64,
    pub document: f64,
    pub engagement: f64,
}

/// A missing or expired timesheet period slot.
pub(crate) struct TimesheetGap {
    pub month: MonthKey,
    pub period: TimesheetPeriod,
    pub expired: bool,
}

/// Every deficiency found while scoring, in the order remediation
/// strings are emitted.
pub(crate) struct ComplianceGaps {
    pub missing_feedback: Vec<MonthKey>,
    pub timesheet_gaps: Vec<TimesheetGap>,
    pub missing_documents: Vec<DocumentKind>,
    pub low_engagement: bool,
}

pub(crate) fn collect(
    context: &ScoreContext,
    inputs: &ScoreInputs<'_>,
    config: &ScoringConfig,
) -> (Subscores, ComplianceGaps) {
    let elapsed = elapsed_months(context);

    let mut missing_feedback = Vec::new();
    let feedback = feedback_score(context, inputs, config, &elapsed, &mut missing_feedback);

    let mut timesheet_gaps = Vec::new();
    let timesheet = timesheet_score(context, inputs, &elapsed, &mut timesheet_gaps);

    let mut missing_documents = Vec::new();
    let document = document_score(context, inputs, &mut missing_documents);

    let engagement = inputs.engagement.score();
    let low_engagement = engagement < config.low_engagement_threshold;

    (
        Subscores {
            feedback,
            timesheet,
            document,
            engagement,
        },
        ComplianceGaps {
            missing_feedback,
            timesheet_gaps,
            missing_documents,
            low_engagement,
        },
    )
}

/// Months of the programme whose feedback due date (last day of month)
/// has passed. Months still inside their window stay pending and do not
/// count against the learner.
fn elapsed_months(context: &ScoreContext) -> Vec<MonthKey> {
    let start = MonthKey::from_date(context.program_start);
    let current = MonthKey::from_date(context.today);
    start
        .months_through(current)
        .into_iter()
        .filter(|month| month.last_day() <= context.today)
        .collect()
}

fn feedback_score(
    context: &ScoreContext,
    inputs: &ScoreInputs<'_>,
    config: &ScoringConfig,
    elapsed: &[MonthKey],
    missing: &mut Vec<MonthKey>,
) -> f64 {
    if elapsed.is_empty() {
        return 100.0;
    }

    let mut credit = 0.0;
    for month in elapsed {
        let row = inputs.feedback.iter().find(|row| row.month == *month);
        match row {
            Some(row) => {
                let status = status_of(row.due_date, row.submitted_at, None, false, context.today);
                match (status, row.submitted_at) {
                    (SubmissionStatus::Submitted, Some(submitted)) => {
                        credit += month_credit(submitted, row.due_date, config);
                    }
                    _ => missing.push(*month),
                }
            }
            None => missing.push(*month),
        }
    }

    credit / elapsed.len() as f64 * 100.0
}

/// Partial-credit curve: full credit on time, reduced inside the grace
/// window, reduced further after it. Monotonic in lateness by
/// construction (late_credit <= grace_credit <= 1.0).
fn month_credit(
    submitted: chrono::NaiveDate,
    due: chrono::NaiveDate,
    config: &ScoringConfig,
) -> f64 {
    if submitted <= due {
        1.0
    } else if submitted <= due + Duration::days(config.late_grace_days) {
        config.grace_credit
    } else {
        config.late_credit
    }
}

fn timesheet_score(
    context: &ScoreContext,
    inputs: &ScoreInputs<'_>,
    elapsed: &[MonthKey],
    gaps: &mut Vec<TimesheetGap>,
) -> f64 {
    if elapsed.is_empty() {
        return 100.0;
    }

    let required = elapsed.len() * 2;
    let mut satisfied = 0usize;

    for month in elapsed {
        for period in [TimesheetPeriod::First, TimesheetPeriod::Second] {
            let record = inputs.timesheets.iter().find(|record| {
                record.schedule.month == *month && record.schedule.period == period
            });
            match record {
                Some(record) if record.submission.is_some() => {
                    match record.status(context.today) {
                        SubmissionStatus::Expired => gaps.push(TimesheetGap {
                            month: *month,
                            period,
                            expired: true,
                        }),
                        _ => satisfied += 1,
                    }
                }
                _ => gaps.push(TimesheetGap {
                    month: *month,
                    period,
                    expired: false,
                }),
            }
        }
    }

    satisfied as f64 / required as f64 * 100.0
}

fn document_score(
    context: &ScoreContext,
    inputs: &ScoreInputs<'_>,
    missing: &mut Vec<DocumentKind>,
) -> f64 {
    let applicable: Vec<DocumentKind> = DOCUMENT_CHECKLIST
        .into_iter()
        .filter(|kind| kind.always_required() || context.applicable_documents.contains(kind))
        .collect();

    if applicable.is_empty() {
        return 100.0;
    }

    let mut satisfied = 0usize;
    for kind in &applicable {
        if inputs.documents.iter().any(|record| record.kind == *kind) {
            satisfied += 1;
        } else {
            missing.push(*kind);
        }
    }

    satisfied as f64 / applicable.len() as f64 * 100.0
}
