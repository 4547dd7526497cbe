use chrono::NaiveDate;

use super::domain::SubmissionStatus;

/// Resolve a submission's lifecycle state from its timestamps.
///
/// Precedence is expired > submitted > overdue > pending. The expired arm
/// wins even when `submitted_at` is set: an accepted submission can later
/// expire. Every caller that needs a status (list filters, badges,
/// download gates, counters) goes through this function.
pub fn status_of(
    due_date: NaiveDate,
    submitted_at: Option<NaiveDate>,
    expiration_date: Option<NaiveDate>,
    expired_flag: bool,
    now: NaiveDate,
) -> SubmissionStatus {
    if expired_flag || expiration_date.is_some_and(|expires| now > expires) {
        return SubmissionStatus::Expired;
    }

    if submitted_at.is_some() {
        return SubmissionStatus::Submitted;
    }

    if now > due_date {
        return SubmissionStatus::Overdue;
    }

    SubmissionStatus::Pending
}
