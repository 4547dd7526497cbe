use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{
    LearnerId, MonthKey, ScheduleId, SubmissionStatus, TimesheetPeriod, TimesheetSchedule,
    TimesheetSubmission,
};
use super::status::status_of;

/// A schedule slot joined with its submission, if one exists.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRecord {
    pub schedule: TimesheetSchedule,
    pub submission: Option<TimesheetSubmission>,
}

impl PeriodRecord {
    /// Current lifecycle state of this period, via the shared resolver.
    pub fn status(&self, now: NaiveDate) -> SubmissionStatus {
        match &self.submission {
            Some(submission) => status_of(
                self.schedule.due_date,
                Some(submission.uploaded_at),
                submission.expiration_date,
                submission.is_expired,
                now,
            ),
            None => status_of(self.schedule.due_date, None, None, false, now),
        }
    }
}

/// The two expected upload slots for a learner in a given month.
///
/// Period 1 is due mid-month, period 2 on the last calendar day.
pub fn expected_periods(learner: &LearnerId, month: MonthKey) -> [TimesheetSchedule; 2] {
    let mid_month = NaiveDate::from_ymd_opt(month.year, month.month, 15)
        .unwrap_or_else(|| month.first_day());

    [
        TimesheetSchedule {
            id: schedule_id(learner, month, TimesheetPeriod::First),
            learner_id: learner.clone(),
            month,
            period: TimesheetPeriod::First,
            due_date: mid_month,
        },
        TimesheetSchedule {
            id: schedule_id(learner, month, TimesheetPeriod::Second),
            learner_id: learner.clone(),
            month,
            period: TimesheetPeriod::Second,
            due_date: month.last_day(),
        },
    ]
}

fn schedule_id(learner: &LearnerId, month: MonthKey, period: TimesheetPeriod) -> ScheduleId {
    ScheduleId(format!(
        "{}-{}-{:02}-p{}",
        learner.0,
        month.year,
        month.month,
        period.number()
    ))
}

/// A month counts as complete once both periods have an upload on record.
/// Completeness tracks upload history, not current availability, so an
/// expired submission still counts.
pub fn month_complete(periods: &[PeriodRecord]) -> bool {
    periods.len() >= 2 && periods.iter().all(|period| period.submission.is_some())
}

/// Outcome of a download attempt against a timesheet slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum DownloadOutcome {
    Recorded { download_count: u64 },
    Forbidden(ForbiddenReason),
}

/// Why a download was refused. Surfaced to the caller so the UI can show
/// a specific message rather than a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    Expired,
    MissingFile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn learner() -> LearnerId {
        LearnerId("lrn-001".to_string())
    }

    fn month() -> MonthKey {
        MonthKey::new(2024, 2).expect("valid month")
    }

    fn submission(schedule: &TimesheetSchedule) -> TimesheetSubmission {
        TimesheetSubmission {
            schedule_id: schedule.id.clone(),
            uploaded_at: schedule.due_date,
            absent_days: None,
            expiration_date: None,
            is_expired: false,
            file_path: Some(format!("timesheets/{}.pdf", schedule.id.0)),
            download_count: 0,
        }
    }

    #[test]
    fn expected_periods_cover_mid_and_month_end() {
        let periods = expected_periods(&learner(), month());
        assert_eq!(periods[0].period, TimesheetPeriod::First);
        assert_eq!(
            periods[0].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 15).expect("valid")
        );
        assert_eq!(periods[1].period, TimesheetPeriod::Second);
        // 2024 is a leap year.
        assert_eq!(
            periods[1].due_date,
            NaiveDate::from_ymd_opt(2024, 2, 29).expect("valid")
        );
    }

    #[test]
    fn month_complete_requires_both_uploads() {
        let [first, second] = expected_periods(&learner(), month());
        let complete = vec![
            PeriodRecord {
                submission: Some(submission(&first)),
                schedule: first.clone(),
            },
            PeriodRecord {
                submission: Some(submission(&second)),
                schedule: second.clone(),
            },
        ];
        assert!(month_complete(&complete));

        let partial = vec![
            PeriodRecord {
                submission: Some(submission(&first)),
                schedule: first,
            },
            PeriodRecord {
                submission: None,
                schedule: second,
            },
        ];
        assert!(!month_complete(&partial));
        assert!(!month_complete(&partial[..1]));
        assert!(!month_complete(&[]));
    }

    #[test]
    fn expired_upload_still_counts_toward_completeness() {
        let [first, second] = expected_periods(&learner(), month());
        let mut expired = submission(&first);
        expired.is_expired = true;

        let periods = vec![
            PeriodRecord {
                submission: Some(expired),
                schedule: first,
            },
            PeriodRecord {
                submission: Some(submission(&second)),
                schedule: second.clone(),
            },
        ];
        assert!(month_complete(&periods));
    }

    #[test]
    fn period_status_uses_shared_resolver() {
        let [first, _] = expected_periods(&learner(), month());
        let record = PeriodRecord {
            submission: None,
            schedule: first,
        };
        let after_due = NaiveDate::from_ymd_opt(2024, 2, 20).expect("valid");
        assert_eq!(record.status(after_due), SubmissionStatus::Overdue);
    }
}
