use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;

use super::achievements::{
    rating_points, AwardOutcome, AwardRequest, Awarder, THREE_STAR_STREAK_THRESHOLD,
};
use super::domain::{
    DocumentKind, LearnerId, LearnerProfile, MonthKey, MonthlyComplianceSnapshot, ScheduleId,
    SubmissionStatus,
};
use super::repository::{
    parse_document_rows, ComplianceRepository, Notification, NotificationDispatcher,
    NotificationKind, RepositoryError,
};
use super::schedule::{month_complete, DownloadOutcome, ForbiddenReason};
use super::scoring::{EngagementSignal, ScoreBreakdown, ScoreCalculator, ScoreContext, ScoreInputs};
use super::snapshot::{self, Trend};

/// Engine facade composing the calculator, awarder, repository, and
/// notification dispatcher. One instance serves every surface (learner
/// dashboard, admin dashboard, reports, timesheet views) so status and
/// score derivations cannot drift apart.
pub struct ComplianceEngine<R, N> {
    repository: Arc<R>,
    notifier: Arc<N>,
    calculator: ScoreCalculator,
}

/// Error raised by engine operations. `AlreadyExists`, `Forbidden`, and
/// stale CAS toggles are ordinary outcomes and do not appear here.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("unknown learner")]
    UnknownLearner,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result of the mentor acknowledgement toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcknowledgeOutcome {
    Applied,
    /// The stored flag no longer matched the expected prior state;
    /// nothing was written.
    StaleToggle,
}

impl<R, N> ComplianceEngine<R, N>
where
    R: ComplianceRepository + 'static,
    N: NotificationDispatcher + 'static,
{
    pub fn new(repository: Arc<R>, notifier: Arc<N>, calculator: ScoreCalculator) -> Self {
        Self {
            repository,
            notifier,
            calculator,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    fn profile(&self, learner: &LearnerId) -> Result<LearnerProfile, EngineError> {
        self.repository
            .learner(learner)?
            .ok_or(EngineError::UnknownLearner)
    }

    /// Compute the weighted breakdown for a learner and cache the overall
    /// on the profile.
    pub fn score_for(
        &self,
        learner: &LearnerId,
        today: NaiveDate,
        engagement: EngagementSignal,
    ) -> Result<ScoreBreakdown, EngineError> {
        let profile = self.profile(learner)?;
        let breakdown = self.compute_breakdown(&profile, today, engagement)?;
        self.repository
            .update_compliance_score(learner, breakdown.overall)?;
        Ok(breakdown)
    }

    fn compute_breakdown(
        &self,
        profile: &LearnerProfile,
        today: NaiveDate,
        engagement: EngagementSignal,
    ) -> Result<ScoreBreakdown, EngineError> {
        let feedback = self.repository.feedback_history(&profile.id)?;
        let timesheets = self.repository.timesheet_history(&profile.id)?;
        let documents = parse_document_rows(self.repository.document_rows(&profile.id)?);

        let context = ScoreContext::for_learner(profile, today);
        let inputs = ScoreInputs {
            feedback: &feedback,
            timesheets: &timesheets,
            documents: &documents,
            engagement,
        };
        Ok(self.calculator.compute(&context, &inputs))
    }

    /// Rollup for one month, reproducible from raw rows.
    pub fn snapshot_for(
        &self,
        learner: &LearnerId,
        month: MonthKey,
        engagement: EngagementSignal,
    ) -> Result<MonthlyComplianceSnapshot, EngineError> {
        let profile = self.profile(learner)?;
        let feedback = self.repository.feedback_history(learner)?;
        let timesheets = self.repository.timesheet_history(learner)?;
        let documents = parse_document_rows(self.repository.document_rows(learner)?);
        let achievements = self.repository.achievements(learner)?;

        Ok(snapshot::snapshot(
            &self.calculator,
            &profile,
            month,
            &feedback,
            &timesheets,
            &documents,
            &achievements,
            engagement,
        ))
    }

    /// Snapshots for every fully elapsed programme month, ascending.
    pub fn snapshot_history(
        &self,
        learner: &LearnerId,
        today: NaiveDate,
    ) -> Result<Vec<MonthlyComplianceSnapshot>, EngineError> {
        let profile = self.profile(learner)?;
        let start = MonthKey::from_date(profile.program_start);
        let current = MonthKey::from_date(today);

        start
            .months_through(current)
            .into_iter()
            .filter(|month| month.last_day() <= today)
            .map(|month| self.snapshot_for(learner, month, EngagementSignal::default()))
            .collect()
    }

    pub fn trend_for(&self, learner: &LearnerId, today: NaiveDate) -> Result<Trend, EngineError> {
        let history = self.snapshot_history(learner, today)?;
        Ok(snapshot::trend(&history))
    }

    /// Lifetime points, summed over raw achievement rows only.
    pub fn lifetime_points(&self, learner: &LearnerId) -> Result<u64, EngineError> {
        let achievements = self.repository.achievements(learner)?;
        Ok(snapshot::lifetime_points(&achievements))
    }

    /// Gate and record a timesheet download. Refused (no increment) when
    /// the submission is expired or carries no file reference; the
    /// increment itself is the store's atomic operation.
    pub fn record_download(
        &self,
        schedule: &ScheduleId,
        today: NaiveDate,
    ) -> Result<DownloadOutcome, EngineError> {
        let record = self
            .repository
            .period_record(schedule)?
            .ok_or(RepositoryError::NotFound)?;

        let Some(submission) = &record.submission else {
            return Ok(DownloadOutcome::Forbidden(ForbiddenReason::MissingFile));
        };
        if submission.file_path.is_none() {
            return Ok(DownloadOutcome::Forbidden(ForbiddenReason::MissingFile));
        }
        if record.status(today) == SubmissionStatus::Expired {
            return Ok(DownloadOutcome::Forbidden(ForbiddenReason::Expired));
        }

        let download_count = self.repository.increment_download(schedule)?;
        Ok(DownloadOutcome::Recorded { download_count })
    }

    /// Apply a mentor star rating event for one feedback month: award the
    /// repeatable rating badge, then run the streak check. The rating must
    /// be anchored to an existing feedback row for that month; rating a
    /// month with nothing submitted is `NotFound`. The milestone's dedup
    /// makes the "first time the 3-star count reaches the threshold"
    /// semantics fall out of calling this after every qualifying event.
    pub fn apply_mentor_rating(
        &self,
        learner: &LearnerId,
        month: MonthKey,
        rating: u8,
        today: NaiveDate,
    ) -> Result<AwardOutcome, EngineError> {
        self.profile(learner)?;
        let history = self.repository.feedback_history(learner)?;
        if !history.iter().any(|row| row.month == month) {
            return Err(RepositoryError::NotFound.into());
        }
        tracing::info!(learner = %learner.0, rating, points = rating_points(rating), "mentor rating event");

        let outcome = Awarder::award(
            self.repository.as_ref(),
            self.notifier.as_ref(),
            AwardRequest::mentor_rating(learner, rating, today),
        )?;

        if rating == 3 {
            let three_star_count = history
                .iter()
                .filter(|row| row.mentor_rating == Some(3))
                .count();
            if three_star_count >= THREE_STAR_STREAK_THRESHOLD {
                Awarder::award(
                    self.repository.as_ref(),
                    self.notifier.as_ref(),
                    AwardRequest::three_star_excellence(learner, today),
                )?;
            }
        }

        Ok(outcome)
    }

    /// First-feedback milestone attempt, called on every feedback
    /// submission event; dedup keeps it at-most-once.
    pub fn note_feedback_submitted(
        &self,
        learner: &LearnerId,
        today: NaiveDate,
    ) -> Result<AwardOutcome, EngineError> {
        self.profile(learner)?;
        Ok(Awarder::award(
            self.repository.as_ref(),
            self.notifier.as_ref(),
            AwardRequest::first_feedback(learner, today),
        )?)
    }

    /// Timesheet upload event: repeatable upload badge, plus the
    /// per-month "Perfect Month" milestone once both periods are in.
    pub fn note_timesheet_uploaded(
        &self,
        learner: &LearnerId,
        month: MonthKey,
        today: NaiveDate,
    ) -> Result<AwardOutcome, EngineError> {
        self.profile(learner)?;
        let outcome = Awarder::award(
            self.repository.as_ref(),
            self.notifier.as_ref(),
            AwardRequest::timesheet_upload(learner, today),
        )?;

        let month_periods: Vec<_> = self
            .repository
            .timesheet_history(learner)?
            .into_iter()
            .filter(|record| record.schedule.month == month)
            .collect();
        if month_complete(&month_periods) {
            Awarder::award(
                self.repository.as_ref(),
                self.notifier.as_ref(),
                AwardRequest::perfect_month(learner, month, today),
            )?;
        }

        Ok(outcome)
    }

    /// Document upload event: repeatable badge per upload.
    pub fn note_document_uploaded(
        &self,
        learner: &LearnerId,
        kind: DocumentKind,
        today: NaiveDate,
    ) -> Result<AwardOutcome, EngineError> {
        self.profile(learner)?;
        Ok(Awarder::award(
            self.repository.as_ref(),
            self.notifier.as_ref(),
            AwardRequest::document_upload(learner, kind.label(), today),
        )?)
    }

    /// Mentor "mark as received" toggle, conditioned on the expected
    /// prior state so two concurrent toggles cannot silently cancel each
    /// other. A stale expectation writes nothing.
    pub fn acknowledge_feedback(
        &self,
        learner: &LearnerId,
        month: MonthKey,
        expected: bool,
        value: bool,
    ) -> Result<AcknowledgeOutcome, EngineError> {
        let applied = self
            .repository
            .set_feedback_acknowledged(learner, month, expected, value)?;
        if !applied {
            return Ok(AcknowledgeOutcome::StaleToggle);
        }

        if value {
            let notification = Notification {
                user_id: learner.clone(),
                title: "Feedback received".to_string(),
                message: format!(
                    "Your {}-{:02} feedback was marked as received",
                    month.year, month.month
                ),
                kind: NotificationKind::Acknowledgement,
            };
            if let Err(error) = self.notifier.dispatch(notification) {
                tracing::warn!(%error, "acknowledgement notification failed");
            }
        }

        Ok(AcknowledgeOutcome::Applied)
    }
}
