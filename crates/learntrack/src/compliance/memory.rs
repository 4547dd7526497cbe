use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use super::domain::{
    Achievement, BadgeType, FeedbackSubmission, LearnerId, LearnerProfile, MonthKey, ScheduleId,
    TimesheetSchedule, TimesheetSubmission,
};
use super::repository::{
    ComplianceRepository, Notification, NotificationDispatcher, NotificationError, RawDocumentRow,
    RepositoryError,
};
use super::schedule::PeriodRecord;

/// In-memory reference store.
///
/// Honors the same contract the hosted store must provide: the milestone
/// uniqueness constraint on insert, an atomic download increment, and
/// compare-and-swap on the acknowledgement flag. Used by the service
/// binary's demo mode and throughout the test suites.
#[derive(Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    learners: HashMap<LearnerId, LearnerProfile>,
    feedback: Vec<FeedbackSubmission>,
    schedules: Vec<TimesheetSchedule>,
    submissions: HashMap<ScheduleId, TimesheetSubmission>,
    documents: HashMap<LearnerId, Vec<RawDocumentRow>>,
    achievements: Vec<Achievement>,
}

impl MemoryStore {
    pub fn upsert_learner(&self, profile: LearnerProfile) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.learners.insert(profile.id.clone(), profile);
    }

    pub fn put_feedback(&self, row: FeedbackSubmission) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard
            .feedback
            .retain(|existing| !(existing.learner_id == row.learner_id && existing.month == row.month));
        guard.feedback.push(row);
    }

    pub fn put_schedule(&self, schedule: TimesheetSchedule) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.schedules.retain(|existing| existing.id != schedule.id);
        guard.schedules.push(schedule);
    }

    pub fn put_submission(&self, submission: TimesheetSubmission) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard
            .submissions
            .insert(submission.schedule_id.clone(), submission);
    }

    pub fn put_document_row(&self, learner: &LearnerId, row: RawDocumentRow) {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        guard.documents.entry(learner.clone()).or_default().push(row);
    }

    pub fn achievement_rows(&self) -> Vec<Achievement> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        guard.achievements.clone()
    }
}

impl ComplianceRepository for MemoryStore {
    fn learner(&self, id: &LearnerId) -> Result<Option<LearnerProfile>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.learners.get(id).cloned())
    }

    fn roster(&self) -> Result<Vec<LearnerId>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut roster: Vec<LearnerId> = guard.learners.keys().cloned().collect();
        roster.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(roster)
    }

    fn feedback_history(&self, id: &LearnerId) -> Result<Vec<FeedbackSubmission>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut rows: Vec<FeedbackSubmission> = guard
            .feedback
            .iter()
            .filter(|row| row.learner_id == *id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| row.month);
        Ok(rows)
    }

    fn timesheet_history(&self, id: &LearnerId) -> Result<Vec<PeriodRecord>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        let mut records: Vec<PeriodRecord> = guard
            .schedules
            .iter()
            .filter(|schedule| schedule.learner_id == *id)
            .map(|schedule| PeriodRecord {
                schedule: schedule.clone(),
                submission: guard.submissions.get(&schedule.id).cloned(),
            })
            .collect();
        records.sort_by_key(|record| (record.schedule.month, record.schedule.period));
        Ok(records)
    }

    fn period_record(&self, schedule: &ScheduleId) -> Result<Option<PeriodRecord>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard
            .schedules
            .iter()
            .find(|candidate| candidate.id == *schedule)
            .map(|found| PeriodRecord {
                schedule: found.clone(),
                submission: guard.submissions.get(&found.id).cloned(),
            }))
    }

    fn document_rows(&self, id: &LearnerId) -> Result<Vec<RawDocumentRow>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.documents.get(id).cloned().unwrap_or_default())
    }

    fn achievements(&self, id: &LearnerId) -> Result<Vec<Achievement>, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard
            .achievements
            .iter()
            .filter(|row| row.learner_id == *id)
            .cloned()
            .collect())
    }

    fn achievement_exists(
        &self,
        id: &LearnerId,
        badge_type: BadgeType,
        badge_name: &str,
    ) -> Result<bool, RepositoryError> {
        let guard = self.inner.lock().expect("store mutex poisoned");
        Ok(guard.achievements.iter().any(|row| {
            row.learner_id == *id && row.badge_type == badge_type && row.badge_name == badge_name
        }))
    }

    fn insert_achievement(&self, achievement: Achievement) -> Result<(), RepositoryError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        if achievement.badge_type.is_milestone() {
            let duplicate = guard.achievements.iter().any(|row| {
                row.learner_id == achievement.learner_id
                    && row.badge_type == achievement.badge_type
                    && row.badge_name == achievement.badge_name
            });
            if duplicate {
                return Err(RepositoryError::Conflict);
            }
        }
        if let Some(profile) = guard.learners.get_mut(&achievement.learner_id) {
            profile.points += achievement.points_awarded;
        }
        guard.achievements.push(achievement);
        Ok(())
    }

    fn increment_download(&self, schedule: &ScheduleId) -> Result<u64, RepositoryError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        let submission = guard
            .submissions
            .get_mut(schedule)
            .ok_or(RepositoryError::NotFound)?;
        submission.download_count += 1;
        Ok(submission.download_count)
    }

    fn set_feedback_acknowledged(
        &self,
        id: &LearnerId,
        month: MonthKey,
        expected: bool,
        value: bool,
    ) -> Result<bool, RepositoryError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        let row = guard
            .feedback
            .iter_mut()
            .find(|row| row.learner_id == *id && row.month == month)
            .ok_or(RepositoryError::NotFound)?;
        if row.acknowledged != expected {
            return Ok(false);
        }
        row.acknowledged = value;
        Ok(true)
    }

    fn update_compliance_score(&self, id: &LearnerId, score: f64) -> Result<(), RepositoryError> {
        let mut guard = self.inner.lock().expect("store mutex poisoned");
        let profile = guard
            .learners
            .get_mut(id)
            .ok_or(RepositoryError::NotFound)?;
        profile.compliance_score = score;
        Ok(())
    }
}

/// In-memory notification sink for tests and the demo server.
#[derive(Default, Clone)]
pub struct MemoryNotifier {
    events: Arc<Mutex<Vec<Notification>>>,
}

impl MemoryNotifier {
    pub fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationDispatcher for MemoryNotifier {
    fn dispatch(&self, notification: Notification) -> Result<(), NotificationError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}
