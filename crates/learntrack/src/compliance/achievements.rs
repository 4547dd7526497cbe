use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Achievement, BadgeType, LearnerId, MonthKey};
use super::repository::{
    ComplianceRepository, Notification, NotificationDispatcher, NotificationKind, RepositoryError,
};

/// Points granted for a mentor star rating.
pub fn rating_points(rating: u8) -> u64 {
    match rating {
        1 => 1,
        2 => 5,
        3 => 10,
        _ => 0,
    }
}

/// Number of 3-star ratings that unlocks the excellence milestone.
pub const THREE_STAR_STREAK_THRESHOLD: usize = 3;

/// Everything needed to create one achievement row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwardRequest {
    pub learner_id: LearnerId,
    pub badge_type: BadgeType,
    pub badge_name: String,
    pub description: String,
    pub points: u64,
    pub color: String,
    pub icon: String,
    pub earned_at: NaiveDate,
}

impl AwardRequest {
    pub fn mentor_rating(learner: &LearnerId, rating: u8, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::MentorRating,
            badge_name: format!("{rating}-Star Rating"),
            description: format!("Received a {rating}-star mentor rating"),
            points: rating_points(rating),
            color: "#f59e0b".to_string(),
            icon: "star".to_string(),
            earned_at,
        }
    }

    pub fn three_star_excellence(learner: &LearnerId, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::ThreeStarExcellence,
            badge_name: "3-Star Excellence".to_string(),
            description: format!(
                "Earned {THREE_STAR_STREAK_THRESHOLD} perfect mentor ratings"
            ),
            points: 50,
            color: "#8b5cf6".to_string(),
            icon: "trophy".to_string(),
            earned_at,
        }
    }

    pub fn first_feedback(learner: &LearnerId, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::FirstFeedback,
            badge_name: "First Feedback".to_string(),
            description: "Submitted your first monthly feedback".to_string(),
            points: 15,
            color: "#22c55e".to_string(),
            icon: "flag".to_string(),
            earned_at,
        }
    }

    pub fn perfect_month(learner: &LearnerId, month: MonthKey, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::PerfectMonth,
            badge_name: format!(
                "Perfect Month {}-{:02}",
                month.year, month.month
            ),
            description: "Uploaded both timesheet periods for the month".to_string(),
            points: 25,
            color: "#3b82f6".to_string(),
            icon: "calendar-check".to_string(),
            earned_at,
        }
    }

    pub fn timesheet_upload(learner: &LearnerId, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::TimesheetUpload,
            badge_name: "Timesheet Upload".to_string(),
            description: "Uploaded a bi-weekly timesheet".to_string(),
            points: 5,
            color: "#0ea5e9".to_string(),
            icon: "clock".to_string(),
            earned_at,
        }
    }

    pub fn document_upload(learner: &LearnerId, label: &str, earned_at: NaiveDate) -> Self {
        Self {
            learner_id: learner.clone(),
            badge_type: BadgeType::DocumentUpload,
            badge_name: "Document Upload".to_string(),
            description: format!("Uploaded {label}"),
            points: 5,
            color: "#64748b".to_string(),
            icon: "file".to_string(),
            earned_at,
        }
    }
}

/// Result of an award attempt. `AlreadyExists` is an ordinary outcome,
/// not an error: milestone badges are at-most-once by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardOutcome {
    Created,
    AlreadyExists,
}

/// Idempotent badge-grant logic over the repository and notification
/// seams.
pub struct Awarder;

impl Awarder {
    /// Grant an achievement.
    ///
    /// Milestone types run an existence check first as a fast path, but
    /// the store's uniqueness constraint is the authoritative guard: a
    /// `Conflict` from the insert also resolves to `AlreadyExists`, so
    /// two concurrent calls cannot both create the row. Repeatable types
    /// insert unconditionally. A created award dispatches a notification
    /// fire-and-forget; dispatch failure never rolls the award back.
    pub fn award<R, N>(
        repository: &R,
        notifier: &N,
        request: AwardRequest,
    ) -> Result<AwardOutcome, RepositoryError>
    where
        R: ComplianceRepository,
        N: NotificationDispatcher,
    {
        if request.badge_type.is_milestone()
            && repository.achievement_exists(
                &request.learner_id,
                request.badge_type,
                &request.badge_name,
            )?
        {
            return Ok(AwardOutcome::AlreadyExists);
        }

        let achievement = Achievement {
            learner_id: request.learner_id.clone(),
            badge_type: request.badge_type,
            badge_name: request.badge_name.clone(),
            description: request.description.clone(),
            points_awarded: request.points,
            color: request.color,
            icon: request.icon,
            earned_at: request.earned_at,
        };

        match repository.insert_achievement(achievement) {
            Ok(()) => {}
            Err(RepositoryError::Conflict) if request.badge_type.is_milestone() => {
                return Ok(AwardOutcome::AlreadyExists);
            }
            Err(other) => return Err(other),
        }

        let notification = Notification {
            user_id: request.learner_id,
            title: format!("Badge earned: {}", request.badge_name),
            message: format!("{} (+{} points)", request.description, request.points),
            kind: NotificationKind::Achievement,
        };
        if let Err(error) = notifier.dispatch(notification) {
            tracing::warn!(%error, badge = %request.badge_name, "achievement notification failed");
        }

        Ok(AwardOutcome::Created)
    }
}
