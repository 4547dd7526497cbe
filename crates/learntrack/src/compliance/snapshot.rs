use serde::Serialize;

use super::domain::{
    Achievement, BadgeCategory, DocumentRecord, FeedbackSubmission, LearnerId, LearnerProfile,
    MonthKey, MonthlyComplianceSnapshot,
};
use super::schedule::PeriodRecord;
use super::scoring::{EngagementSignal, ScoreCalculator, ScoreContext, ScoreInputs};

/// Direction of a learner's recent compliance movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Build the per-month rollup for one learner.
///
/// The calculator runs with `today` pinned to the month's last day and
/// every history filtered through that month, so recomputing an old
/// snapshot later yields the same numbers. Achievement points earned in
/// the month are bucketed by badge category.
pub fn snapshot(
    calculator: &ScoreCalculator,
    profile: &LearnerProfile,
    month: MonthKey,
    feedback: &[FeedbackSubmission],
    timesheets: &[PeriodRecord],
    documents: &[DocumentRecord],
    achievements: &[Achievement],
    engagement: EngagementSignal,
) -> MonthlyComplianceSnapshot {
    let month_end = month.last_day();

    let feedback_window: Vec<FeedbackSubmission> = feedback
        .iter()
        .filter(|row| row.month <= month)
        .cloned()
        .collect();
    let timesheet_window: Vec<PeriodRecord> = timesheets
        .iter()
        .filter(|record| record.schedule.month <= month)
        .cloned()
        .collect();
    let document_window: Vec<DocumentRecord> = documents
        .iter()
        .filter(|record| record.uploaded_at <= month_end)
        .cloned()
        .collect();

    let context = ScoreContext::for_learner(profile, month_end);
    let inputs = ScoreInputs {
        feedback: &feedback_window,
        timesheets: &timesheet_window,
        documents: &document_window,
        engagement,
    };
    let breakdown = calculator.compute(&context, &inputs);

    let mut feedback_points = 0u64;
    let mut timesheet_points = 0u64;
    let mut document_points = 0u64;
    let mut engagement_points = 0u64;
    for achievement in achievements {
        if MonthKey::from_date(achievement.earned_at) != month {
            continue;
        }
        let bucket = match achievement.badge_type.category() {
            BadgeCategory::Feedback => &mut feedback_points,
            BadgeCategory::Timesheet => &mut timesheet_points,
            BadgeCategory::Document => &mut document_points,
            BadgeCategory::Engagement => &mut engagement_points,
        };
        *bucket += achievement.points_awarded;
    }

    MonthlyComplianceSnapshot {
        learner_id: profile.id.clone(),
        month,
        feedback_score: breakdown.feedback,
        timesheet_score: breakdown.timesheet,
        document_score: breakdown.document,
        engagement_score: breakdown.engagement,
        overall_compliance_percent: breakdown.overall,
        feedback_points,
        timesheet_points,
        document_points,
        engagement_points,
        total_monthly_points: feedback_points
            + timesheet_points
            + document_points
            + engagement_points,
    }
}

/// Compare the mean overall of the most recent three snapshots against
/// the prior three. Both windows need at least one snapshot; otherwise
/// the trend is stable. `history` is expected in ascending month order.
pub fn trend(history: &[MonthlyComplianceSnapshot]) -> Trend {
    let recent_len = history.len().min(3);
    if recent_len == 0 {
        return Trend::Stable;
    }
    let split = history.len() - recent_len;
    let (prior_all, recent) = history.split_at(split);
    let prior_start = prior_all.len().saturating_sub(3);
    let prior = &prior_all[prior_start..];
    if prior.is_empty() {
        return Trend::Stable;
    }

    let recent_mean = mean_overall(recent);
    let prior_mean = mean_overall(prior);

    if recent_mean > prior_mean {
        Trend::Up
    } else if recent_mean < prior_mean {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn mean_overall(snapshots: &[MonthlyComplianceSnapshot]) -> f64 {
    snapshots
        .iter()
        .map(|snapshot| snapshot.overall_compliance_percent)
        .sum::<f64>()
        / snapshots.len() as f64
}

/// Lifetime points are always the sum over raw achievement rows. Never
/// derived from snapshots or the cached profile total, which are
/// presentation rollups.
pub fn lifetime_points(achievements: &[Achievement]) -> u64 {
    achievements
        .iter()
        .map(|achievement| achievement.points_awarded)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_overall(month: u32, overall: f64) -> MonthlyComplianceSnapshot {
        MonthlyComplianceSnapshot {
            learner_id: LearnerId("lrn-001".to_string()),
            month: MonthKey::new(2024, month).expect("valid month"),
            feedback_score: overall,
            timesheet_score: overall,
            document_score: overall,
            engagement_score: overall,
            overall_compliance_percent: overall,
            feedback_points: 0,
            timesheet_points: 0,
            document_points: 0,
            engagement_points: 0,
            total_monthly_points: 0,
        }
    }

    #[test]
    fn trend_up_when_recent_window_improves() {
        let history: Vec<_> = [40.0, 45.0, 50.0, 70.0, 75.0, 80.0]
            .iter()
            .enumerate()
            .map(|(index, overall)| snapshot_with_overall(index as u32 + 1, *overall))
            .collect();
        assert_eq!(trend(&history), Trend::Up);
    }

    #[test]
    fn trend_down_when_recent_window_slips() {
        let history: Vec<_> = [90.0, 85.0, 80.0, 60.0, 55.0, 50.0]
            .iter()
            .enumerate()
            .map(|(index, overall)| snapshot_with_overall(index as u32 + 1, *overall))
            .collect();
        assert_eq!(trend(&history), Trend::Down);
    }

    #[test]
    fn trend_stable_without_a_prior_window() {
        assert_eq!(trend(&[]), Trend::Stable);
        let only_recent = vec![
            snapshot_with_overall(1, 50.0),
            snapshot_with_overall(2, 60.0),
            snapshot_with_overall(3, 70.0),
        ];
        assert_eq!(trend(&only_recent), Trend::Stable);
    }

    #[test]
    fn trend_uses_partial_prior_window() {
        // Four snapshots: prior window is the single oldest one.
        let history = vec![
            snapshot_with_overall(1, 80.0),
            snapshot_with_overall(2, 50.0),
            snapshot_with_overall(3, 55.0),
            snapshot_with_overall(4, 60.0),
        ];
        assert_eq!(trend(&history), Trend::Down);
    }

    #[test]
    fn trend_stable_on_equal_means() {
        let history: Vec<_> = (1..=6)
            .map(|month| snapshot_with_overall(month, 60.0))
            .collect();
        assert_eq!(trend(&history), Trend::Stable);
    }
}
