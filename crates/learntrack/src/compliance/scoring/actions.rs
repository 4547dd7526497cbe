use super::super::domain::MonthKey;
use super::subscores::ComplianceGaps;

/// Turn the collected gaps into the ordered remediation list: feedback
/// months first (chronological), then timesheet periods, then documents
/// in checklist order, then the engagement nudge. Purely a function of
/// the gaps, so identical inputs always produce the identical list.
pub(crate) fn remediation(gaps: &ComplianceGaps) -> Vec<String> {
    let mut actions = Vec::new();

    for month in &gaps.missing_feedback {
        actions.push(format!("Submit {} feedback", month_label(*month)));
    }

    for gap in &gaps.timesheet_gaps {
        if gap.expired {
            actions.push(format!(
                "Replace expired Period {} timesheet for {}",
                gap.period.number(),
                month_label(gap.month)
            ));
        } else {
            actions.push(format!(
                "Upload Period {} timesheet for {}",
                gap.period.number(),
                month_label(gap.month)
            ));
        }
    }

    for kind in &gaps.missing_documents {
        actions.push(format!("Upload your {}", kind.label()));
    }

    if gaps.low_engagement {
        actions.push("Catch up on unread portal notifications".to_string());
    }

    actions
}

fn month_label(month: MonthKey) -> String {
    month.first_day().format("%B %Y").to_string()
}
