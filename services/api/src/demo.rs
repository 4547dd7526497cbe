use crate::infra::parse_date;
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use learntrack::compliance::bulk::score_roster;
use learntrack::compliance::memory::{MemoryNotifier, MemoryStore};
use learntrack::compliance::{
    expected_periods, ComplianceEngine, ComplianceRepository, DocumentKind, DocumentRecord,
    EngagementSignal, EngineError, FeedbackSubmission, LearnerId, LearnerProfile, MonthKey,
    RawDocumentRow, ScoreCalculator, TimesheetSubmission,
};
use learntrack::error::AppError;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Override the evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct RosterArgs {
    /// Override the evaluation date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Maximum learners scored in flight at once
    #[arg(long, default_value_t = 4)]
    pub(crate) concurrency: usize,
}

/// Months of the demo programme that have fully elapsed by `today`.
fn elapsed_months(program_start: NaiveDate, today: NaiveDate) -> Vec<MonthKey> {
    MonthKey::from_date(program_start)
        .months_through(MonthKey::from_date(today))
        .into_iter()
        .filter(|month| month.last_day() <= today)
        .collect()
}

/// Seeding profile for one demo learner: how reliably they submit.
struct DemoLearner {
    id: &'static str,
    full_name: &'static str,
    /// Submit feedback every n-th month (1 = every month).
    feedback_cadence: usize,
    mentor_rating: u8,
    /// Upload both timesheet periods every n-th month.
    timesheet_cadence: usize,
    documents: &'static [DocumentKind],
}

const DEMO_ROSTER: [DemoLearner; 3] = [
    DemoLearner {
        id: "lrn-001",
        full_name: "Thandi Mokoena",
        feedback_cadence: 1,
        mentor_rating: 3,
        timesheet_cadence: 1,
        documents: &[
            DocumentKind::IdDocument,
            DocumentKind::LearnershipAgreement,
            DocumentKind::ProofOfAddress,
            DocumentKind::BankConfirmation,
        ],
    },
    DemoLearner {
        id: "lrn-002",
        full_name: "Sipho Dlamini",
        feedback_cadence: 2,
        mentor_rating: 2,
        timesheet_cadence: 2,
        documents: &[DocumentKind::IdDocument, DocumentKind::LearnershipAgreement],
    },
    DemoLearner {
        id: "lrn-003",
        full_name: "Ayesha Patel",
        feedback_cadence: 4,
        mentor_rating: 1,
        timesheet_cadence: 3,
        documents: &[DocumentKind::IdDocument],
    },
];

/// Seed the in-memory store with three learners whose histories range
/// from exemplary to lagging, so scores and remediation lists have
/// something to show.
pub(crate) fn seed_demo_roster(store: &MemoryStore) {
    let today = Local::now().date_naive();
    seed_roster_as_of(store, today);
}

fn seed_roster_as_of(store: &MemoryStore, today: NaiveDate) {
    let program_start = today - Duration::days(150);

    for learner in DEMO_ROSTER {
        let id = LearnerId(learner.id.to_string());
        store.upsert_learner(LearnerProfile {
            id: id.clone(),
            full_name: learner.full_name.to_string(),
            email: format!("{}@example.com", learner.id),
            program_start,
            applicable_documents: Vec::new(),
            compliance_score: 0.0,
            points: 0,
        });

        for (index, month) in elapsed_months(program_start, today).iter().enumerate() {
            if index % learner.feedback_cadence == 0 {
                store.put_feedback(FeedbackSubmission {
                    learner_id: id.clone(),
                    month: *month,
                    due_date: month.last_day(),
                    submitted_at: Some(month.last_day()),
                    mentor_rating: Some(learner.mentor_rating),
                    mentor_approved_at: Some(month.last_day()),
                    acknowledged: false,
                });
            }
            let uploads = index % learner.timesheet_cadence == 0;
            for schedule in expected_periods(&id, *month) {
                let schedule_id = schedule.id.clone();
                let due_date = schedule.due_date;
                store.put_schedule(schedule);
                if uploads {
                    store.put_submission(TimesheetSubmission {
                        schedule_id: schedule_id.clone(),
                        uploaded_at: due_date,
                        absent_days: Some(0),
                        expiration_date: None,
                        is_expired: false,
                        file_path: Some(format!("timesheets/{}.pdf", schedule_id.0)),
                        download_count: 0,
                    });
                }
            }
        }

        for kind in learner.documents {
            let record = DocumentRecord {
                schema_version: 1,
                learner_id: id.clone(),
                kind: *kind,
                uploaded_at: program_start,
                file_path: format!("documents/{}/{:?}.pdf", learner.id, kind),
            };
            store.put_document_row(
                &id,
                RawDocumentRow {
                    row_id: format!("doc-{}-{:?}", learner.id, kind),
                    payload: serde_json::to_string(&record)
                        .unwrap_or_else(|_| String::from("{}")),
                },
            );
        }
    }
}

fn build_demo_engine(
    today: NaiveDate,
) -> (
    Arc<ComplianceEngine<MemoryStore, MemoryNotifier>>,
    Arc<MemoryStore>,
) {
    let store = Arc::new(MemoryStore::default());
    seed_roster_as_of(&store, today);
    let engine = Arc::new(ComplianceEngine::new(
        store.clone(),
        Arc::new(MemoryNotifier::default()),
        ScoreCalculator::default(),
    ));
    (engine, store)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (engine, store) = build_demo_engine(today);

    println!("Learnership compliance demo (as of {today})");

    for learner in DEMO_ROSTER {
        let id = LearnerId(learner.id.to_string());

        // Replay portal events so badges and points accrue.
        for row in store.feedback_history(&id).map_err(EngineError::from)? {
            if let Some(submitted) = row.submitted_at {
                engine.note_feedback_submitted(&id, submitted)?;
            }
            if let Some(rating) = row.mentor_rating {
                engine.apply_mentor_rating(&id, row.month, rating, row.due_date)?;
            }
        }
        for record in store.timesheet_history(&id).map_err(EngineError::from)? {
            if record.submission.is_some() {
                engine.note_timesheet_uploaded(&id, record.schedule.month, today)?;
            }
        }

        let breakdown = engine.score_for(&id, today, EngagementSignal::default())?;
        let points = engine.lifetime_points(&id)?;
        let trend = engine.trend_for(&id, today)?;

        println!("\n{} ({})", learner.full_name, learner.id);
        println!(
            "  overall {:>5.1}  feedback {:>5.1}  timesheets {:>5.1}  documents {:>5.1}  engagement {:>5.1}",
            breakdown.overall,
            breakdown.feedback,
            breakdown.timesheet,
            breakdown.document,
            breakdown.engagement,
        );
        println!("  lifetime points {points}, trend {trend:?}");
        if breakdown.next_actions.is_empty() {
            println!("  nothing outstanding");
        } else {
            for action in &breakdown.next_actions {
                println!("  - {action}");
            }
        }
    }

    Ok(())
}

pub(crate) async fn run_roster_scores(args: RosterArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let (engine, store) = build_demo_engine(today);
    let roster = store.roster().map_err(EngineError::from)?;

    let scores = score_roster(
        engine,
        roster,
        args.concurrency,
        Arc::new(AtomicBool::new(false)),
        today,
    )
    .await;

    let rendered = serde_json::to_string_pretty(&scores)
        .unwrap_or_else(|_| String::from("[]"));
    println!("{rendered}");
    Ok(())
}
