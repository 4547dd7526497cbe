use crate::cli::ServeArgs;
use crate::demo::seed_demo_roster;
use crate::infra::{AppState, BulkSettings};
use crate::routes::with_compliance_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use learntrack::compliance::memory::{MemoryNotifier, MemoryStore};
use learntrack::compliance::{ComplianceEngine, ScoreCalculator};
use learntrack::config::AppConfig;
use learntrack::error::AppError;
use learntrack::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(config.environment, &config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };
    let bulk_settings = BulkSettings {
        concurrency: config.engine.bulk_concurrency,
        cancel: Arc::new(std::sync::atomic::AtomicBool::new(false)),
    };

    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(MemoryNotifier::default());
    if args.seed_demo {
        seed_demo_roster(&store);
    }
    let engine = Arc::new(ComplianceEngine::new(
        store,
        notifier,
        ScoreCalculator::default(),
    ));

    let app = with_compliance_routes(engine.clone())
        .layer(Extension(engine))
        .layer(Extension(bulk_settings))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "learnership compliance engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
