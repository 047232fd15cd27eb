use crate::cli::ServeArgs;
use crate::demo::{seed_applications, seed_directory};
use crate::infra::{AppState, InMemoryArrangementStore, InMemoryDirectory};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Local;
use flexwork::config::AppConfig;
use flexwork::error::AppError;
use flexwork::session::SessionContext;
use flexwork::telemetry;
use flexwork::workflows::arrangements::ArrangementService;
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

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let directory = Arc::new(if args.seed_demo {
        InMemoryDirectory::with_employees(seed_directory())
    } else {
        InMemoryDirectory::default()
    });
    let store = Arc::new(if args.seed_demo {
        InMemoryArrangementStore::with_applications(seed_applications(Local::now().date_naive()))
    } else {
        InMemoryArrangementStore::default()
    });
    let sessions = Arc::new(SessionContext::new(config.session.ttl_minutes));

    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        sessions,
        directory: directory.clone(),
    };
    let service = Arc::new(ArrangementService::new(store, directory));

    let app = with_portal_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded = args.seed_demo, "flexible work portal ready");

    axum::serve(listener, app).await?;
    Ok(())
}
