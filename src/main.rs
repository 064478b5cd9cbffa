use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use certwatch::actor::Actor;
use certwatch::compliance::domain::{
    CertificationId, CertificationRequirement, CertificationType, CertificationTypeId, Coach,
    CoachCertification, CoachId, Program, ProgramId, TenantId,
};
use certwatch::compliance::{compliance_router, ComplianceEvaluator};
use certwatch::config::AppConfig;
use certwatch::error::AppError;
use certwatch::notifications::{
    notification_router, DispatchEngine, NotificationSchedule, NotificationState,
    ScheduleChannels, ScheduleId, ScheduleService,
};
use certwatch::store::{MemoryStore, RecordingMailer};
use certwatch::telemetry;
use chrono::{Duration, Local, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "certwatch",
    about = "Certification compliance and expiry-notification engine for school athletics programs",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Run one notification dispatch cycle against the demo data set
    Dispatch(DispatchArgs),
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Args, Debug, Default)]
struct DispatchArgs {
    /// Reference date for the cycle (YYYY-MM-DD, defaults to today)
    #[arg(long, value_parser = parse_date)]
    as_of: Option<NaiveDate>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Dispatch(args) => run_dispatch(args),
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    // Demo wiring: an in-memory store seeded with a small school until the
    // relational store integration lands. The Extension layer stands in for
    // the identity provider.
    let store = Arc::new(seeded_store(Local::now().date_naive()));
    let evaluator = Arc::new(ComplianceEvaluator::new(
        store.clone(),
        config.compliance.lookahead_days,
    ));
    let mailer = Arc::new(RecordingMailer::default());
    let schedules = Arc::new(ScheduleService::new(store.clone()));
    let engine = Arc::new(DispatchEngine::new(store.clone(), store.clone(), mailer));

    let app = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state)
        .merge(compliance_router(evaluator))
        .merge(notification_router(NotificationState { schedules, engine }))
        .layer(Extension(Actor::system_admin("demo-admin")))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "certification compliance service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn run_dispatch(args: DispatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let reference = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let store = Arc::new(seeded_store(reference));
    let mailer = Arc::new(RecordingMailer::default());
    let engine = DispatchEngine::new(store.clone(), store.clone(), mailer.clone());

    let outcome = engine.run_cycle(reference);
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "reference_date": reference,
            "notifications_sent": outcome.notifications_sent,
            "already_sent": outcome.already_sent,
            "failures": outcome.failures,
            "emails": mailer.sent().len(),
        }))
        .unwrap_or_default()
    );
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    let body = state.metrics.render();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// A small seeded data set so `serve` and `dispatch` are demonstrable without
/// a database: one school, two programs, a CPR requirement, and a coach whose
/// CPR certification expires a week out.
fn seeded_store(reference: NaiveDate) -> MemoryStore {
    let store = MemoryStore::default();
    let tenant = TenantId("lincoln-high".to_string());

    store.put_coach(Coach {
        id: CoachId("coach-taylor".to_string()),
        full_name: "Morgan Taylor".to_string(),
        email: "mtaylor@lincoln.example.org".to_string(),
        tenant: Some(tenant.clone()),
    });

    for (id, name, sport) in [
        ("prog-football", "Varsity Football", "football"),
        ("prog-track", "Track & Field", "track"),
    ] {
        store.put_program(Program {
            id: ProgramId(id.to_string()),
            name: name.to_string(),
            sport: sport.to_string(),
            tenant: tenant.clone(),
        });
        store.assign(&CoachId("coach-taylor".to_string()), &ProgramId(id.to_string()));
    }

    store.put_certification_type(CertificationType {
        id: CertificationTypeId("cpr".to_string()),
        name: "CPR".to_string(),
        tenant: None,
        validity_months: Some(24),
        is_universal: true,
    });

    store.put_requirement(CertificationRequirement {
        program: ProgramId("prog-football".to_string()),
        certification_type: CertificationTypeId("cpr".to_string()),
        is_required: true,
        locked_by_admin: true,
    });

    store.put_certification(CoachCertification {
        id: CertificationId("cert-cpr-taylor".to_string()),
        coach: CoachId("coach-taylor".to_string()),
        certification_type: CertificationTypeId("cpr".to_string()),
        certificate_number: "CPR-20417".to_string(),
        issuing_organization: "Red Cross".to_string(),
        issue_date: reference - Duration::days(700),
        expiration_date: Some(reference + Duration::days(7)),
        document_url: None,
        created_at: Utc::now(),
    });

    if let Err(err) = seed_schedules(&store) {
        tracing::warn!(error = %err, "demo schedule seed skipped");
    }
    store
}

fn seed_schedules(store: &MemoryStore) -> Result<(), certwatch::compliance::RepositoryError> {
    use certwatch::notifications::repository::ScheduleStore;

    for (id, days) in [("sched-30d", 30), ("sched-7d", 7), ("sched-day-of", 0)] {
        store.insert(NotificationSchedule {
            id: ScheduleId(id.to_string()),
            tenant: None,
            days_before_expiry: days,
            notification_type: ScheduleChannels::Both,
            is_active: true,
        })?;
    }
    Ok(())
}
