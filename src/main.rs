use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use chrono::Utc;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hostel::cli::{self, AdminCommands, Commands, PassCommands, RequestCommands};
use hostel::config::{self, Config, StoreBackend};
use hostel::models::request::{RequestDetails, RequestKind};
use hostel::store::memory::MemoryStore;
use hostel::store::postgres::PgStore;
use hostel::store::DocumentStore;
use hostel::{api, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(Commands::Admin { command }) => {
            let state = build_state(cfg, false).await?;
            handle_admin_command(&state, command).await
        }
        Some(Commands::Requests { command }) => {
            let state = build_state(cfg, false).await?;
            handle_request_command(&state, command).await
        }
        Some(Commands::Pass { command }) => {
            let state = AppState::new(Arc::new(MemoryStore::new()), cfg);
            handle_pass_command(&state, command)
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

/// Stdout logging (plain or JSON), plus OTLP export when
/// `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
fn init_tracing() {
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        match opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "hostel"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
        {
            Ok(tracer) => Some(tracing_opentelemetry::layer().with_tracer(tracer)),
            Err(e) => {
                eprintln!("failed to install OpenTelemetry tracer: {e}");
                None
            }
        }
    } else {
        None
    };

    let json = std::env::var("HOSTEL_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let (plain_layer, json_layer) = if json {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "hostel=debug,tower_http=debug".into()),
        ))
        .with(plain_layer)
        .with(json_layer)
        .with(telemetry_layer)
        .init();
}

async fn open_store(cfg: &Config, migrate: bool) -> anyhow::Result<Arc<dyn DocumentStore>> {
    match cfg.store {
        StoreBackend::Memory => {
            tracing::warn!("using the in-memory store, nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            tracing::info!("Connecting to database...");
            let db = PgStore::connect(&cfg.database_url).await?;
            if migrate {
                tracing::info!("Running migrations...");
                db.migrate().await?;
            }
            Ok(Arc::new(db))
        }
    }
}

async fn build_state(cfg: Config, migrate: bool) -> anyhow::Result<AppState> {
    let store = open_store(&cfg, migrate).await?;
    Ok(AppState::new(store, cfg))
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    let dashboard_origin = cfg.dashboard_origin.clone();
    let state = Arc::new(build_state(cfg, true).await?);

    let app = api::router(state.clone())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer({
            use axum::http::{HeaderName, Method};
            use tower_http::cors::AllowOrigin;
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(move |origin, _| {
                    let origin_str = origin.to_str().unwrap_or("");
                    origin_str == dashboard_origin
                        || origin_str.starts_with("http://localhost:")
                        || origin_str.starts_with("http://127.0.0.1:")
                }))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    HeaderName::from_static("content-type"),
                    HeaderName::from_static("authorization"),
                    HeaderName::from_static("x-session-token"),
                    HeaderName::from_static("x-request-id"),
                ])
                .allow_credentials(true)
        })
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    jobs::cleanup::spawn(state.sessions.clone());
    tracing::info!("Background cleanup job started (expired sessions every 1h)");
    if state.webhook.is_enabled() {
        tracing::info!("Webhook delivery enabled");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("hostel service listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: tags every response with an X-Request-Id for log correlation.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: security headers on every response.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    // pass tokens and personal records must not be cached
    headers.insert("cache-control", HeaderValue::from_static("no-store"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert(
        "permissions-policy",
        HeaderValue::from_static("camera=(), microphone=(), geolocation=()"),
    );
    headers.remove("server");

    resp
}

// ── CLI handlers ─────────────────────────────────────────────

async fn handle_admin_command(state: &AppState, cmd: AdminCommands) -> anyhow::Result<()> {
    match cmd {
        AdminCommands::Create {
            username,
            email,
            password,
        } => {
            let admin = state
                .repo
                .create_admin(&username, &email, &password, Utc::now())
                .await?;
            println!("Admin '{}' <{}> created.", admin.username, admin.email);
        }
    }
    Ok(())
}

fn summary(details: &RequestDetails) -> String {
    let text = match details {
        RequestDetails::Leave(d) => format!("{} -> {} ({})", d.leave_from, d.leave_to, d.destination),
        RequestDetails::Visitor(d) => format!("{} on {} {}", d.visitor_name, d.visit_date, d.entry_time),
    };
    if text.chars().count() > 40 {
        format!("{}...", text.chars().take(37).collect::<String>())
    } else {
        text
    }
}

async fn handle_request_command(state: &AppState, cmd: RequestCommands) -> anyhow::Result<()> {
    match cmd {
        RequestCommands::List { kind } => {
            let kind = RequestKind::from(kind);
            let pending = state.workflow.list_pending(kind).await?;
            if pending.is_empty() {
                println!("No pending {} requests.", kind.as_str());
                return Ok(());
            }

            println!("{:<36} {:<20} {:<6} {:<40} SUBMITTED", "ID", "NAME", "ROOM", "SUMMARY");
            for r in pending {
                println!(
                    "{:<36} {:<20} {:<6} {:<40} {}",
                    r.request_id,
                    r.subject_name,
                    r.room,
                    summary(&r.details),
                    r.submitted_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        RequestCommands::Approve {
            kind,
            request_id,
            admin,
        } => {
            let approved = api::admin::requests::approve_request(
                state,
                kind.into(),
                &request_id,
                &admin,
                Utc::now(),
            )
            .await?;
            println!("Request {} approved. Pass {}:", request_id, approved.pass_id);
            println!("{}", approved.pass_token);
        }
        RequestCommands::Reject {
            kind,
            request_id,
            admin,
            reason,
        } => {
            let request = api::admin::requests::reject_request(
                state,
                kind.into(),
                &request_id,
                &admin,
                reason,
                Utc::now(),
            )
            .await?;
            println!(
                "Request {} rejected: {}",
                request.request_id,
                request.rejection_reason.unwrap_or_default()
            );
        }
    }
    Ok(())
}

fn handle_pass_command(state: &AppState, cmd: PassCommands) -> anyhow::Result<()> {
    match cmd {
        PassCommands::Verify { token } => {
            let result = state.passes.verify(&token, Utc::now());
            match (result.valid, &result.fields) {
                (true, Some(_)) => println!("VALID"),
                (false, Some(_)) => println!(
                    "INVALID: {}",
                    result.error.as_deref().unwrap_or("unknown reason")
                ),
                (_, None) => {
                    anyhow::bail!(
                        "{}",
                        result.error.as_deref().unwrap_or("pass could not be read")
                    )
                }
            }
            if let Some(fields) = &result.fields {
                println!("{}", serde_json::to_string_pretty(fields)?);
            }
        }
    }
    Ok(())
}
