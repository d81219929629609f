use std::net::SocketAddr;
use std::sync::Arc;

use htw_api::background;
use htw_api::config::{LogFormat, ServerConfig};
use htw_api::router::build_app_router;
use htw_api::state::AppState;
use htw_db::{MemoryStore, PgStore, WorkflowStore};
use htw_events::{AuditPersistence, EmailConfig, EmailDelivery, EventBus, HostNotifier, NoticeSender};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env();

    // --- Tracing ---
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "htw_api=debug,htw_events=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Store ---
    let store: Arc<dyn WorkflowStore> = match &config.database_url {
        Some(database_url) => {
            let pool = htw_db::create_pool(database_url)
                .await
                .expect("Failed to connect to database");
            tracing::info!("Database connection pool created");

            htw_db::health_check(&pool)
                .await
                .expect("Database health check failed");
            tracing::info!("Database health check passed");

            htw_db::run_migrations(&pool)
                .await
                .expect("Failed to run database migrations");
            tracing::info!("Database migrations applied");

            Arc::new(PgStore::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using the in-memory store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    // Audit trail: every bus event becomes a hash-chained audit row.
    let persistence_handle = tokio::spawn(AuditPersistence::run(
        Arc::clone(&store),
        event_bus.subscribe(),
        config.store_timeout(),
        cancel.clone(),
    ));

    // Host notifications over SMTP when configured.
    let sender = EmailConfig::from_env()
        .map(|cfg| Arc::new(EmailDelivery::new(cfg)) as Arc<dyn NoticeSender>);
    let notifier =
        HostNotifier::new(Arc::clone(&store), sender).with_store_timeout(config.store_timeout());
    let notifier_handle = tokio::spawn(notifier.run(event_bus.subscribe(), cancel.clone()));

    tracing::info!("Event services started (audit persistence, host notifier)");

    // --- App state ---
    let shutdown_timeout = config.shutdown_timeout();
    let sweep_interval = config.completion_sweep_interval();
    let state = AppState::new(store, config.clone(), Arc::clone(&event_bus));

    // --- Completion sweep ---
    let sweep_handle = tokio::spawn(background::completion::run(
        Arc::clone(&state.engine),
        sweep_interval,
        cancel.clone(),
    ));

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let _ = tokio::time::timeout(shutdown_timeout, sweep_handle).await;
    tracing::info!("Completion sweep stopped");

    drop(event_bus);
    let _ = tokio::time::timeout(shutdown_timeout, persistence_handle).await;
    let _ = tokio::time::timeout(shutdown_timeout, notifier_handle).await;
    tracing::info!("Event services shut down");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
