use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use printsuit_db::{JobStore, PgJobStore};
use printsuit_events::{
    ChangeFeedListener, CompletionReconciler, DeliveryGateway, EmailConfig, NotifierConfig,
    SmtpGateway, SweepScheduler,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use printsuit_api::config::ServerConfig;
use printsuit_api::router::build_app_router;
use printsuit_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "printsuit_api=debug,printsuit_events=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    let notifier_config = NotifierConfig::from_env();
    tracing::info!(
        completion_status = %notifier_config.completion_status,
        sweep_interval_secs = notifier_config.sweep_interval.as_secs(),
        change_feed_enabled = notifier_config.change_feed_enabled,
        "Loaded notifier configuration"
    );

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = printsuit_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    printsuit_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    let email_config = EmailConfig::from_env().expect("SMTP_HOST must be set");
    let gateway: Arc<dyn DeliveryGateway> =
        Arc::new(SmtpGateway::new(&email_config).expect("Failed to build SMTP transport"));
    tracing::info!(smtp_host = %email_config.smtp_host, "SMTP gateway configured");

    let store: Arc<dyn JobStore> = Arc::new(PgJobStore::new(pool));
    let reconciler = Arc::new(CompletionReconciler::new(
        Arc::clone(&store),
        gateway,
        &notifier_config,
    ));

    let cancel = CancellationToken::new();

    let sweep = SweepScheduler::new(Arc::clone(&reconciler), notifier_config.sweep_interval);
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        sweep.run(sweep_cancel).await;
    });

    let listener_handle = notifier_config.change_feed_enabled.then(|| {
        let listener = ChangeFeedListener::new(
            Arc::clone(&reconciler),
            notifier_config.change_feed_concurrency,
        );
        let listener_cancel = cancel.clone();
        tokio::spawn(async move {
            listener.run(listener_cancel).await;
        })
    });

    tracing::info!(
        change_feed = listener_handle.is_some(),
        "Notification services started"
    );

    let state = AppState { store, reconciler };
    let app = build_app_router(state, &config);

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

    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let grace = Duration::from_secs(config.shutdown_timeout_secs);
    let _ = tokio::time::timeout(grace, sweep_handle).await;
    tracing::info!("Completion sweep stopped");

    if let Some(handle) = listener_handle {
        let _ = tokio::time::timeout(grace, handle).await;
        tracing::info!("Change feed listener stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

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
