use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mortgage_intake::autosave::DraftStore;
use mortgage_intake::clock::{Clock, SystemClock};
use mortgage_intake::config::Config;
use mortgage_intake::handlers::{self, AppState};
use mortgage_intake::repository::ApplicationRepository;
use mortgage_intake::storage::{FileStore, KeyValueStore};

/// Main entry point for the application.
///
/// Initializes logging, loads configuration, opens the file-backed store and
/// serves the intake and review API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mortgage_intake=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Open storage
    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.storage_dir)?);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    tracing::info!("Storage ready at {}", config.storage_dir.display());

    let applications = ApplicationRepository::new(store.clone(), clock.clone())
        .with_default_interest_rate(config.default_interest_rate.clone());
    let stats = applications.stats();
    tracing::info!(
        "Loaded {} application(s): {} pending, {} approved, {} rejected",
        stats.total,
        stats.pending,
        stats.approved,
        stats.rejected
    );

    // Build application state
    let app_state = Arc::new(AppState {
        applications,
        drafts: DraftStore::new(store, clock),
    });

    let app = handlers::router(app_state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
