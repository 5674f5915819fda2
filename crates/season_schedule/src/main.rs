use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use season_schedule::db::SessionDbManager;
use season_schedule::schedule::OccurrenceGenerator;
use season_schedule::server::create_router;
use season_schedule::settings::Settings;
use season_schedule::types::ScheduleState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::from_env().context("Failed to load settings")?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.rust_log));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(env_filter)
        .init();

    let schedule_db = SessionDbManager::new(&settings.database.path)
        .with_context(|| format!("Failed to open session database {}", settings.database.path))?;
    let generator = OccurrenceGenerator::new(settings.schedule.clone())
        .context("Invalid [schedule] settings")?;

    info!(
        db_path = %settings.database.path,
        max_occurrences = settings.schedule.max_occurrences,
        strict_weekdays = settings.schedule.strict_weekdays,
        "Session store ready"
    );

    let state = Arc::new(ScheduleState::new(schedule_db, generator));
    let app = create_router(state);

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
