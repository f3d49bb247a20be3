use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;

use fleetdesk::config::AppConfig;
use fleetdesk::db;
use fleetdesk::handlers;
use fleetdesk::services::identity;
use fleetdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;
    if config.seed_database {
        db::seed::seed_fleet(&conn)?;
    }

    tracing::info!(
        auto_confirm = config.booking_auto_confirm,
        mutation_policy = ?config.mutation_policy,
        "booking policy loaded"
    );

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        identity: identity::from_config(&config),
        config: config.clone(),
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
