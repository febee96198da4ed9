use std::sync::Arc;

use price_history_backend::{
    build_router, config::Config, services::tick_store::TickSettings, AppState, LISTEN_ADDR,
};
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,price_history_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    if let Err(e) = run().await {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    tracing::info!(db = %config.db_name, table = %config.ts_table, symbol = %config.symbol, "Connecting to database...");
    let db = Database::connect(config.connection_url()).await?;

    let state = AppState {
        db: Arc::new(db),
        ticks: TickSettings::from(&config),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(LISTEN_ADDR).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
