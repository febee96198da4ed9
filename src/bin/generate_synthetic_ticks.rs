// src/bin/generate_synthetic_ticks.rs
//
// Rebuilds the synthetic daily history for the configured symbol.
// Usage: cargo run --bin generate_synthetic_ticks

use price_history_backend::config::Config;
use price_history_backend::services::synthetic::{generate_records, GeneratorConfig};
use price_history_backend::services::tick_store::{ensure_tick_table, replace_symbol_ticks};
use sea_orm::Database;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,price_history_backend=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let generator = GeneratorConfig::default();

    println!(
        "Generating {} ticks from {} to {} (seed {})...",
        config.symbol, generator.start, generator.end, generator.seed
    );
    let records = generate_records(&generator, &config.symbol)?;
    println!("Built {} records", records.len());

    let db = Database::connect(config.connection_url()).await?;
    ensure_tick_table(&db, &config.ts_table).await?;

    let summary = replace_symbol_ticks(&db, &config.ts_table, &config.symbol, &records).await?;
    db.close().await?;

    println!(
        "Inserted {} rows for {} into {} ({} batches, {} previous rows removed)",
        summary.inserted, config.symbol, config.ts_table, summary.batches, summary.deleted
    );

    Ok(())
}
