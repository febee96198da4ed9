// src/lib.rs

use std::sync::Arc;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use services::tick_store::TickSettings;
use tower_http::{cors::CorsLayer, services::ServeFile, trace::TraceLayer};

/// Landing page served at `/`, relative to the service root.
pub const INDEX_FILE: &str = "index.html";

/// Address the query service listens on.
pub const LISTEN_ADDR: &str = "0.0.0.0:5001";

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub ticks: TickSettings,
}

pub mod config;

pub mod models {
    pub mod tick;
}

pub mod services {
    pub mod synthetic;
    pub mod tick_store;
}

pub mod handlers {
    pub mod ticks;
}

/// Routes for the query service. Any origin may call the API.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route_service("/", ServeFile::new(INDEX_FILE))
        .route("/api/ko", get(handlers::ticks::get_default_ticks))
        .route("/api/ticks/{symbol}", get(handlers::ticks::get_symbol_ticks))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
