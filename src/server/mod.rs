pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};

/// JSON API under `/api`, with the dashboard build served for everything else.
pub fn router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.static_dir.clone();
    let index = static_dir.join("index.html");

    Router::new()
        .route("/api/health", get(routes::health))
        .route("/api/symbols", get(routes::get_symbols))
        .route("/api/strategies", get(routes::list_strategies))
        .route("/api/strategies/{kind}", get(routes::get_strategy))
        .route("/api/history/{symbol}", get(routes::get_history))
        .route("/api/payoff", post(routes::compute_payoff))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(ServeDir::new(static_dir).fallback(ServeFile::new(index)))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
