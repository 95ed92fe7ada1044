mod config;
mod errors;
mod market;
mod payoff;
mod server;
mod state;
mod strategy;

use crate::market::PriceHistoryProvider;
use crate::state::AppState;
use std::time::Duration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("payoff_rusty starting");

    let cfg = match config::AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("config error: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        base_url = %cfg.alpha_vantage_base_url,
        symbols = cfg.symbols.len(),
        cache_ttl_secs = cfg.price_cache_ttl_secs,
        fetch_attempts = cfg.fetch_max_attempts,
        "configuration loaded"
    );

    let provider = PriceHistoryProvider::from_config(&cfg);
    let app_state = AppState::new(cfg.clone(), provider);

    // Sweep expired price entries so symbols nobody asks for again do not linger
    let sweep_state = app_state.clone();
    let sweep_every = Duration::from_secs(cfg.price_cache_ttl_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            let evicted = sweep_state.provider.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, "price cache swept");
            }
        }
    });

    let app = server::router(app_state);

    let addr = format!("0.0.0.0:{}", cfg.server_port);
    tracing::info!("server listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("bind error: {e}");
            std::process::exit(1);
        });

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {e}");
    }
}
