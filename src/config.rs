use crate::errors::{AppError, AppResult};
use std::path::PathBuf;

const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,GOOGL,AMZN,SPY,QQQ,DIA,META,NFLX,NVDA,TSLA,AMD";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub alpha_vantage_api_key: String,
    pub alpha_vantage_base_url: String,
    pub price_cache_ttl_secs: u64,
    pub fetch_timeout_secs: u64,
    pub fetch_max_attempts: u32,
    pub symbols: Vec<String>,
    pub curve_points: usize,
    pub server_port: u16,
    pub static_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        dotenvy::dotenv().ok();

        let price_cache_ttl_secs = env_var_or("PRICE_CACHE_TTL_SECS", "300")
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("PRICE_CACHE_TTL_SECS: {e}")))?;

        let fetch_timeout_secs = env_var_or("FETCH_TIMEOUT_SECS", "10")
            .parse::<u64>()
            .map_err(|e| AppError::Config(format!("FETCH_TIMEOUT_SECS: {e}")))?;

        let fetch_max_attempts = env_var_or("FETCH_MAX_ATTEMPTS", "3")
            .parse::<u32>()
            .map_err(|e| AppError::Config(format!("FETCH_MAX_ATTEMPTS: {e}")))?;
        if fetch_max_attempts == 0 {
            return Err(AppError::Config("FETCH_MAX_ATTEMPTS: must be at least 1".into()));
        }

        let curve_points = env_var_or("CURVE_POINTS", "201")
            .parse::<usize>()
            .map_err(|e| AppError::Config(format!("CURVE_POINTS: {e}")))?;
        if curve_points < 2 {
            return Err(AppError::Config("CURVE_POINTS: must be at least 2".into()));
        }

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("SERVER_PORT: {e}")))?;

        let symbols = parse_symbols(&env_var_or("SYMBOLS", DEFAULT_SYMBOLS));
        if symbols.is_empty() {
            return Err(AppError::Config("SYMBOLS: no symbols configured".into()));
        }

        Ok(Self {
            alpha_vantage_api_key: env_var("ALPHA_VANTAGE_API_KEY")?,
            alpha_vantage_base_url: env_var_or(
                "ALPHA_VANTAGE_BASE_URL",
                "https://www.alphavantage.co",
            ),
            price_cache_ttl_secs,
            fetch_timeout_secs,
            fetch_max_attempts,
            symbols,
            curve_points,
            server_port,
            static_dir: PathBuf::from(env_var_or("STATIC_DIR", "dashboard/dist")),
        })
    }
}

/// Comma-separated list, trimmed and upper-cased, empties dropped.
fn parse_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_var(key: &str) -> AppResult<String> {
    std::env::var(key).map_err(|_| AppError::Config(format!("missing env var: {key}")))
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
impl AppConfig {
    pub fn for_tests() -> Self {
        Self {
            alpha_vantage_api_key: "demo".into(),
            alpha_vantage_base_url: "http://127.0.0.1:9".into(),
            price_cache_ttl_secs: 300,
            fetch_timeout_secs: 1,
            fetch_max_attempts: 1,
            symbols: parse_symbols(DEFAULT_SYMBOLS),
            curve_points: 21,
            server_port: 0,
            static_dir: PathBuf::from("dashboard/dist"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols_normalizes() {
        assert_eq!(parse_symbols(" aapl, msft ,,spy "), vec!["AAPL", "MSFT", "SPY"]);
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_default_symbol_list() {
        let symbols = parse_symbols(DEFAULT_SYMBOLS);
        assert_eq!(symbols.len(), 12);
        assert_eq!(symbols.first().map(String::as_str), Some("AAPL"));
        assert_eq!(symbols.last().map(String::as_str), Some("AMD"));
    }
}
