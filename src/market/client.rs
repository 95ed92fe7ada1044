use super::provider::DailyBarSource;
use super::types::{DailySeriesResponse, PriceSeries};
use crate::errors::FetchError;
use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Alpha Vantage REST client for `TIME_SERIES_DAILY`. Returns Result, never panics.
#[derive(Clone)]
pub struct AlphaVantageClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .pool_max_idle_per_host(4)
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Compact daily series (latest ~100 sessions) for `symbol`.
    pub async fn get_daily_series(&self, symbol: &str) -> Result<PriceSeries, FetchError> {
        let url = format!("{}/query", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited(format!("HTTP {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::Network(format!("HTTP {status}: {}", truncate(&body, 200))));
        }

        let body = resp.text().await?;
        let parsed: DailySeriesResponse = serde_json::from_str(&body)?;
        parsed.into_series(symbol, chrono::Utc::now())
    }
}

impl DailyBarSource for AlphaVantageClient {
    fn name(&self) -> &'static str {
        "alphavantage"
    }

    fn fetch_daily<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Result<PriceSeries, FetchError>> {
        self.get_daily_series(symbol).boxed()
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let c = AlphaVantageClient::new("https://www.alphavantage.co/", "demo", Duration::from_secs(1));
        assert_eq!(c.base_url, "https://www.alphavantage.co");
    }

    #[test]
    fn test_truncate_on_char_boundary() {
        assert_eq!(truncate("abcdef", 3), "abc");
        assert_eq!(truncate("ab", 3), "ab");
        assert_eq!(truncate("é€ab", 2), "é€");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        // Port 9 (discard) on loopback refuses connections
        let c = AlphaVantageClient::new("http://127.0.0.1:9", "demo", Duration::from_secs(1));
        let err = c.get_daily_series("AAPL").await;
        assert!(matches!(err, Err(FetchError::Network(_))), "{err:?}");
    }
}
