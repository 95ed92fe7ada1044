use super::cache::PriceCache;
use super::client::AlphaVantageClient;
use super::types::PriceSeries;
use crate::config::AppConfig;
use crate::errors::{AppError, AppResult, FetchError};
use futures_util::future::BoxFuture;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const MAX_SYMBOL_LEN: usize = 12;

/// Anything that can produce a daily series for a symbol. The Alpha Vantage
/// client is the production source; tests plug in scripted ones.
pub trait DailyBarSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn fetch_daily<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Result<PriceSeries, FetchError>>;
}

/// Exponential backoff for retryable fetch failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }

    /// Delay after the `attempt`-th failure (1-based): base, 2x base, 4x base, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

// ── Counters (lock-free) ──

#[derive(Default)]
pub struct ProviderCounters {
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub fetch_attempts: AtomicU64,
    pub fetch_retries: AtomicU64,
    pub fetch_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ProviderStats {
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub fetch_attempts: u64,
    pub fetch_retries: u64,
    pub fetch_failures: u64,
}

impl ProviderCounters {
    pub fn snapshot(&self) -> ProviderStats {
        ProviderStats {
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            fetch_attempts: self.fetch_attempts.load(Ordering::Relaxed),
            fetch_retries: self.fetch_retries.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}

// ── Provider ──

/// Cached, retrying front for a [`DailyBarSource`]. Only successful fetches
/// are cached.
pub struct PriceHistoryProvider {
    source: Arc<dyn DailyBarSource>,
    cache: PriceCache,
    retry: RetryPolicy,
    pub counters: ProviderCounters,
}

impl PriceHistoryProvider {
    pub fn new(source: Arc<dyn DailyBarSource>, ttl: Duration, retry: RetryPolicy) -> Self {
        Self {
            source,
            cache: PriceCache::new(ttl),
            retry,
            counters: ProviderCounters::default(),
        }
    }

    /// Alpha Vantage backed provider with the configured timeout, TTL and
    /// attempt count.
    pub fn from_config(config: &AppConfig) -> Self {
        let client = AlphaVantageClient::new(
            &config.alpha_vantage_base_url,
            &config.alpha_vantage_api_key,
            Duration::from_secs(config.fetch_timeout_secs),
        );
        Self::new(
            Arc::new(client),
            Duration::from_secs(config.price_cache_ttl_secs),
            RetryPolicy::new(config.fetch_max_attempts),
        )
    }

    #[inline]
    pub fn cache(&self) -> &PriceCache {
        &self.cache
    }

    #[inline]
    pub fn source_name(&self) -> &'static str {
        self.source.name()
    }

    /// Daily series for `symbol`, served from cache while fresh.
    pub async fn daily_series(&self, symbol: &str) -> AppResult<Arc<PriceSeries>> {
        let symbol = normalize_symbol(symbol)?;

        if let Some(hit) = self.cache.get(&symbol) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(symbol = %symbol, bars = hit.bars.len(), "price cache hit");
            return Ok(hit);
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let series = match self.fetch_with_retry(&symbol).await {
            Ok(s) => Arc::new(s),
            Err(e) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(symbol = %symbol, source = self.source.name(), error = %e, "price fetch failed");
                return Err(e.into());
            }
        };

        tracing::info!(
            symbol = %symbol,
            source = self.source.name(),
            bars = series.bars.len(),
            last_close = ?series.last_close(),
            "price history fetched"
        );
        self.cache.insert(&symbol, Arc::clone(&series));
        Ok(series)
    }

    /// Closing prices, oldest first.
    pub async fn daily_closes(&self, symbol: &str) -> AppResult<Vec<f64>> {
        Ok(self.daily_series(symbol).await?.closes())
    }

    pub async fn last_close(&self, symbol: &str) -> AppResult<Option<f64>> {
        Ok(self.daily_series(symbol).await?.last_close())
    }

    pub fn evict_expired(&self) -> usize {
        self.cache.evict_expired_at(std::time::Instant::now())
    }

    async fn fetch_with_retry(&self, symbol: &str) -> Result<PriceSeries, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            self.counters.fetch_attempts.fetch_add(1, Ordering::Relaxed);
            match self.source.fetch_daily(symbol).await {
                Ok(series) => return Ok(series),
                Err(e) if e.is_retryable() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.delay_for(attempt);
                    self.counters.fetch_retries.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        symbol = %symbol,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "price fetch failed, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Trim and upper-case a ticker; rejects anything that is not a plausible
/// exchange symbol (letters, digits, `.` and `-`).
pub fn normalize_symbol(raw: &str) -> AppResult<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-');
    if valid {
        Ok(symbol)
    } else {
        Err(AppError::InvalidSymbol(raw.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::market::types::DailyBar;
    use chrono::{NaiveDate, Utc};
    use futures_util::FutureExt;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    pub(crate) fn series(symbol: &str, closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| DailyBar {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c,
                low: c,
                close: c,
            })
            .collect();
        PriceSeries::new(symbol, bars, Utc::now())
    }

    /// Replays scripted results, then succeeds with a fixed series.
    #[derive(Default)]
    pub(crate) struct ScriptedSource {
        pub calls: AtomicUsize,
        pub script: Mutex<VecDeque<Result<PriceSeries, FetchError>>>,
    }

    impl ScriptedSource {
        pub(crate) fn with(script: Vec<Result<PriceSeries, FetchError>>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                script: Mutex::new(script.into()),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(std::sync::atomic::Ordering::SeqCst)
        }
    }

    impl DailyBarSource for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn fetch_daily<'a>(&'a self, symbol: &'a str) -> BoxFuture<'a, Result<PriceSeries, FetchError>> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(series(symbol, &[100.0, 101.0, 102.5])));
            futures_util::future::ready(next).boxed()
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn provider(source: Arc<ScriptedSource>, ttl: Duration, attempts: u32) -> PriceHistoryProvider {
        PriceHistoryProvider::new(source, ttl, fast_retry(attempts))
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let p = RetryPolicy::new(5);
        let delays: Vec<u64> = (1..=7).map(|a| p.delay_for(a).as_millis() as u64).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 8000, 8000]);
        assert_eq!(p.delay_for(40), Duration::from_secs(8));
    }

    #[test]
    fn test_zero_attempts_clamped_to_one() {
        assert_eq!(RetryPolicy::new(0).max_attempts, 1);
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol(" aapl ").unwrap(), "AAPL");
        assert_eq!(normalize_symbol("brk-b").unwrap(), "BRK-B");
        assert_eq!(normalize_symbol("TSCO.LON").unwrap(), "TSCO.LON");
        assert!(matches!(normalize_symbol(""), Err(AppError::InvalidSymbol(_))));
        assert!(matches!(normalize_symbol("AA PL"), Err(AppError::InvalidSymbol(_))));
        assert!(matches!(normalize_symbol("A&apikey=x"), Err(AppError::InvalidSymbol(_))));
        assert!(matches!(normalize_symbol("ABCDEFGHIJKLM"), Err(AppError::InvalidSymbol(_))));
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let source = ScriptedSource::with(vec![]);
        let p = provider(source.clone(), Duration::from_secs(300), 3);

        let a = p.daily_series("AAPL").await.unwrap();
        let b = p.daily_series("aapl").await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(source.calls(), 1);

        let stats = p.counters.snapshot();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_refetched() {
        let source = ScriptedSource::with(vec![]);
        let p = provider(source.clone(), Duration::ZERO, 3);
        p.daily_series("MSFT").await.unwrap();
        p.daily_series("MSFT").await.unwrap();
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_network_error_retried_then_succeeds() {
        let source = ScriptedSource::with(vec![
            Err(FetchError::Network("connection reset".into())),
            Err(FetchError::Network("timed out".into())),
        ]);
        let p = provider(source.clone(), Duration::from_secs(300), 3);
        let closes = p.daily_closes("SPY").await.unwrap();
        assert_eq!(closes, vec![100.0, 101.0, 102.5]);
        assert_eq!(source.calls(), 3);
        assert_eq!(p.counters.snapshot().fetch_retries, 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let source = ScriptedSource::with(vec![
            Err(FetchError::Network("1".into())),
            Err(FetchError::Network("2".into())),
            Err(FetchError::Network("3".into())),
        ]);
        let p = provider(source.clone(), Duration::from_secs(300), 2);
        let err = p.daily_series("SPY").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::Network(ref m)) if m == "2"));
        assert_eq!(source.calls(), 2);
        assert_eq!(p.counters.snapshot().fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_rate_limit_not_retried() {
        let source = ScriptedSource::with(vec![Err(FetchError::RateLimited("5 calls/min".into()))]);
        let p = provider(source.clone(), Duration::from_secs(300), 3);
        let err = p.daily_series("QQQ").await.unwrap_err();
        assert!(matches!(err, AppError::Fetch(FetchError::RateLimited(_))));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_failures_not_cached() {
        let source = ScriptedSource::with(vec![Err(FetchError::SymbolNotFound("ZZZZ".into()))]);
        let p = provider(source.clone(), Duration::from_secs(300), 3);
        assert!(p.daily_series("ZZZZ").await.is_err());
        assert!(p.daily_series("ZZZZ").await.is_ok());
        assert_eq!(source.calls(), 2);
        assert_eq!(p.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_symbol_never_reaches_source() {
        let source = ScriptedSource::with(vec![]);
        let p = provider(source.clone(), Duration::from_secs(300), 3);
        assert!(matches!(p.daily_series("  ").await, Err(AppError::InvalidSymbol(_))));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_last_close_is_most_recent_bar() {
        let source = ScriptedSource::with(vec![Ok(series("NVDA", &[120.0, 118.5, 125.25]))]);
        let p = provider(source, Duration::from_secs(300), 1);
        assert_eq!(p.last_close("NVDA").await.unwrap(), Some(125.25));
    }
}
