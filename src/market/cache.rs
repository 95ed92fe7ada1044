use super::types::PriceSeries;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct CacheEntry {
    stored_at: Instant,
    series: Arc<PriceSeries>,
}

/// Symbol -> most recent successfully fetched series, with an explicit
/// time-to-live. The lock is never held across an await.
pub struct PriceCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl PriceCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fresh entry for `symbol` as of `now`, if any. Expired entries are
    /// removed on the way out.
    pub fn get_at(&self, symbol: &str, now: Instant) -> Option<Arc<PriceSeries>> {
        let mut entries = self.lock();
        let fresh = entries
            .get(symbol)
            .map(|e| now.saturating_duration_since(e.stored_at) < self.ttl)?;
        if fresh {
            entries.get(symbol).map(|e| Arc::clone(&e.series))
        } else {
            entries.remove(symbol);
            None
        }
    }

    pub fn get(&self, symbol: &str) -> Option<Arc<PriceSeries>> {
        self.get_at(symbol, Instant::now())
    }

    pub fn insert_at(&self, symbol: &str, series: Arc<PriceSeries>, now: Instant) {
        self.lock().insert(
            symbol.to_string(),
            CacheEntry {
                stored_at: now,
                series,
            },
        );
    }

    pub fn insert(&self, symbol: &str, series: Arc<PriceSeries>) {
        self.insert_at(symbol, series, Instant::now());
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn evict_expired_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, e| now.saturating_duration_since(e.stored_at) < self.ttl);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// A poisoned lock only means another thread panicked mid-insert;
    /// the map itself is still usable.
    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn series(symbol: &str) -> Arc<PriceSeries> {
        Arc::new(PriceSeries::new(symbol, Vec::new(), Utc::now()))
    }

    #[test]
    fn test_hit_within_ttl() {
        let cache = PriceCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.insert_at("AAPL", series("AAPL"), t0);
        let hit = cache.get_at("AAPL", t0 + Duration::from_secs(299));
        assert_eq!(hit.map(|s| s.symbol.clone()), Some("AAPL".to_string()));
    }

    #[test]
    fn test_miss_after_ttl_and_entry_removed() {
        let cache = PriceCache::new(Duration::from_secs(300));
        let t0 = Instant::now();
        cache.insert_at("AAPL", series("AAPL"), t0);
        assert!(cache.get_at("AAPL", t0 + Duration::from_secs(300)).is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_keys_are_independent() {
        let cache = PriceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("AAPL", series("AAPL"), t0);
        assert!(cache.get_at("MSFT", t0).is_none());
        assert!(cache.get_at("AAPL", t0).is_some());
    }

    #[test]
    fn test_reinsert_refreshes_timestamp() {
        let cache = PriceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("SPY", series("SPY"), t0);
        cache.insert_at("SPY", series("SPY"), t0 + Duration::from_secs(50));
        assert!(cache.get_at("SPY", t0 + Duration::from_secs(100)).is_some());
    }

    #[test]
    fn test_evict_expired() {
        let cache = PriceCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at("OLD", series("OLD"), t0);
        cache.insert_at("NEW", series("NEW"), t0 + Duration::from_secs(45));
        assert_eq!(cache.evict_expired_at(t0 + Duration::from_secs(90)), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get_at("NEW", t0 + Duration::from_secs(90)).is_some());
    }
}
