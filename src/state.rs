use crate::config::AppConfig;
use crate::market::provider::{PriceHistoryProvider, ProviderStats};
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Performance Counters (lock-free) ──

#[derive(Default)]
pub struct PerfCounters {
    pub curves_computed: AtomicU64,
    pub points_evaluated: AtomicU64,
    pub schemas_served: AtomicU64,
    pub histories_served: AtomicU64,
    pub requests_rejected: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CounterSnapshot {
    pub curves_computed: u64,
    pub points_evaluated: u64,
    pub schemas_served: u64,
    pub histories_served: u64,
    pub requests_rejected: u64,
    pub provider: ProviderStats,
    pub cached_symbols: usize,
}

impl PerfCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

// ── Application shared state ──

pub struct AppState {
    pub config: AppConfig,
    pub provider: PriceHistoryProvider,
    pub counters: PerfCounters,
}

impl AppState {
    pub fn new(config: AppConfig, provider: PriceHistoryProvider) -> Arc<Self> {
        Arc::new(Self {
            config,
            provider,
            counters: PerfCounters::new(),
        })
    }

    pub fn snapshot_counters(&self) -> CounterSnapshot {
        let c = &self.counters;
        CounterSnapshot {
            curves_computed: c.curves_computed.load(Ordering::Relaxed),
            points_evaluated: c.points_evaluated.load(Ordering::Relaxed),
            schemas_served: c.schemas_served.load(Ordering::Relaxed),
            histories_served: c.histories_served.load(Ordering::Relaxed),
            requests_rejected: c.requests_rejected.load(Ordering::Relaxed),
            provider: self.provider.counters.snapshot(),
            cached_symbols: self.provider.cache().len(),
        }
    }
}
