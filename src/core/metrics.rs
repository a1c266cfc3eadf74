use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

#[derive(Debug)]
pub struct MarketplaceMetrics {
    clock_ticks: AtomicU64,
    market_transitions: AtomicU64,
    notifications_sent: AtomicU64,
    filter_runs: AtomicU64,
    start_time: Instant,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub clock_ticks: u64,
    pub market_transitions: u64,
    pub notifications_sent: u64,
    pub filter_runs: u64,
    pub uptime_secs: u64,
}

impl MarketplaceMetrics {
    pub fn new() -> Self {
        Self {
            clock_ticks: AtomicU64::new(0),
            market_transitions: AtomicU64::new(0),
            notifications_sent: AtomicU64::new(0),
            filter_runs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn increment_clock_ticks(&self) {
        self.clock_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_transitions(&self) {
        self.market_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_notifications(&self) {
        self.notifications_sent.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_filter_runs(&self) {
        self.filter_runs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_clock_ticks(&self) -> u64 {
        self.clock_ticks.load(Ordering::Relaxed)
    }

    pub fn get_transitions(&self) -> u64 {
        self.market_transitions.load(Ordering::Relaxed)
    }

    pub fn get_notifications(&self) -> u64 {
        self.notifications_sent.load(Ordering::Relaxed)
    }

    pub fn get_filter_runs(&self) -> u64 {
        self.filter_runs.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            clock_ticks: self.get_clock_ticks(),
            market_transitions: self.get_transitions(),
            notifications_sent: self.get_notifications(),
            filter_runs: self.get_filter_runs(),
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for MarketplaceMetrics {
    fn default() -> Self {
        Self::new()
    }
}
