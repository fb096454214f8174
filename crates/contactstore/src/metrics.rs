//! Counters for the aggregate cache layer.
//!
//! A [`StoreMetrics`] handle is created by the embedding process and injected
//! into the coordinator, so several stores can share one set of counters or
//! keep their own.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Shared, lock-free counters updated by the coordinator.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    hits: AtomicU64,
    misses: AtomicU64,
    cache_errors: AtomicU64,
    partial_assemblies: AtomicU64,
    refreshes: AtomicU64,
}

/// A point-in-time copy of [`StoreMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    /// Reads answered from the cache.
    pub hits: u64,
    /// Reads that had to assemble from the relational store.
    pub misses: u64,
    /// Cache operations that failed and were ignored.
    pub cache_errors: u64,
    /// Assemblies where at least one child collection failed to load.
    pub partial_assemblies: u64,
    /// Cache entries overwritten after a successful write.
    pub refreshes: u64,
}

impl MetricsSnapshot {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_error(&self) {
        self.cache_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_partial_assembly(&self) {
        self.partial_assemblies.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh(&self) {
        self.refreshes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            cache_errors: self.cache_errors.load(Ordering::Relaxed),
            partial_assemblies: self.partial_assemblies.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
        }
    }
}
