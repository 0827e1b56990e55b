//! Resolution counters.
//!
//! The resolver never reports remote failures to its callers. These counters
//! are the side channel that makes them visible.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolver counters (thread-safe, cheap to clone).
#[derive(Debug, Clone, Default)]
pub struct ResolverMetrics {
    /// Requests answered by the remote tier
    pub remote_hits: Arc<AtomicU64>,
    /// Candidates the remote tier reported absent
    pub remote_misses: Arc<AtomicU64>,
    /// Candidates whose remote lookup failed and was absorbed
    pub remote_errors: Arc<AtomicU64>,
    /// Keys that produced no candidates at all
    pub malformed_keys: Arc<AtomicU64>,
    /// Requests delegated to the local tier
    pub local_fallbacks: Arc<AtomicU64>,
}

impl ResolverMetrics {
    pub fn record_remote_hit(&self) {
        self.remote_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_miss(&self) {
        self.remote_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_malformed_key(&self) {
        self.malformed_keys.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_local_fallback(&self) {
        self.local_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            remote_misses: self.remote_misses.load(Ordering::Relaxed),
            remote_errors: self.remote_errors.load(Ordering::Relaxed),
            malformed_keys: self.malformed_keys.load(Ordering::Relaxed),
            local_fallbacks: self.local_fallbacks.load(Ordering::Relaxed),
        }
    }
}

/// Serializable counter values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub remote_hits: u64,
    pub remote_misses: u64,
    pub remote_errors: u64,
    pub malformed_keys: u64,
    pub local_fallbacks: u64,
}

impl MetricsSnapshot {
    /// Fraction of requests served remotely, or `None` before any request.
    pub fn remote_hit_rate(&self) -> Option<f64> {
        let total = self.remote_hits + self.local_fallbacks;
        (total > 0).then(|| self.remote_hits as f64 / total as f64)
    }
}
