//! Process-scoped counters backing the `debug` operation's snapshot (§4.13).

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing counters, created once per [`crate::ServiceFacade`]
/// and shared via `Arc`.
#[derive(Debug, Default)]
pub struct Metrics {
    nodes_stored: AtomicU64,
    hard_edges_inferred: AtomicU64,
    soft_edges_inferred: AtomicU64,
    guard_failures: AtomicU64,
    skips: AtomicU64,
    plans_composed: AtomicU64,
    recoveries: AtomicU64,
}

/// A point-in-time read of every counter.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Nodes stored via `store_node`.
    pub nodes_stored: u64,
    /// `hard_requires` edges committed by the edge engine.
    pub hard_edges_inferred: u64,
    /// `soft_semantic` edges committed by the edge engine.
    pub soft_edges_inferred: u64,
    /// Guard evaluations that returned `fail`.
    pub guard_failures: u64,
    /// Guard evaluations that returned `skip`.
    pub skips: u64,
    /// Plans composed by `compose_plan`.
    pub plans_composed: u64,
    /// Journal recoveries performed.
    pub recoveries: u64,
}

impl Metrics {
    /// All counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` nodes stored.
    pub fn record_nodes_stored(&self, count: u64) {
        self.nodes_stored.fetch_add(count, Ordering::Relaxed);
    }

    /// Record hard/soft edges inferred in one pass.
    pub fn record_edges_inferred(&self, hard: u64, soft: u64) {
        self.hard_edges_inferred.fetch_add(hard, Ordering::Relaxed);
        self.soft_edges_inferred.fetch_add(soft, Ordering::Relaxed);
    }

    /// Record one guard failure.
    pub fn record_guard_failure(&self) {
        self.guard_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one guard-driven skip.
    pub fn record_skip(&self) {
        self.skips.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one plan composed.
    pub fn record_plan_composed(&self) {
        self.plans_composed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one journal recovery.
    pub fn record_recovery(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every counter.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            nodes_stored: self.nodes_stored.load(Ordering::Relaxed),
            hard_edges_inferred: self.hard_edges_inferred.load(Ordering::Relaxed),
            soft_edges_inferred: self.soft_edges_inferred.load(Ordering::Relaxed),
            guard_failures: self.guard_failures.load(Ordering::Relaxed),
            skips: self.skips.load(Ordering::Relaxed),
            plans_composed: self.plans_composed.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn counters_start_at_zero() {
        let metrics = Metrics::new();
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.nodes_stored, 0);
        assert_eq!(snapshot.recoveries, 0);
    }

    #[test]
    fn recording_updates_the_snapshot() {
        let metrics = Metrics::new();
        metrics.record_nodes_stored(3);
        metrics.record_edges_inferred(2, 4);
        metrics.record_guard_failure();
        metrics.record_skip();
        metrics.record_plan_composed();
        metrics.record_recovery();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.nodes_stored, 3);
        assert_eq!(snapshot.hard_edges_inferred, 2);
        assert_eq!(snapshot.soft_edges_inferred, 4);
        assert_eq!(snapshot.guard_failures, 1);
        assert_eq!(snapshot.skips, 1);
        assert_eq!(snapshot.plans_composed, 1);
        assert_eq!(snapshot.recoveries, 1);
    }
}
