//! Registry statistics.
//!
//! Counters for the operations the registry issues against its backends.
//!
//! # Usage
//!
//! ```rust,ignore
//! let registry = Registry::new(Connection::new(InMemoryBackend::new()));
//!
//! // Perform operations...
//!
//! let stats = registry.stats().snapshot();
//! println!("Allocations: {}", stats.allocations);
//! println!("Conflicts: {}", stats.conflicts);
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry statistics.
///
/// All counters are atomic and can be read while operations are in progress.
/// Values are monotonically increasing.
#[derive(Debug, Default)]
pub struct RegistryStats {
    /// Identifiers allocated.
    allocations: AtomicU64,
    /// Property values read from a backend.
    reads: AtomicU64,
    /// Property values written to a backend.
    writes: AtomicU64,
    /// Uniqueness entries claimed.
    claims: AtomicU64,
    /// Uniqueness entries released.
    releases: AtomicU64,
    /// Writes rejected with `NotUnique`.
    conflicts: AtomicU64,
    /// `find`, `find_by_property` and `all_of` calls.
    lookups: AtomicU64,
    /// Records destroyed.
    destroys: AtomicU64,
}

impl RegistryStats {
    /// Creates a new stats instance.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_allocation(&self) {
        self.allocations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_claim(&self) {
        self.claims.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup(&self) {
        self.lookups.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_destroy(&self) {
        self.destroys.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of identifiers allocated.
    pub fn allocations(&self) -> u64 {
        self.allocations.load(Ordering::Relaxed)
    }

    /// Returns the number of property reads that reached a backend.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Returns the number of property writes.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Returns the number of uniqueness claims made.
    pub fn claims(&self) -> u64 {
        self.claims.load(Ordering::Relaxed)
    }

    /// Returns the number of uniqueness claims released.
    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }

    /// Returns the number of writes rejected as not unique.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Returns the number of lookups.
    pub fn lookups(&self) -> u64 {
        self.lookups.load(Ordering::Relaxed)
    }

    /// Returns the number of records destroyed.
    pub fn destroys(&self) -> u64 {
        self.destroys.load(Ordering::Relaxed)
    }

    /// Returns a snapshot of all stats.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            allocations: self.allocations(),
            reads: self.reads(),
            writes: self.writes(),
            claims: self.claims(),
            releases: self.releases(),
            conflicts: self.conflicts(),
            lookups: self.lookups(),
            destroys: self.destroys(),
        }
    }
}

/// A point-in-time snapshot of registry statistics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    /// Identifiers allocated.
    pub allocations: u64,
    /// Property reads that reached a backend.
    pub reads: u64,
    /// Property writes.
    pub writes: u64,
    /// Uniqueness claims made.
    pub claims: u64,
    /// Uniqueness claims released.
    pub releases: u64,
    /// Writes rejected as not unique.
    pub conflicts: u64,
    /// Lookups.
    pub lookups: u64,
    /// Records destroyed.
    pub destroys: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stats_are_zero() {
        let stats = RegistryStats::new();
        assert_eq!(stats.snapshot(), StatsSnapshot::default());
    }

    #[test]
    fn record_operations() {
        let stats = RegistryStats::new();

        stats.record_allocation();
        stats.record_read();
        stats.record_read();
        stats.record_write();
        stats.record_claim();
        stats.record_conflict();

        let snap = stats.snapshot();
        assert_eq!(snap.allocations, 1);
        assert_eq!(snap.reads, 2);
        assert_eq!(snap.writes, 1);
        assert_eq!(snap.claims, 1);
        assert_eq!(snap.conflicts, 1);
        assert_eq!(snap.destroys, 0);
    }

    #[test]
    fn concurrent_updates() {
        use std::sync::Arc;
        use std::thread;

        let stats = Arc::new(RegistryStats::new());
        let handles: Vec<_> = (0..10)
            .map(|_| {
                let s = Arc::clone(&stats);
                thread::spawn(move || {
                    for _ in 0..100 {
                        s.record_allocation();
                        s.record_lookup();
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(stats.allocations(), 1000);
        assert_eq!(stats.lookups(), 1000);
    }
}
