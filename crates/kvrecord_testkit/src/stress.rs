//! Stress helpers.
//!
//! These drive a model from many threads at once to check that id
//! allocation and uniqueness claims hold up under contention.

use kvrecord_core::{CoreError, Model, ModelId};
use std::collections::HashSet;
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent threads.
    pub threads: usize,
    /// Operations per thread.
    pub operations_per_thread: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            threads: 8,
            operations_per_thread: 100,
        }
    }
}

/// Allocates ids from every thread and returns them all.
///
/// Panics if an allocation fails.
pub fn stress_concurrent_allocation(
    model: &Model,
    config: &StressConfig,
) -> (Vec<ModelId>, StressTestResult) {
    let start = Instant::now();
    let handles: Vec<_> = (0..config.threads)
        .map(|_| {
            let model = model.clone();
            let ops = config.operations_per_thread;
            thread::spawn(move || {
                (0..ops)
                    .map(|_| model.new_record().id().expect("Allocation failed"))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = Vec::with_capacity(config.threads * config.operations_per_thread);
    for handle in handles {
        ids.extend(handle.join().expect("Allocation thread panicked"));
    }

    let result = StressTestResult::new(ids.len(), 0, start.elapsed());
    debug!(model = %model.name(), allocated = ids.len(), "allocation stress done");
    (ids, result)
}

/// Returns the ids that occur more than once.
pub fn duplicate_ids(ids: &[ModelId]) -> Vec<ModelId> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| !seen.insert(*id)).collect()
}

/// Has every thread try to claim the same set of values.
///
/// Each thread works on its own record and tries every value in turn.
/// Successful claims count as successes, `NotUnique` rejections as
/// failures; any other error panics.
pub fn stress_contended_claims(
    model: &Model,
    property: &str,
    values: &[String],
    threads: usize,
) -> StressTestResult {
    let start = Instant::now();
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let model = model.clone();
            let property = property.to_string();
            let values = values.to_vec();
            thread::spawn(move || {
                let mut ok = 0usize;
                let mut rejected = 0usize;
                for value in &values {
                    let mut record = model.new_record();
                    match record.set(&property, value) {
                        Ok(()) => ok += 1,
                        Err(CoreError::NotUnique { .. }) => rejected += 1,
                        Err(err) => panic!("unexpected error: {err}"),
                    }
                }
                (ok, rejected)
            })
        })
        .collect();

    let (mut successful, mut failed) = (0, 0);
    for handle in handles {
        let (ok, rejected) = handle.join().expect("Claim thread panicked");
        successful += ok;
        failed += rejected;
    }
    StressTestResult::new(successful, failed, start.elapsed())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_found() {
        let ids: Vec<_> = [1, 2, 2, 3, 1].into_iter().map(ModelId::new).collect();
        assert_eq!(duplicate_ids(&ids), vec![ModelId::new(2), ModelId::new(1)]);
    }

    #[test]
    fn result_rates() {
        let result = StressTestResult::new(10, 5, Duration::from_secs(1));
        assert_eq!(result.total_ops, 15);
        assert!((result.ops_per_second - 15.0).abs() < f64::EPSILON);
    }
}
