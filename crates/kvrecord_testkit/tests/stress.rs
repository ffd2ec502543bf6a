//! Concurrency tests against a shared in-memory backend.

use kvrecord_core::{CatalogKind, Config};
use kvrecord_testkit::prelude::*;
use std::collections::HashSet;

#[test]
fn concurrent_allocation_yields_distinct_ids() {
    init_tracing();
    let fx = TestRegistry::new();
    let users = fx.user_model();
    let config = StressConfig::default();

    let (ids, result) = stress_concurrent_allocation(&users, &config);

    assert_eq!(result.total_ops, config.threads * config.operations_per_thread);
    assert!(duplicate_ids(&ids).is_empty());
    assert_eq!(users.all().unwrap().len(), ids.len());
    assert_eq!(fx.registry.stats().allocations(), ids.len() as u64);
}

#[test]
fn concurrent_allocation_with_list_catalog() {
    let fx = TestRegistry::with_config(Config::new().catalog(CatalogKind::List));
    let users = fx.user_model();
    let config = StressConfig {
        threads: 4,
        operations_per_thread: 50,
    };

    let (ids, _) = stress_concurrent_allocation(&users, &config);

    let catalogued: HashSet<_> = users
        .all()
        .unwrap()
        .map(|mut r| r.id().unwrap())
        .collect();
    assert_eq!(catalogued, ids.into_iter().collect());
}

#[test]
fn conditional_claims_admit_one_owner_per_value() {
    init_tracing();
    let fx = TestRegistry::new();
    let users = fx.user_model();
    let values: Vec<String> = (0..20).map(|i| format!("user{i}@example.com")).collect();

    let result = stress_contended_claims(&users, "email", &values, 6);

    assert_eq!(result.successful_ops, values.len());
    assert_eq!(result.failed_ops, values.len() * 5);
    for value in &values {
        assert!(users.find_by_property("email", value).unwrap().is_some());
    }
}
