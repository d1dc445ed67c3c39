//! End-to-end scenarios against the connection pool.

use std::sync::Once;
use std::time::Duration;

use poolguard::{ConnectionPool, FrozenPool, PoolConfig, PoolError, SingletonAccess, SlotState};
use poolguard_core::SlotError;
use poolguard_harness::{BypassOutcome, Harness};
use rstest::rstest;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn test_config() -> PoolConfig {
    PoolConfig::default()
        .with_endpoint("scenario-db:5432")
        .with_warmup(Duration::from_millis(5))
}

#[test]
fn test_hundred_concurrent_callers_see_one_identity() {
    init_tracing();
    let pool = ConnectionPool::new(test_config());

    let report = Harness::new(&pool).race(100);

    assert!(report.passed(), "{report:?}");
    assert_eq!(report.callers, 100);
    assert_eq!(report.distinct_identities(), 1);
    assert_eq!(pool.factory().opened(), 1);
    assert_eq!(pool.open_attempts(), 1);
}

#[test]
fn test_first_failure_then_retry_succeeds() {
    init_tracing();
    let pool = ConnectionPool::new(test_config());
    pool.factory().fail_next(1);

    let err = pool.get_instance().unwrap_err();
    assert!(matches!(err, PoolError::ResourceInit(_)), "got {err:?}");
    assert_eq!(pool.state(), SlotState::Uninitialized);

    let conn = pool.get_instance().unwrap();
    assert_eq!(pool.state(), SlotState::Ready);
    assert_eq!(pool.open_attempts(), 2);

    // The retried instance is the one everybody sees from now on
    let report = Harness::new(&pool).race(16);
    assert!(report.passed());
    assert!(report.tokens.contains(&conn.token()));
}

#[test]
fn test_round_trip_preserves_identity() {
    init_tracing();
    let pool = ConnectionPool::new(test_config());

    let report = Harness::new(&pool).round_trip().unwrap();

    assert!(report.passed(), "{report:?}");
    assert_eq!(report.original, report.decoded);

    let encoded: serde_json::Value = serde_json::from_str(&report.encoded).unwrap();
    assert_eq!(encoded["token"], report.original.to_string());
}

#[test]
fn test_decoded_payload_is_never_materialized() {
    init_tracing();
    let pool = ConnectionPool::new(test_config());
    let live = pool.get_instance().unwrap();

    let mut encoded: serde_json::Value = serde_json::from_str(&pool.encode().unwrap()).unwrap();
    encoded["resource"]["endpoint"] = "elsewhere:1".into();

    let decoded = pool.resolve_value(encoded).unwrap();
    assert!(decoded.is_same(live));
    assert_eq!(decoded.endpoint(), "scenario-db:5432");
}

#[test]
fn test_bypass_is_rejected_on_lazy_pool() {
    init_tracing();
    let pool = ConnectionPool::new(test_config());

    let outcome = Harness::new(&pool).bypass().unwrap();
    let live = pool.get_instance().unwrap();

    match outcome {
        BypassOutcome::Rejected(SlotError::Construction { existing }) => {
            assert_eq!(existing, live.token())
        }
        other => panic!("Expected rejection, got {other:?}"),
    }
    assert_eq!(pool.open_attempts(), 1);
}

#[test]
fn test_bypass_is_unreachable_on_frozen_pool() {
    init_tracing();
    let pool = FrozenPool::open(test_config()).unwrap();

    let outcome = Harness::new(&pool).bypass().unwrap();
    assert!(matches!(outcome, BypassOutcome::Unreachable));
}

#[test]
fn test_frozen_pool_passes_every_scenario() {
    init_tracing();
    let pool = FrozenPool::open(test_config()).unwrap();

    let report = Harness::new(&pool).run_all(32);
    assert!(report.passed(), "{report:?}");
}

#[test]
fn test_global_pool_passes_every_scenario() {
    init_tracing();
    let report = Harness::new(ConnectionPool::global()).run_all(24);

    assert!(report.passed(), "{report:?}");
    assert!(poolguard::get_instance().unwrap().is_same(ConnectionPool::global().get_instance().unwrap()));
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(8)]
#[case(64)]
fn test_single_identity_for_any_caller_count(#[case] callers: usize) {
    init_tracing();
    let pool = ConnectionPool::new(test_config().with_warmup(Duration::from_millis(1)));

    let report = Harness::new(&pool).race(callers);

    assert!(report.passed(), "{report:?}");
    assert_eq!(pool.open_attempts(), 1);
}

#[rstest]
#[case(1)]
#[case(3)]
fn test_failures_never_leak_a_partial_instance(#[case] failures: u32) {
    init_tracing();
    let pool = ConnectionPool::new(test_config().with_warmup(Duration::ZERO));
    pool.factory().fail_next(failures);

    for _ in 0..failures {
        assert!(pool.get_instance().is_err());
        assert_eq!(pool.state(), SlotState::Uninitialized);
    }

    let report = Harness::new(&pool).run_all(8);
    assert!(report.passed(), "{report:?}");
    assert_eq!(pool.open_attempts(), u64::from(failures) + 1);
}
