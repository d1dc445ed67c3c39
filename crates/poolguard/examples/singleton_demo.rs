//! Connection pool singleton demo
//!
//! Runs the verification scenarios against the process-wide pool, a pool
//! that fails its first connect, and an eagerly opened pool.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --example singleton_demo
//!
//! # Point the process-wide pool somewhere else
//! POOLGUARD_ENDPOINT=db.internal:6432 cargo run --example singleton_demo
//! ```

use std::time::Duration;

use anyhow::{Context, bail};
use poolguard::{ConnectionPool, FrozenPool, PoolConfig, PoolError, SlotState};
use poolguard_harness::{BypassOutcome, Harness};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("== Process-wide pool ==\n");
    let global = ConnectionPool::global();
    let report = Harness::new(global).run_all(100);

    println!(
        "race: {} callers, {} identity, {} failures",
        report.race.callers,
        report.race.distinct_identities(),
        report.race.failures.len()
    );
    let round_trip = report
        .round_trip
        .as_ref()
        .map_err(|e| anyhow::anyhow!("round trip failed: {e}"))?;
    println!("round trip: {} -> {}", round_trip.original, round_trip.decoded);
    match &report.bypass {
        Ok(BypassOutcome::Rejected(err)) => println!("bypass: rejected ({err})"),
        Ok(other) => println!("bypass: {other:?}"),
        Err(err) => println!("bypass: could not run ({err})"),
    }
    if !report.passed() {
        bail!("process-wide pool failed verification: {report:?}");
    }

    let conn = poolguard::get_instance()?;
    println!(
        "connection {} to {}, opened at {}\n",
        conn.id(),
        conn.endpoint(),
        conn.opened_at().to_rfc3339()
    );

    println!("== Failing first connect ==\n");
    let pool = ConnectionPool::new(PoolConfig::default().with_warmup(Duration::from_millis(10)));
    pool.factory().fail_next(1);

    match pool.get_instance() {
        Err(err @ PoolError::ResourceInit(_)) => println!("first attempt: {err}"),
        Err(err) => return Err(err).context("unexpected error on first attempt"),
        Ok(_) => bail!("first attempt should have failed"),
    }
    assert_eq!(pool.state(), SlotState::Uninitialized);

    let conn = pool.get_instance().context("retry after failed connect")?;
    println!(
        "second attempt: {} after {} attempts\n",
        conn.id(),
        pool.open_attempts()
    );

    println!("== Eager pool ==\n");
    let frozen = FrozenPool::open(PoolConfig::default().with_warmup(Duration::ZERO))?;
    let report = Harness::new(&frozen).run_all(16);
    println!("eager pool passed: {}", report.passed());

    Ok(())
}
