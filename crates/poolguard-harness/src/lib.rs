//! Verification scenarios for singleton slots.
//!
//! The harness is an external consumer: it only touches a slot through
//! [`SingletonAccess`], the same surface application code uses. It drives
//! three scenarios and reports what it observed:
//!
//! - **Race**: many threads released together call the accessor; exactly one
//!   identity must be seen.
//! - **Round trip**: the live instance is encoded and decoded through the
//!   slot; the result must be the live instance itself.
//! - **Bypass**: once the slot is ready, a further construction must be
//!   rejected, or have no path to run at all.
//!
//! ```rust
//! use poolguard_core::{SingletonSlot, from_fn};
//! use poolguard_harness::Harness;
//!
//! let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>("conn".to_string())));
//! let report = Harness::new(&slot).run_all(16);
//! assert!(report.passed(), "{report:?}");
//! ```

use std::collections::HashSet;
use std::sync::{Barrier, Mutex, PoisonError};
use std::thread;

use poolguard_core::{IdentityToken, Instance, InstanceCodec, Result, SingletonAccess, SlotError};
use serde::Serialize;
use tracing::{info, warn};

/// Outcome of the race scenario.
#[derive(Debug, Default)]
pub struct RaceReport {
    /// Number of threads that called the accessor
    pub callers: usize,
    /// Distinct identity tokens observed
    pub tokens: HashSet<IdentityToken>,
    /// Distinct instance addresses observed
    pub addresses: HashSet<usize>,
    /// Errors returned to callers
    pub failures: Vec<String>,
}

impl RaceReport {
    /// Number of distinct identities observed.
    pub fn distinct_identities(&self) -> usize {
        self.tokens.len()
    }

    /// Exactly one identity at exactly one address, and no failures.
    pub fn passed(&self) -> bool {
        self.tokens.len() == 1 && self.addresses.len() == 1 && self.failures.is_empty()
    }
}

/// Outcome of the round-trip scenario.
#[derive(Debug, Clone)]
pub struct RoundTripReport {
    /// Token of the live instance
    pub original: IdentityToken,
    /// Token of the instance the decode resolved to
    pub decoded: IdentityToken,
    /// Whether the decode returned the live instance itself
    pub same_instance: bool,
    /// The encoded form that was decoded
    pub encoded: String,
}

impl RoundTripReport {
    /// Same token and same address.
    pub fn passed(&self) -> bool {
        self.same_instance && self.original == self.decoded
    }
}

/// Outcome of the bypass scenario.
#[derive(Debug)]
pub enum BypassOutcome {
    /// The guard refused the construction.
    Rejected(SlotError),
    /// The slot exposes no construction path.
    Unreachable,
    /// The guard admitted a second construction. Always a failure.
    Admitted,
}

impl BypassOutcome {
    /// Anything but `Admitted`.
    pub fn passed(&self) -> bool {
        !matches!(self, Self::Admitted)
    }
}

/// Combined outcome of all scenarios.
#[derive(Debug)]
pub struct HarnessReport {
    /// Race scenario
    pub race: RaceReport,
    /// Round-trip scenario, or the error that stopped it
    pub round_trip: Result<RoundTripReport>,
    /// Bypass scenario, or the error that stopped it
    pub bypass: Result<BypassOutcome>,
}

impl HarnessReport {
    /// Every scenario ran and passed.
    pub fn passed(&self) -> bool {
        self.race.passed()
            && self.round_trip.as_ref().is_ok_and(RoundTripReport::passed)
            && self.bypass.as_ref().is_ok_and(BypassOutcome::passed)
    }
}

/// Drives verification scenarios against a slot.
#[derive(Debug)]
pub struct Harness<'a, S: ?Sized> {
    slot: &'a S,
}

impl<'a, S> Harness<'a, S>
where
    S: SingletonAccess + ?Sized,
{
    /// Harness over `slot`.
    pub fn new(slot: &'a S) -> Self {
        Self { slot }
    }

    /// Release `callers` threads together against the accessor and record
    /// what each one saw.
    pub fn race(&self, callers: usize) -> RaceReport {
        let callers = callers.max(1);
        let barrier = Barrier::new(callers);
        let report = Mutex::new(RaceReport {
            callers,
            ..RaceReport::default()
        });

        thread::scope(|s| {
            for _ in 0..callers {
                s.spawn(|| {
                    barrier.wait();
                    let observed = self.slot.instance();
                    let mut report = report.lock().unwrap_or_else(PoisonError::into_inner);
                    match observed {
                        Ok(instance) => {
                            report.tokens.insert(instance.token());
                            report.addresses.insert(address_of(instance));
                        }
                        Err(err) => report.failures.push(err.to_string()),
                    }
                });
            }
        });

        let report = report.into_inner().unwrap_or_else(PoisonError::into_inner);
        info!(
            callers,
            identities = report.distinct_identities(),
            failures = report.failures.len(),
            "race scenario finished"
        );
        report
    }

    /// Attempt a construction after making sure the slot is ready.
    pub fn bypass(&self) -> Result<BypassOutcome> {
        let live = self.slot.instance()?;

        let outcome = match self.slot.construction_guard() {
            None => BypassOutcome::Unreachable,
            Some(guard) => match guard.check_construction() {
                Err(err) => BypassOutcome::Rejected(err),
                Ok(_permit) => BypassOutcome::Admitted,
            },
        };

        match &outcome {
            BypassOutcome::Admitted => {
                warn!(live = %live.token(), "bypass construction was admitted")
            }
            other => info!(live = %live.token(), outcome = ?other, "bypass scenario finished"),
        }
        Ok(outcome)
    }
}

impl<'a, S> Harness<'a, S>
where
    S: SingletonAccess + ?Sized,
    S::Resource: Serialize,
{
    /// Encode the live instance, decode it through the slot, and compare.
    pub fn round_trip(&self) -> Result<RoundTripReport> {
        let live = self.slot.instance()?;
        let encoded = live.encode_json()?;
        let decoded = self.slot.resolve_json(&encoded)?;

        let report = RoundTripReport {
            original: live.token(),
            decoded: decoded.token(),
            same_instance: decoded.is_same(live),
            encoded,
        };
        info!(
            token = %report.original,
            same_instance = report.same_instance,
            "round-trip scenario finished"
        );
        Ok(report)
    }

    /// Run race, round trip and bypass, in that order.
    pub fn run_all(&self, callers: usize) -> HarnessReport {
        let race = self.race(callers);
        let round_trip = self.round_trip();
        let bypass = self.bypass();
        HarnessReport {
            race,
            round_trip,
            bypass,
        }
    }
}

fn address_of<R>(instance: &Instance<R>) -> usize {
    std::ptr::from_ref(instance).addr()
}

#[cfg(test)]
mod tests {
    use super::*;
    use poolguard_core::{EagerSlot, SingletonSlot, from_fn};
    use std::io;

    #[test]
    fn test_race_on_failing_slot_reports_failures() {
        let slot = SingletonSlot::new(from_fn(|| {
            Err::<String, _>(io::Error::new(io::ErrorKind::ConnectionRefused, "down"))
        }));

        let report = Harness::new(&slot).race(8);

        assert_eq!(report.callers, 8);
        assert_eq!(report.failures.len(), 8);
        assert_eq!(report.distinct_identities(), 0);
        assert!(!report.passed());
    }

    #[test]
    fn test_zero_callers_runs_one() {
        let slot = SingletonSlot::new(from_fn(|| Ok::<_, io::Error>(1u8)));
        let report = Harness::new(&slot).race(0);

        assert_eq!(report.callers, 1);
        assert!(report.passed());
    }

    #[test]
    fn test_eager_bypass_is_unreachable() {
        let slot = EagerSlot::new(from_fn(|| Ok::<_, io::Error>(1u8))).unwrap();
        let outcome = Harness::new(&slot).bypass().unwrap();

        assert!(matches!(outcome, BypassOutcome::Unreachable));
        assert!(outcome.passed());
    }

    #[test]
    fn test_report_fails_when_round_trip_errors() {
        let slot = SingletonSlot::new(from_fn(|| {
            Err::<String, _>(io::Error::new(io::ErrorKind::ConnectionRefused, "down"))
        }));

        let report = Harness::new(&slot).run_all(2);
        assert!(report.round_trip.is_err());
        assert!(report.bypass.is_err());
        assert!(!report.passed());
    }
}
