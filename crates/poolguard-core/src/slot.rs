//! Lazily-initialized singleton slot.
//!
//! [`SingletonSlot`] holds at most one [`Instance`] and builds it on first
//! access with double-checked initialization:
//!
//! 1. **Fast path**: an acquire load of the published cell. Once the instance
//!    exists every call returns here without touching the lock.
//! 2. **Slow path**: take the init lock, re-check the cell (another thread may
//!    have finished while this one waited), run the factory, publish with a
//!    release store, then mark the slot `Ready`.
//!
//! A failed or panicking factory rolls the state back to `Uninitialized`
//! before the lock is released, so the next caller retries instead of waiting
//! on a slot stuck in `Initializing`.

use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::{self, DecodedInstance};
use crate::error::{Result, SlotError};
use crate::factory::ResourceFactory;
use crate::guard::{self, IdentityGuard};
use crate::instance::Instance;
use crate::retry::{self, BackoffStrategy};

/// Lifecycle state of a slot.
///
/// `Uninitialized -> Initializing -> Ready` on success;
/// `Initializing -> Uninitialized` when an attempt fails. `Ready` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SlotState {
    /// No instance, no attempt in progress.
    Uninitialized = 0,
    /// A caller holds the init lock and is running the factory.
    Initializing = 1,
    /// The instance is published.
    Ready = 2,
}

impl SlotState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Uninitialized,
            1 => Self::Initializing,
            _ => Self::Ready,
        }
    }
}

/// Atomic state shared by the slot flavours.
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) const fn new(state: SlotState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> SlotState {
        SlotState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Enter `Initializing`. Must be called with the init lock held.
    ///
    /// The returned transition rolls back to `Uninitialized` when dropped
    /// uncommitted, which covers early returns, panics and cancelled futures.
    pub(crate) fn begin(&self) -> Transition<'_> {
        self.0.store(SlotState::Initializing as u8, Ordering::Release);
        Transition {
            state: self,
            committed: false,
        }
    }
}

pub(crate) struct Transition<'a> {
    state: &'a StateCell,
    committed: bool,
}

impl Transition<'_> {
    /// Mark the slot `Ready`. Call only after the instance is published.
    pub(crate) fn commit(mut self) {
        self.state
            .0
            .store(SlotState::Ready as u8, Ordering::Release);
        self.committed = true;
    }

    /// Publish `instance` into `cell` and mark the slot `Ready`.
    ///
    /// The state is `Ready` afterwards whenever `cell` holds an instance. If
    /// `cell` was already filled, `instance` is dropped unpublished and the
    /// existing identity is reported as a [`SlotError::Construction`].
    pub(crate) fn publish<'c, R>(
        self,
        cell: &'c OnceLock<Instance<R>>,
        instance: Instance<R>,
    ) -> Result<&'c Instance<R>> {
        let outcome = cell.set(instance);
        self.commit();

        match (outcome, cell.get()) {
            (Ok(()), Some(published)) => Ok(published),
            (Err(rejected), Some(existing)) => {
                warn!(
                    existing = %existing.token(),
                    rejected = %rejected.token(),
                    "slot already held an instance; second instance discarded"
                );
                Err(SlotError::Construction {
                    existing: existing.token(),
                })
            }
            (_, None) => Err(SlotError::resource_init("instance vanished after publish")),
        }
    }
}

impl Drop for Transition<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.state
                .0
                .store(SlotState::Uninitialized as u8, Ordering::Release);
        }
    }
}

/// Public accessor surface shared by every slot flavour.
///
/// External consumers (tests, demos, the verification harness) are written
/// against this trait rather than a concrete slot.
pub trait SingletonAccess: Sync {
    /// The guarded resource type.
    type Resource: Send + Sync;

    /// The canonical instance, initializing it if needed.
    fn instance(&self) -> Result<&Instance<Self::Resource>>;

    /// The construction guard, or `None` when the slot has no construction
    /// path left to guard (eager slots).
    fn construction_guard(&self) -> Option<IdentityGuard<'_, Self::Resource>>;

    /// Resolve a decoded representation onto the canonical instance.
    ///
    /// The decoded payload is discarded. An uninitialized slot is initialized
    /// normally; no second instance is ever materialized.
    fn resolve(&self, decoded: &DecodedInstance) -> Result<&Instance<Self::Resource>> {
        let canonical = self.instance()?;
        Ok(guard::resolve_decoded(decoded, canonical))
    }

    /// Decode a JSON representation and resolve it. See [`resolve`](Self::resolve).
    fn resolve_json(&self, encoded: &str) -> Result<&Instance<Self::Resource>> {
        let decoded = codec::decode_json(encoded)?;
        self.resolve(&decoded)
    }

    /// Decode a JSON value and resolve it. See [`resolve`](Self::resolve).
    fn resolve_value(&self, encoded: Value) -> Result<&Instance<Self::Resource>> {
        let decoded = codec::decode_value(encoded)?;
        self.resolve(&decoded)
    }
}

/// Storage for at most one lazily-constructed [`Instance`].
///
/// Safe to share between any number of threads. Put it in a `static`
/// (`LazyLock`) for a process-wide singleton or keep it in an owned context
/// object for a scoped one.
///
/// # Examples
///
/// ```rust
/// use poolguard_core::{SingletonSlot, SlotState, from_fn};
///
/// let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(42u32)));
/// assert_eq!(slot.state(), SlotState::Uninitialized);
///
/// let tokens: Vec<_> = std::thread::scope(|s| {
///     let handles: Vec<_> = (0..8).map(|_| s.spawn(|| slot.get().unwrap().token())).collect();
///     handles.into_iter().map(|h| h.join().unwrap()).collect()
/// });
///
/// assert!(tokens.iter().all(|t| *t == tokens[0]));
/// assert_eq!(slot.factory_invocations(), 1);
/// ```
pub struct SingletonSlot<F: ResourceFactory> {
    factory: F,
    cell: OnceLock<Instance<F::Resource>>,
    state: StateCell,
    init_lock: Mutex<()>,
    invocations: AtomicU64,
}

impl<F: ResourceFactory> SingletonSlot<F> {
    /// Create an empty slot. Nothing is constructed until the first `get`.
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            cell: OnceLock::new(),
            state: StateCell::new(SlotState::Uninitialized),
            init_lock: Mutex::new(()),
            invocations: AtomicU64::new(0),
        }
    }

    /// Get the instance, constructing it on first access.
    ///
    /// # Errors
    ///
    /// - [`SlotError::ResourceInit`] if the factory fails; the slot is left
    ///   `Uninitialized` and a later call retries.
    /// - [`SlotError::Construction`] if the identity guard refuses the
    ///   construction.
    pub fn get(&self) -> Result<&Instance<F::Resource>> {
        // OnceLock::get is an acquire load paired with the release in `set`.
        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }
        self.initialize()
    }

    /// Like [`get`](Self::get), retrying retryable failures with `strategy`.
    ///
    /// Blocks the calling thread between attempts.
    pub fn get_with_retry<S>(&self, strategy: &S) -> Result<&Instance<F::Resource>>
    where
        S: BackoffStrategy + ?Sized,
    {
        retry::retry_blocking(strategy, || self.get())
    }

    fn initialize(&self) -> Result<&Instance<F::Resource>> {
        // The transition below restores a consistent state even if a previous
        // holder panicked, so a poisoned lock carries no broken invariant.
        let _lock = self
            .init_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(instance) = self.cell.get() {
            debug!("slot initialized by another caller while waiting for the lock");
            return Ok(instance);
        }

        let transition = self.state.begin();
        let attempt = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(attempt, "constructing singleton resource");

        let resource = self.factory.create().map_err(|err| {
            warn!(attempt, error = %err, "resource factory failed; slot reset to uninitialized");
            SlotError::resource_init(err)
        })?;

        let permit = self.guard().check_construction()?;
        let instance = transition.publish(&self.cell, Instance::new(permit, resource))?;

        info!(token = %instance.token(), attempt, "singleton instance published");
        Ok(instance)
    }

    /// The identity guard for this slot.
    pub fn guard(&self) -> IdentityGuard<'_, F::Resource> {
        IdentityGuard::new(&self.cell)
    }

    /// The instance if already published. Never triggers construction.
    pub fn peek(&self) -> Option<&Instance<F::Resource>> {
        self.cell.get()
    }

    /// Current lifecycle state.
    ///
    /// Advisory only. The instance is published a moment before the state
    /// flips to `Ready`, so a fast-path caller may already hold it while this
    /// still reports `Initializing`. Use [`peek`](Self::peek) or
    /// [`get`](Self::get) to learn whether the instance exists.
    pub fn state(&self) -> SlotState {
        self.state.load()
    }

    /// Whether the instance has been published.
    pub fn is_ready(&self) -> bool {
        self.state() == SlotState::Ready
    }

    /// How many times the factory has been invoked, failed attempts included.
    pub fn factory_invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// The factory backing this slot.
    pub fn factory(&self) -> &F {
        &self.factory
    }
}

impl<F: ResourceFactory> SingletonAccess for SingletonSlot<F> {
    type Resource = F::Resource;

    fn instance(&self) -> Result<&Instance<F::Resource>> {
        self.get()
    }

    fn construction_guard(&self) -> Option<IdentityGuard<'_, F::Resource>> {
        Some(self.guard())
    }
}

impl<F: ResourceFactory> std::fmt::Debug for SingletonSlot<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SingletonSlot")
            .field("state", &self.state())
            .field("token", &self.peek().map(Instance::token))
            .field("factory_invocations", &self.factory_invocations())
            .finish()
    }
}
