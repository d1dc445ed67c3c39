//! Async singleton slot with bounded initialization.
//!
//! [`AsyncSingletonSlot`] follows the same protocol as
//! [`SingletonSlot`](crate::SingletonSlot) for tasks on a tokio runtime, and
//! adds a bound on the `Initializing` window: if the factory does not finish
//! within [`SlotConfig::init_timeout`] the attempt is abandoned, the slot goes
//! back to `Uninitialized` and the next caller starts over.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::codec::{self, DecodedInstance};
use crate::config::SlotConfig;
use crate::error::{Result, SlotError};
use crate::factory::AsyncResourceFactory;
use crate::guard::{self, IdentityGuard};
use crate::instance::Instance;
use crate::retry::{self, BackoffStrategy};
use crate::slot::{SlotState, StateCell};

/// A lazily-initialized singleton for async callers.
///
/// # Examples
///
/// ```rust
/// use poolguard_core::{AsyncResourceFactory, AsyncSingletonSlot, SlotConfig};
/// use async_trait::async_trait;
/// use std::time::Duration;
///
/// struct Handshake;
///
/// #[async_trait]
/// impl AsyncResourceFactory for Handshake {
///     type Resource = String;
///     type Error = std::io::Error;
///
///     async fn create(&self) -> Result<String, std::io::Error> {
///         tokio::time::sleep(Duration::from_millis(5)).await;
///         Ok("session-1".to_string())
///     }
/// }
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), poolguard_core::SlotError> {
/// let slot = AsyncSingletonSlot::with_config(
///     Handshake,
///     SlotConfig::default().with_init_timeout(Duration::from_secs(1)),
/// );
///
/// let first = slot.get().await?;
/// let second = slot.get().await?;
/// assert!(first.is_same(second));
/// # Ok(())
/// # }
/// ```
pub struct AsyncSingletonSlot<F: AsyncResourceFactory> {
    factory: F,
    config: SlotConfig,
    cell: OnceLock<Instance<F::Resource>>,
    state: StateCell,
    init_lock: Mutex<()>,
    invocations: AtomicU64,
}

impl<F: AsyncResourceFactory> AsyncSingletonSlot<F> {
    /// Create an empty slot with the default configuration (no timeout).
    pub fn new(factory: F) -> Self {
        Self::with_config(factory, SlotConfig::default())
    }

    /// Create an empty slot with explicit configuration.
    pub fn with_config(factory: F, config: SlotConfig) -> Self {
        Self {
            factory,
            config,
            cell: OnceLock::new(),
            state: StateCell::new(SlotState::Uninitialized),
            init_lock: Mutex::new(()),
            invocations: AtomicU64::new(0),
        }
    }

    /// Get the instance, constructing it on first access.
    ///
    /// Dropping the returned future while it is initializing releases the
    /// lock and resets the slot to `Uninitialized`.
    ///
    /// # Errors
    ///
    /// - [`SlotError::ResourceInit`] if the factory fails.
    /// - [`SlotError::InitTimeout`] if the factory exceeds the configured bound.
    /// - [`SlotError::Construction`] if the identity guard refuses construction.
    pub async fn get(&self) -> Result<&Instance<F::Resource>> {
        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }
        self.initialize().await
    }

    /// Like [`get`](Self::get), retrying with the configured backoff.
    pub async fn get_with_retry(&self) -> Result<&Instance<F::Resource>> {
        self.get_with_strategy(&self.config.backoff).await
    }

    /// Like [`get`](Self::get), retrying with an explicit strategy.
    pub async fn get_with_strategy<S>(&self, strategy: &S) -> Result<&Instance<F::Resource>>
    where
        S: BackoffStrategy + ?Sized,
    {
        retry::retry(strategy, || self.get()).await
    }

    async fn initialize(&self) -> Result<&Instance<F::Resource>> {
        let _lock = self.init_lock.lock().await;

        if let Some(instance) = self.cell.get() {
            return Ok(instance);
        }

        let transition = self.state.begin();
        let attempt = self.invocations.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(attempt, timeout = ?self.config.init_timeout, "constructing singleton resource");

        let created = match self.config.init_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.factory.create()).await {
                Ok(created) => created,
                Err(_) => {
                    warn!(attempt, ?limit, "resource factory timed out; slot reset to uninitialized");
                    return Err(SlotError::InitTimeout(limit));
                }
            },
            None => self.factory.create().await,
        };
        let resource = created.map_err(|err| {
            warn!(attempt, error = %err, "resource factory failed; slot reset to uninitialized");
            SlotError::resource_init(err)
        })?;

        let permit = self.guard().check_construction()?;
        let instance = transition.publish(&self.cell, Instance::new(permit, resource))?;

        info!(token = %instance.token(), attempt, "singleton instance published");
        Ok(instance)
    }

    /// Resolve a decoded representation onto the canonical instance,
    /// initializing the slot if needed.
    pub async fn resolve(&self, decoded: &DecodedInstance) -> Result<&Instance<F::Resource>> {
        let canonical = self.get().await?;
        Ok(guard::resolve_decoded(decoded, canonical))
    }

    /// Decode a JSON representation and resolve it onto the canonical instance.
    pub async fn resolve_json(&self, encoded: &str) -> Result<&Instance<F::Resource>> {
        let decoded = codec::decode_json(encoded)?;
        self.resolve(&decoded).await
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
    /// Advisory, as for [`SingletonSlot::state`](crate::SingletonSlot::state):
    /// [`peek`](Self::peek) and [`get`](Self::get) are authoritative.
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

    /// The configuration this slot was built with.
    pub fn config(&self) -> &SlotConfig {
        &self.config
    }
}

impl<F: AsyncResourceFactory> std::fmt::Debug for AsyncSingletonSlot<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncSingletonSlot")
            .field("state", &self.state())
            .field("token", &self.peek().map(Instance::token))
            .field("factory_invocations", &self.factory_invocations())
            .finish()
    }
}
