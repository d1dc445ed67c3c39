//! The connection pool context objects.
//!
//! [`ConnectionPool`] is the lazy flavour: the connection is opened by the
//! first caller of [`get_instance`](ConnectionPool::get_instance) and shared
//! by every caller after that. [`ConnectionPool::global`] is the process-wide
//! instance; it is created on first access and lives until the process exits.
//!
//! [`FrozenPool`] is the eager flavour: the connection is opened when the
//! pool is built, and there is no construction path left afterwards.

use std::sync::LazyLock;

use poolguard_core::{
    AsyncSingletonSlot, EagerSlot, IdentityGuard, Instance, InstanceCodec, SingletonAccess,
    SingletonSlot, SlotState,
};
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::connection::{Connection, ConnectionFactory};
use crate::error::Result;

static GLOBAL: LazyLock<ConnectionPool> = LazyLock::new(|| {
    let config = PoolConfig::from_env().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring invalid pool configuration; using defaults");
        PoolConfig::default()
    });
    debug!(endpoint = %config.endpoint, "creating process-wide connection pool");
    ConnectionPool::new(config)
});

/// A lazily-connected pool holding exactly one [`Connection`].
///
/// # Examples
///
/// ```rust
/// use poolguard::{ConnectionPool, PoolConfig};
/// use std::time::Duration;
///
/// let pool = ConnectionPool::new(PoolConfig::default().with_warmup(Duration::ZERO));
/// let a = pool.get_instance()?;
/// let b = pool.get_instance()?;
/// assert!(a.is_same(b));
/// # Ok::<(), poolguard::PoolError>(())
/// ```
#[derive(Debug)]
pub struct ConnectionPool {
    slot: SingletonSlot<ConnectionFactory>,
    config: PoolConfig,
}

impl ConnectionPool {
    /// Build an independent pool context. No connection is opened yet.
    ///
    /// The new context has a connection of its own and never shares the
    /// process-wide one; use [`global`](Self::global) for that.
    pub fn new(config: PoolConfig) -> Self {
        Self {
            slot: SingletonSlot::new(ConnectionFactory::new(&config)),
            config,
        }
    }

    /// The process-wide pool, configured from the environment on first use.
    ///
    /// Invalid environment values are logged and replaced by defaults, since
    /// there is no caller to hand the error to.
    pub fn global() -> &'static ConnectionPool {
        &GLOBAL
    }

    /// The pooled connection, opening it on first access.
    ///
    /// # Errors
    ///
    /// [`PoolError::ResourceInit`](crate::PoolError::ResourceInit) if the
    /// connection cannot be opened. The pool stays uninitialized and the next
    /// call tries again.
    pub fn get_instance(&self) -> Result<&Instance<Connection>> {
        Ok(self.slot.get()?)
    }

    /// Like [`get_instance`](Self::get_instance), retrying with the
    /// configured backoff.
    pub fn get_instance_with_retry(&self) -> Result<&Instance<Connection>> {
        Ok(self.slot.get_with_retry(&self.config.slot.backoff)?)
    }

    /// Encode the pooled instance for transport.
    pub fn encode(&self) -> Result<String> {
        Ok(self.get_instance()?.encode_json()?)
    }

    /// Resolve an encoded pool handle back onto the live instance.
    pub fn decode(&self, encoded: &str) -> Result<&Instance<Connection>> {
        Ok(self.slot.resolve_json(encoded)?)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    /// The factory opening connections for this pool.
    pub fn factory(&self) -> &ConnectionFactory {
        self.slot.factory()
    }

    /// Number of open attempts, failed ones included.
    pub fn open_attempts(&self) -> u64 {
        self.slot.factory_invocations()
    }

    /// The configuration this pool was built with.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }
}

impl SingletonAccess for ConnectionPool {
    type Resource = Connection;

    fn instance(&self) -> poolguard_core::Result<&Instance<Connection>> {
        self.slot.get()
    }

    fn construction_guard(&self) -> Option<IdentityGuard<'_, Connection>> {
        Some(self.slot.guard())
    }
}

/// A pool whose connection is opened up front.
///
/// ```rust
/// use poolguard::{FrozenPool, PoolConfig};
/// use std::time::Duration;
///
/// let pool = FrozenPool::open(PoolConfig::default().with_warmup(Duration::ZERO))?;
/// assert!(pool.get_instance().id().starts_with("conn-"));
/// # Ok::<(), poolguard::PoolError>(())
/// ```
#[derive(Debug)]
pub struct FrozenPool {
    slot: EagerSlot<Connection>,
}

impl FrozenPool {
    /// Open the connection now.
    ///
    /// # Errors
    ///
    /// [`PoolError::ResourceInit`](crate::PoolError::ResourceInit) if the
    /// connection cannot be opened.
    pub fn open(config: PoolConfig) -> Result<Self> {
        let slot = EagerSlot::new(ConnectionFactory::new(&config))?;
        Ok(Self { slot })
    }

    /// The pooled connection. Always available.
    pub fn get_instance(&self) -> &Instance<Connection> {
        self.slot.get()
    }

    /// Resolve an encoded pool handle back onto the live instance.
    pub fn decode(&self, encoded: &str) -> Result<&Instance<Connection>> {
        Ok(self.slot.resolve_json(encoded)?)
    }
}

impl SingletonAccess for FrozenPool {
    type Resource = Connection;

    fn instance(&self) -> poolguard_core::Result<&Instance<Connection>> {
        Ok(self.slot.get())
    }

    fn construction_guard(&self) -> Option<IdentityGuard<'_, Connection>> {
        None
    }
}

/// Async flavour of [`ConnectionPool`] with a bounded connect.
///
/// The connect is bounded by `PoolConfig::slot.init_timeout`; a timed-out
/// attempt leaves the pool uninitialized for the next caller.
#[derive(Debug)]
pub struct AsyncConnectionPool {
    slot: AsyncSingletonSlot<ConnectionFactory>,
}

impl AsyncConnectionPool {
    /// Build a pool context. No connection is opened yet.
    pub fn new(config: PoolConfig) -> Self {
        let factory = ConnectionFactory::new(&config);
        Self {
            slot: AsyncSingletonSlot::with_config(factory, config.slot),
        }
    }

    /// The pooled connection, opening it on first access.
    pub async fn get_instance(&self) -> Result<&Instance<Connection>> {
        Ok(self.slot.get().await?)
    }

    /// Like [`get_instance`](Self::get_instance), retrying with the
    /// configured backoff.
    pub async fn get_instance_with_retry(&self) -> Result<&Instance<Connection>> {
        Ok(self.slot.get_with_retry().await?)
    }

    /// Resolve an encoded pool handle back onto the live instance.
    pub async fn decode(&self, encoded: &str) -> Result<&Instance<Connection>> {
        Ok(self.slot.resolve_json(encoded).await?)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SlotState {
        self.slot.state()
    }

    /// The factory opening connections for this pool.
    pub fn factory(&self) -> &ConnectionFactory {
        self.slot.factory()
    }

    /// Number of open attempts, failed and timed-out ones included.
    pub fn open_attempts(&self) -> u64 {
        self.slot.factory_invocations()
    }
}
