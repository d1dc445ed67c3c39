//! # poolguard
//!
//! A process-wide connection pool holding exactly one connection, opened on
//! first use and shared by every caller.
//!
//! ## Features
//!
//! - **Exactly-once construction** under any number of concurrent callers
//! - **Retryable initialization**: a failed connect leaves the pool
//!   uninitialized instead of wedged
//! - **No bypass within a pool**: a pool never holds a second connection,
//!   and there is no public way to build a pooled [`Instance`] outside one
//! - **One process-wide connection**: [`get_instance`] and
//!   [`ConnectionPool::global`] are the only routes to it.
//!   [`ConnectionPool::new`] builds an independent context with a connection
//!   of its own, for tests and scoped use
//! - **Identity-preserving decode**: an encoded pool handle always resolves
//!   back to the live instance
//! - **Eager and async flavours**: [`FrozenPool`], [`AsyncConnectionPool`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! # fn main() -> Result<(), poolguard::PoolError> {
//! let conn = poolguard::get_instance()?;
//! println!("using {}", conn.id());
//!
//! // Every caller sees the same instance
//! assert!(conn.is_same(poolguard::get_instance()?));
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! The process-wide pool reads `POOLGUARD_*` environment variables on first
//! access; see [`PoolConfig::from_env`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod error;
pub mod pool;

pub use config::PoolConfig;
pub use connection::{Connection, ConnectionFactory};
pub use error::{ConnectError, PoolError, Result};
pub use pool::{AsyncConnectionPool, ConnectionPool, FrozenPool};

// Re-export the slot vocabulary callers need to work with pool instances
pub use poolguard_core::{IdentityToken, Instance, InstanceCodec, SingletonAccess, SlotState};

/// The process-wide pooled connection, opened on first access.
///
/// Shorthand for `ConnectionPool::global().get_instance()`.
///
/// # Errors
///
/// [`PoolError::ResourceInit`] if the connection cannot be opened; the next
/// call retries.
pub fn get_instance() -> Result<&'static Instance<Connection>> {
    ConnectionPool::global().get_instance()
}

/// Like [`get_instance`], retrying with the configured backoff.
pub fn get_instance_with_retry() -> Result<&'static Instance<Connection>> {
    ConnectionPool::global().get_instance_with_retry()
}
