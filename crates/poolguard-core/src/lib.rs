#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Exactly-once singleton slots for shared resources.
//!
//! This crate provides the lifecycle machinery behind a process-wide shared
//! resource (a connection, a pool, a client):
//!
//! - **Lazy, double-checked initialization** via [`SingletonSlot`]
//!   - lock-free fast path once the instance is published
//!   - failed or panicking construction rolls back to `Uninitialized`
//! - **Bounded async initialization** via [`AsyncSingletonSlot`]
//! - **Eager construction** via [`EagerSlot`], for callers that want the
//!   resource built up front with no construction path left afterwards
//! - **Identity guards** via [`IdentityGuard`]: duplicate construction is
//!   rejected and decoded instances resolve to the canonical one
//! - **Retry with exponential backoff** via [`retry`]
//!
//! # Examples
//!
//! ```rust
//! use poolguard_core::prelude::*;
//!
//! let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(String::from("conn-1"))));
//!
//! let first = slot.get()?;
//! let second = slot.get()?;
//! assert!(first.is_same(second));
//! assert_eq!(slot.state(), SlotState::Ready);
//! # Ok::<(), SlotError>(())
//! ```

pub mod async_slot;
pub mod codec;
pub mod config;
pub mod eager;
pub mod error;
pub mod factory;
pub mod guard;
pub mod instance;
pub mod retry;
pub mod slot;

pub use async_slot::AsyncSingletonSlot;
pub use codec::{DecodedInstance, InstanceCodec, InstanceSeed};
pub use config::SlotConfig;
pub use eager::EagerSlot;
pub use error::{Result, SlotError};
pub use factory::{AsyncResourceFactory, FnFactory, ResourceFactory, from_fn};
pub use guard::IdentityGuard;
pub use instance::{ConstructionPermit, IdentityToken, Instance};
pub use slot::{SingletonAccess, SingletonSlot, SlotState};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use poolguard_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::async_slot::AsyncSingletonSlot;
    pub use crate::codec::InstanceCodec;
    pub use crate::config::SlotConfig;
    pub use crate::eager::EagerSlot;
    pub use crate::error::{Result, SlotError};
    pub use crate::error_boundary;
    pub use crate::factory::{AsyncResourceFactory, ResourceFactory, from_fn};
    pub use crate::instance::{IdentityToken, Instance};
    pub use crate::retry::{BackoffStrategy, ExponentialBackoff};
    pub use crate::slot::{SingletonAccess, SingletonSlot, SlotState};
}
