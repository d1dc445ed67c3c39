//! Retry strategies for slot initialization.
//!
//! A failed initialization leaves the slot `Uninitialized`, so retrying is just
//! calling the accessor again. This module decides when and how often.
//!
//! # Key Types
//!
//! - [`BackoffStrategy`] - Core trait for retry strategies
//! - [`ExponentialBackoff`] - Exponential backoff with jitter
//! - [`retry_blocking`] / [`retry`] - Drive an operation with a strategy
//!
//! # Examples
//!
//! ```rust
//! use poolguard_core::retry::ExponentialBackoff;
//! use poolguard_core::{SingletonSlot, from_fn};
//! use std::time::Duration;
//!
//! let backoff = ExponentialBackoff::builder()
//!     .max_retries(3)
//!     .initial_delay(Duration::from_millis(1))
//!     .build();
//!
//! let slot = SingletonSlot::new(from_fn(|| Ok::<_, std::io::Error>(1u8)));
//! let instance = slot.get_with_retry(&backoff)?;
//! # Ok::<(), poolguard_core::SlotError>(())
//! ```

mod exponential;
mod strategy;

pub use exponential::{ExponentialBackoff, ExponentialBackoffBuilder};
pub use strategy::{BackoffStrategy, retry, retry_blocking};
