//! Error types for the connection pool
//!
//! Slot failures cross into [`PoolError`] through an
//! [`error_boundary!`](poolguard_core::error_boundary) so `?` works on every
//! slot accessor.

use poolguard_core::{IdentityToken, SlotError, error_boundary};
use thiserror::Error;

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;

/// Main error type for the connection pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A second pool instance was about to be constructed.
    #[error("connection pool already constructed as {existing}; use get_instance()")]
    Construction {
        /// Identity of the live pool instance
        existing: IdentityToken,
    },

    /// The connection could not be established. The pool stays uninitialized
    /// and the next `get_instance()` retries.
    #[error("connection pool initialization failed: {0}")]
    ResourceInit(#[source] SlotError),

    /// Initialization exceeded its time bound.
    #[error("connection pool initialization timed out: {0}")]
    Timeout(#[source] SlotError),

    /// An encoded pool handle could not be read or written.
    #[error("pool handle codec error: {0}")]
    Codec(#[source] SlotError),

    /// Invalid configuration value.
    #[error("invalid configuration {key}: {message}")]
    Config {
        /// Environment variable or setting name
        key: String,
        /// What was wrong with it
        message: String,
    },
}

impl PoolError {
    /// Whether calling the accessor again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceInit(_) | Self::Timeout(_))
    }
}

error_boundary!(SlotError => PoolError, |e| match e {
    SlotError::Construction { existing } => PoolError::Construction { existing },
    err @ SlotError::ResourceInit { .. } => PoolError::ResourceInit(err),
    err @ SlotError::InitTimeout(_) => PoolError::Timeout(err),
    err @ SlotError::Codec(_) => PoolError::Codec(err),
});

/// Failure to open the underlying connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The endpoint refused or was unreachable.
    #[error("endpoint {endpoint} unavailable: {reason}")]
    Unavailable {
        /// Endpoint that was dialled
        endpoint: String,
        /// Why the connection failed
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::time::Duration;

    #[test]
    fn test_slot_errors_cross_boundary() {
        let token = IdentityToken::generate();

        let err: PoolError = SlotError::Construction { existing: token }.into();
        assert!(matches!(err, PoolError::Construction { existing } if existing == token));

        let err: PoolError = SlotError::resource_init("refused").into();
        assert!(matches!(err, PoolError::ResourceInit(_)));
        assert!(err.is_retryable());

        let err: PoolError = SlotError::InitTimeout(Duration::from_secs(1)).into();
        assert!(matches!(err, PoolError::Timeout(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_resource_init_source_chain_reaches_connect_error() {
        let connect = ConnectError::Unavailable {
            endpoint: "db:5432".into(),
            reason: "connection refused".into(),
        };
        let err: PoolError = SlotError::resource_init(connect).into();

        let slot_err = err.source().expect("slot error source");
        let root = slot_err.source().expect("connect error source");
        assert!(root.to_string().contains("db:5432"));
    }

    #[test]
    fn test_config_error_message() {
        let err = PoolError::Config {
            key: "POOLGUARD_WARMUP_MS".into(),
            message: "invalid digit found in string".into(),
        };

        assert!(!err.is_retryable());
        assert!(err.to_string().contains("POOLGUARD_WARMUP_MS"));
    }
}
