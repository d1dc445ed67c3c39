//! Error types for singleton slots.
//!
//! [`SlotError`] covers every way a slot accessor can fail. Conversions into
//! outer error types are declared with [`error_boundary!`](crate::error_boundary).

mod boundary;

use std::time::Duration;
use thiserror::Error;

use crate::instance::IdentityToken;

/// Result type alias for slot operations.
pub type Result<T> = std::result::Result<T, SlotError>;

/// Boxed error produced by a resource factory.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by slot accessors, guards and codecs.
#[derive(Debug, Error)]
pub enum SlotError {
    /// A construction attempt was made while the slot already holds an instance.
    ///
    /// Only the offending call fails; the published instance is untouched.
    #[error("singleton already constructed as instance {existing}; use the slot accessor")]
    Construction {
        /// Identity of the instance already held by the slot
        existing: IdentityToken,
    },

    /// The resource factory failed. The slot has been reset to `Uninitialized`.
    #[error("resource initialization failed: {source}")]
    ResourceInit {
        /// Error reported by the factory
        #[source]
        source: BoxError,
    },

    /// The resource factory did not finish within the configured bound.
    /// The slot has been reset to `Uninitialized`.
    #[error("resource initialization timed out after {0:?}")]
    InitTimeout(Duration),

    /// An encoded instance could not be read or written.
    #[error("instance codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

impl SlotError {
    /// Wrap a factory error.
    pub fn resource_init(source: impl Into<BoxError>) -> Self {
        Self::ResourceInit {
            source: source.into(),
        }
    }

    /// Whether a later attempt may succeed.
    ///
    /// Factory failures and timeouts leave the slot retryable. Construction and
    /// codec errors do not change with time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ResourceInit { .. } | Self::InitTimeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn test_resource_init_keeps_source_chain() {
        let err = SlotError::resource_init(io::Error::new(
            io::ErrorKind::ConnectionRefused,
            "database unreachable",
        ));

        assert!(err.to_string().contains("database unreachable"));
        let source = err.source().expect("source should be preserved");
        assert!(source.to_string().contains("database unreachable"));
    }

    #[test]
    fn test_retryable_classification() {
        let token = IdentityToken::generate();

        assert!(SlotError::resource_init("boom").is_retryable());
        assert!(SlotError::InitTimeout(Duration::from_millis(5)).is_retryable());
        assert!(!SlotError::Construction { existing: token }.is_retryable());

        let codec = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(!SlotError::from(codec).is_retryable());
    }

    #[test]
    fn test_construction_message_names_existing_instance() {
        let token = IdentityToken::generate();
        let err = SlotError::Construction { existing: token };

        assert!(err.to_string().contains(&token.to_string()));
    }
}
