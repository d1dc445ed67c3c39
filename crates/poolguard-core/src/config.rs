//! Slot configuration.

use std::time::Duration;

use crate::retry::ExponentialBackoff;

/// Configuration shared by slot flavours.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SlotConfig {
    /// Upper bound on a single factory invocation. `None` waits indefinitely.
    ///
    /// Honoured by [`AsyncSingletonSlot`](crate::AsyncSingletonSlot); a
    /// blocking factory cannot be interrupted, so [`SingletonSlot`](crate::SingletonSlot)
    /// ignores it.
    pub init_timeout: Option<Duration>,

    /// Backoff used by the `*_with_retry` accessors.
    pub backoff: ExponentialBackoff,
}

impl SlotConfig {
    /// Bound each factory invocation by `timeout`.
    pub fn with_init_timeout(mut self, timeout: Duration) -> Self {
        self.init_timeout = Some(timeout);
        self
    }

    /// Replace the retry backoff.
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::BackoffStrategy;

    #[test]
    fn test_default_has_no_timeout() {
        let config = SlotConfig::default();
        assert_eq!(config.init_timeout, None);
        assert_eq!(config.backoff, ExponentialBackoff::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = SlotConfig::default()
            .with_init_timeout(Duration::from_secs(3))
            .with_backoff(ExponentialBackoff::none());

        assert_eq!(config.init_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.backoff.max_retries(), 0);
    }
}
