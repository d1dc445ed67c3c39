//! Configuration for the connection pool

use std::time::Duration;

use poolguard_core::SlotConfig;
use poolguard_core::retry::ExponentialBackoff;

use crate::error::{PoolError, Result};

const DEFAULT_ENDPOINT: &str = "localhost:5432";

/// Configuration for the connection pool.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolConfig {
    /// Endpoint the pooled connection is opened against
    pub endpoint: String,

    /// Simulated cost of opening the connection
    pub warmup: Duration,

    /// Slot behaviour: init timeout and retry backoff
    pub slot: SlotConfig,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            warmup: Duration::from_millis(50),
            slot: SlotConfig::default(),
        }
    }
}

impl PoolConfig {
    /// Set the endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set the simulated connection warm-up.
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the slot configuration.
    pub fn with_slot(mut self, slot: SlotConfig) -> Self {
        self.slot = slot;
        self
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `POOLGUARD_ENDPOINT` for the connection endpoint
    /// - `POOLGUARD_WARMUP_MS` for the simulated warm-up (milliseconds)
    /// - `POOLGUARD_INIT_TIMEOUT_MS` for the initialization bound (milliseconds)
    /// - `POOLGUARD_MAX_RETRIES` for retry attempts after the first failure
    /// - `POOLGUARD_RETRY_DELAY_MS` for the initial retry delay (milliseconds)
    ///
    /// With the `env` feature a `.env` file in the working directory is loaded
    /// first; variables already set in the process win.
    ///
    /// # Errors
    ///
    /// [`PoolError::Config`] if a variable is set but not a valid number.
    pub fn from_env() -> Result<Self> {
        #[cfg(feature = "env")]
        let _ = dotenvy::dotenv();

        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("POOLGUARD_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Some(ms) = env_u64("POOLGUARD_WARMUP_MS")? {
            config.warmup = Duration::from_millis(ms);
        }

        if let Some(ms) = env_u64("POOLGUARD_INIT_TIMEOUT_MS")? {
            config.slot.init_timeout = Some(Duration::from_millis(ms));
        }

        let max_retries = env_u64("POOLGUARD_MAX_RETRIES")?;
        let retry_delay = env_u64("POOLGUARD_RETRY_DELAY_MS")?;
        if max_retries.is_some() || retry_delay.is_some() {
            let mut backoff = ExponentialBackoff::builder();
            if let Some(retries) = max_retries {
                let retries = u32::try_from(retries).map_err(|_| PoolError::Config {
                    key: "POOLGUARD_MAX_RETRIES".to_string(),
                    message: format!("{retries} is out of range"),
                })?;
                backoff = backoff.max_retries(retries);
            }
            if let Some(ms) = retry_delay {
                backoff = backoff.initial_delay(Duration::from_millis(ms));
            }
            config.slot.backoff = backoff.build();
        }

        Ok(config)
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|e| PoolError::Config {
                key: key.to_string(),
                message: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(None),
    }
}
