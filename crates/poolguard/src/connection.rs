//! The pooled connection and the factory that opens it.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poolguard_core::{AsyncResourceFactory, ResourceFactory};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::PoolConfig;
use crate::error::ConnectError;

/// Process-local sequence mixed into connection ids, so two connections opened
/// within the same clock tick still get distinct seeds.
static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// A simulated database connection.
///
/// Immutable once opened. The id combines a creation-time seed with a random
/// suffix (`conn-<seed hex>-<8 hex>`), so an accidental second connection is
/// always distinguishable from the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Connection {
    id: String,
    endpoint: String,
    opened_at: DateTime<Utc>,
}

impl Connection {
    fn open(endpoint: &str) -> Self {
        let opened_at = Utc::now();
        let micros = u64::try_from(opened_at.timestamp_micros()).unwrap_or_default();
        let seed = micros ^ SEQUENCE.fetch_add(1, Ordering::Relaxed).rotate_left(48);
        let suffix: u32 = rand::random();

        Self {
            id: format!("conn-{seed:x}-{suffix:08x}"),
            endpoint: endpoint.to_string(),
            opened_at,
        }
    }

    /// Unique connection id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Endpoint this connection was opened against.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// When the connection was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

impl std::fmt::Display for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Connection{{{} @ {}}}", self.id, self.endpoint)
    }
}

/// Opens [`Connection`]s.
///
/// Opening is deliberately slow (`warmup`) to widen the race window for
/// concurrent first callers. `fail_next(n)` makes the next `n` attempts fail,
/// standing in for an unavailable endpoint.
#[derive(Debug)]
pub struct ConnectionFactory {
    endpoint: String,
    warmup: Duration,
    pending_failures: AtomicU32,
    opened: AtomicU64,
}

impl ConnectionFactory {
    /// Factory for the endpoint and warm-up delay in `config`.
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            warmup: config.warmup,
            pending_failures: AtomicU32::new(0),
            opened: AtomicU64::new(0),
        }
    }

    /// Make the next `attempts` opens fail.
    pub fn fail_next(&self, attempts: u32) {
        self.pending_failures.store(attempts, Ordering::SeqCst);
    }

    /// Number of connections successfully opened by this factory.
    pub fn opened(&self) -> u64 {
        self.opened.load(Ordering::SeqCst)
    }

    /// Endpoint dialled by this factory.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn take_failure(&self) -> bool {
        self.pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn finish_open(&self) -> Result<Connection, ConnectError> {
        if self.take_failure() {
            warn!(endpoint = %self.endpoint, "simulated connection failure");
            return Err(ConnectError::Unavailable {
                endpoint: self.endpoint.clone(),
                reason: "connection refused".to_string(),
            });
        }
        let connection = Connection::open(&self.endpoint);
        self.opened.fetch_add(1, Ordering::SeqCst);
        debug!(id = %connection.id(), endpoint = %self.endpoint, "connection opened");
        Ok(connection)
    }
}

impl ResourceFactory for ConnectionFactory {
    type Resource = Connection;
    type Error = ConnectError;

    fn create(&self) -> Result<Connection, ConnectError> {
        std::thread::sleep(self.warmup);
        self.finish_open()
    }
}

#[async_trait]
impl AsyncResourceFactory for ConnectionFactory {
    type Resource = Connection;
    type Error = ConnectError;

    async fn create(&self) -> Result<Connection, ConnectError> {
        tokio::time::sleep(self.warmup).await;
        self.finish_open()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn quick_factory() -> ConnectionFactory {
        ConnectionFactory::new(&PoolConfig::default().with_warmup(Duration::ZERO))
    }

    #[test]
    fn test_connection_ids_are_unique() {
        let ids: HashSet<_> = (0..500)
            .map(|_| Connection::open("db:5432").id().to_string())
            .collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_connection_id_format() {
        let conn = Connection::open("db:5432");
        let parts: Vec<_> = conn.id().split('-').collect();

        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "conn");
        assert!(u64::from_str_radix(parts[1], 16).is_ok());
        assert_eq!(parts[2].len(), 8);
        assert!(conn.to_string().contains("db:5432"));
    }

    #[test]
    fn test_opened_at_records_open_time() {
        let before = Utc::now();
        let conn = Connection::open("db:5432");
        let after = Utc::now();

        assert!(before <= conn.opened_at() && conn.opened_at() <= after);

        let encoded = serde_json::to_value(&conn).unwrap();
        assert_eq!(encoded["id"], conn.id());
        assert_eq!(encoded["opened_at"], serde_json::to_value(conn.opened_at()).unwrap());
    }

    #[test]
    fn test_fail_next_fails_exactly_n_times() {
        let factory = quick_factory();
        factory.fail_next(2);

        assert!(ResourceFactory::create(&factory).is_err());
        assert!(ResourceFactory::create(&factory).is_err());
        assert!(ResourceFactory::create(&factory).is_ok());
        assert_eq!(factory.opened(), 1);
    }

    #[tokio::test]
    async fn test_async_create_honours_failures() {
        let factory = quick_factory();
        factory.fail_next(1);

        tokio_test::assert_err!(AsyncResourceFactory::create(&factory).await);
        let conn = tokio_test::assert_ok!(AsyncResourceFactory::create(&factory).await);
        assert_eq!(conn.endpoint(), factory.endpoint());
    }
}
