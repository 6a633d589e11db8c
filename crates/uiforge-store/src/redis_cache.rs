use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use tokio::sync::Mutex;
use tokio::time::timeout;
use uiforge_session::FastCache;

use crate::{Result, StoreError};

/// Default per-call timeout for Redis operations.
pub const DEFAULT_REDIS_TIMEOUT: Duration = Duration::from_millis(500);

/// Fast cache backed by Redis.
///
/// One multiplexed connection is opened lazily and shared by all calls. A
/// call that fails at the connection level or times out drops it, and the
/// next call reconnects. Each call is bounded by the configured timeout and
/// never retried.
pub struct RedisCache {
    client: redis::Client,
    conn: Mutex<Option<MultiplexedConnection>>,
    timeout: Duration,
}

impl RedisCache {
    /// Create a cache for the server at `url` (e.g. `redis://127.0.0.1/`).
    ///
    /// No connection is made until the first call.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            timeout,
        })
    }

    async fn connection(&self) -> Result<MultiplexedConnection> {
        let mut slot = self.conn.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }
        let conn = self.client.get_multiplexed_async_connection().await?;
        *slot = Some(conn.clone());
        Ok(conn)
    }

    /// Forget the shared connection so the next call opens a new one.
    async fn reset_connection(&self) {
        if self.conn.lock().await.take().is_some() {
            tracing::warn!("Dropped Redis connection, reconnecting on next call");
        }
    }

    /// Run one command under the client timeout.
    async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = redis::RedisResult<T>>,
    {
        let call = async {
            let conn = self.connection().await?;
            Ok::<T, StoreError>(op(conn).await?)
        };
        let result = match timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        };
        if let Err(ref e) = result
            && breaks_connection(e)
        {
            self.reset_connection().await;
        }
        result
    }

    /// Check connectivity with a PING.
    pub async fn ping(&self) -> Result<()> {
        let _pong: String = self
            .run(|mut conn| async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FastCache for RedisCache {
    async fn get(&self, key: &str) -> uiforge_session::Result<Option<String>> {
        let value: Option<String> = self
            .run(|mut conn| async move { conn.get(key).await })
            .await?;
        Ok(value)
    }

    async fn get_many(&self, keys: &[String]) -> uiforge_session::Result<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        // Explicit MGET: a single-key MGET must still return a list.
        let values: Vec<Option<String>> = self
            .run(|mut conn| async move { redis::cmd("MGET").arg(keys).query_async(&mut conn).await })
            .await?;
        Ok(values)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> uiforge_session::Result<()> {
        let secs = ttl.as_secs().max(1);
        let _: () = self
            .run(|mut conn| async move { conn.set_ex(key, value, secs).await })
            .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> uiforge_session::Result<()> {
        let _: () = self
            .run(|mut conn| async move { conn.del(key).await })
            .await?;
        Ok(())
    }

    async fn keys_with_prefix(&self, prefix: &str) -> uiforge_session::Result<Vec<String>> {
        let pattern = format!("{}*", escape_glob(prefix));
        // TODO: iterate with SCAN once keyspaces grow past a few thousand keys.
        let keys: Vec<String> = self
            .run(|mut conn| async move { conn.keys(pattern).await })
            .await?;
        Ok(keys)
    }

    fn name(&self) -> &str {
        "redis"
    }
}

/// Whether `err` leaves the shared connection unusable.
fn breaks_connection(err: &StoreError) -> bool {
    match err {
        StoreError::Timeout(_) => true,
        StoreError::Redis(e) => {
            e.is_io_error() || e.is_connection_dropped() || e.is_unrecoverable_error()
        }
        _ => false,
    }
}

/// Escape Redis glob metacharacters so `s` matches literally.
fn escape_glob(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
