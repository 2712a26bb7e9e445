//! Per-connection query coordination.
//!
//! For every SQL text the coordinator either serves a fresh cached table,
//! joins the round trip already in flight for the same text, or starts a new
//! one. Keys are the raw SQL text; no normalization is applied.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use super::decode::decode_result;
use super::transport::Transport;
use super::types::Table;
use crate::error::{HttpSqlError, Result};

/// An in-flight round trip, awaitable by any number of callers.
type PendingQuery = Shared<BoxFuture<'static, Result<Arc<Table>>>>;

struct CacheEntry {
    timestamp: Instant,
    table: Arc<Table>,
}

#[derive(Default)]
struct CoordinatorState {
    cache: HashMap<String, CacheEntry>,
    pending: HashMap<String, PendingQuery>,
}

/// Owns the cache and the in-flight registry of one connection.
///
/// Nothing here is shared between connections. The cache has no size bound;
/// stale entries are only replaced when their SQL text is queried again.
pub struct QueryCoordinator {
    transport: Arc<dyn Transport>,
    cache_ttl: Option<Duration>,
    state: Arc<Mutex<CoordinatorState>>,
}

impl QueryCoordinator {
    /// Creates a coordinator. A `None` or zero TTL disables caching.
    pub fn new(transport: Arc<dyn Transport>, cache_ttl: Option<Duration>) -> Self {
        Self {
            transport,
            cache_ttl: cache_ttl.filter(|ttl| !ttl.is_zero()),
            state: Arc::new(Mutex::new(CoordinatorState::default())),
        }
    }

    /// Returns the effective cache TTL.
    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl
    }

    /// Runs `sql`, deduplicating concurrent identical requests.
    ///
    /// Every caller that joins an in-flight round trip observes the same
    /// table or the same error as the caller that started it.
    pub async fn query(&self, sql: &str) -> Result<Arc<Table>> {
        let pending = {
            let mut state = self.lock_state()?;

            if let Some(ttl) = self.cache_ttl {
                if let Some(entry) = state.cache.get(sql) {
                    if entry.timestamp.elapsed() < ttl {
                        debug!("Cache hit for query: {}", sql);
                        return Ok(Arc::clone(&entry.table));
                    }
                }
            }

            match state.pending.get(sql) {
                Some(pending) => {
                    debug!("Joining in-flight query: {}", sql);
                    pending.clone()
                }
                None => {
                    debug!("Starting round trip for query: {}", sql);
                    let pending = self.start(sql);
                    state.pending.insert(sql.to_string(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of cache entries, fresh or stale.
    pub fn cached_entries(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.cache.len())
            .unwrap_or_default()
    }

    /// Number of round trips currently in flight.
    pub fn pending_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.pending.len())
            .unwrap_or_default()
    }

    /// Drops every cache entry. In-flight round trips are unaffected.
    pub fn clear_cache(&self) -> Result<()> {
        self.lock_state()?.cache.clear();
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, CoordinatorState>> {
        self.state
            .lock()
            .map_err(|_| HttpSqlError::internal("coordinator state lock poisoned"))
    }

    /// Spawns the round trip for `sql` so it runs to completion even if
    /// every caller stops waiting. The task settles its own registry entry.
    fn start(&self, sql: &str) -> PendingQuery {
        let transport = Arc::clone(&self.transport);
        let state = Arc::clone(&self.state);
        let cache_ttl = self.cache_ttl;
        let key = sql.to_string();

        let task = {
            let state = Arc::clone(&state);
            let key = key.clone();
            tokio::spawn(async move {
                let result = fetch_and_decode(transport.as_ref(), &key).await;

                if let Ok(mut state) = state.lock() {
                    state.pending.remove(&key);
                    if let (Ok(table), Some(_)) = (&result, cache_ttl) {
                        state.cache.insert(
                            key,
                            CacheEntry {
                                timestamp: Instant::now(),
                                table: Arc::clone(table),
                            },
                        );
                    }
                }

                result
            })
        };

        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => {
                    if let Ok(mut state) = state.lock() {
                        state.pending.remove(&key);
                    }
                    Err(HttpSqlError::internal(format!("Query task failed: {e}")))
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn fetch_and_decode(transport: &dyn Transport, sql: &str) -> Result<Arc<Table>> {
    let wire = transport.query(sql).await?;
    debug!(
        "Query returned {} rows (elapsed {}s, {} rows read, {} bytes read)",
        wire.rows, wire.statistics.elapsed, wire.statistics.rows_read, wire.statistics.bytes_read
    );
    decode_result(&wire).map(Arc::new)
}
