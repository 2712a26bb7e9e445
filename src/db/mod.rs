//! Query access layer for httpsql.
//!
//! [`Database`] is the public handle. Queries flow through a per-handle
//! [`QueryCoordinator`] (cache and single-flight), a [`Transport`] (one HTTP
//! round trip) and the decoder (wire cells to typed [`Value`]s).

mod coordinator;
mod decode;
mod mock;
mod transport;
mod types;

pub use coordinator::QueryCoordinator;
pub use decode::{decode_result, WireType};
pub use mock::{FailingTransport, MockTransport};
pub use transport::{HttpTransport, Transport, API_KEY_HEADER};
pub use types::{ColumnMeta, Row, Statistics, Table, Value, WireResult};

use crate::config::ClientOptions;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Query issued at connect time to prove the endpoint is reachable.
pub const PROBE_QUERY: &str = "SELECT 1";

/// A connection handle to a query endpoint.
///
/// Each handle owns its own cache and in-flight registry; dropping the handle
/// discards both.
pub struct Database {
    options: Option<ClientOptions>,
    coordinator: QueryCoordinator,
}

impl Database {
    /// Connects over HTTP and verifies the endpoint with a probe query.
    ///
    /// No handle is returned if the options are invalid or the probe fails.
    pub async fn connect(options: ClientOptions) -> Result<Self> {
        let transport = HttpTransport::new(&options)?;
        info!("Connecting to {}", transport.base_url());

        let mut db =
            Self::connect_with_transport(Arc::new(transport), options.effective_cache_ttl())
                .await?;
        db.options = Some(options);
        Ok(db)
    }

    /// Connects through an arbitrary transport, running the same probe.
    pub async fn connect_with_transport(
        transport: Arc<dyn Transport>,
        cache_ttl: Option<Duration>,
    ) -> Result<Self> {
        let coordinator = QueryCoordinator::new(transport, cache_ttl);
        coordinator.query(PROBE_QUERY).await?;

        Ok(Self {
            options: None,
            coordinator,
        })
    }

    /// Returns the options this handle was connected with, if it was built
    /// by [`Database::connect`].
    pub fn options(&self) -> Option<&ClientOptions> {
        self.options.as_ref()
    }

    /// Returns the coordinator backing this handle.
    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    /// Runs `sql` and returns every decoded row.
    pub async fn all(&self, sql: &str) -> Result<Arc<Table>> {
        self.coordinator.query(sql).await
    }

    /// Runs `sql`, then calls `callback` once per row in row order.
    pub async fn each<F>(&self, sql: &str, mut callback: F) -> Result<()>
    where
        F: FnMut(&Row),
    {
        let table = self.all(sql).await?;
        table.iter().for_each(|row| callback(row));
        Ok(())
    }

    /// Runs a statement for its side effects, discarding any rows.
    pub async fn exec(&self, sql: &str) -> Result<()> {
        self.all(sql).await.map(|_| ())
    }

    /// Alias of [`Database::exec`].
    pub async fn run(&self, sql: &str) -> Result<()> {
        self.exec(sql).await
    }
}
