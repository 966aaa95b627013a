//! Routing table rebuilds.
//!
//! A rebuild reads the admin database, compiles a complete table off to
//! the side and publishes it with one atomic swap. A failed read keeps the
//! previously published generation; dispatch never waits on a rebuild.

use std::time::{Duration, Instant};

use tokio::sync::{broadcast, mpsc};

use crate::observability::metrics;
use crate::store::{DocumentStore, StoreError};
use crate::vhost;

use super::compiler::compile;
use super::table::SharedTable;

/// Rebuilds the routing table from the configuration store.
pub struct Rebuilder<S> {
    store: S,
    table: SharedTable,
    admin_database: String,
    document_prefix: String,
}

impl<S: DocumentStore> Rebuilder<S> {
    pub fn new(store: S, table: SharedTable) -> Self {
        Self {
            store,
            table,
            admin_database: vhost::ADMIN_DATABASE.to_string(),
            document_prefix: vhost::DOCUMENT_PREFIX.to_string(),
        }
    }

    /// Override the admin database and document prefix (tests, unusual
    /// deployments).
    pub fn with_source(mut self, admin_database: &str, document_prefix: &str) -> Self {
        self.admin_database = admin_database.to_string();
        self.document_prefix = document_prefix.to_string();
        self
    }

    /// Load, compile and publish one new table generation.
    ///
    /// Idempotent and safe to call concurrently with dispatch. On error the
    /// previous generation stays published. Returns the number of domains
    /// in the published table.
    pub async fn rebuild(&self) -> Result<usize, StoreError> {
        let started = Instant::now();
        let configs =
            vhost::load_all(&self.store, &self.admin_database, &self.document_prefix).await?;
        let table = compile(&configs);
        let domains = table.len();
        self.table.publish(table);

        metrics::record_rebuild(domains, started.elapsed());
        tracing::info!(
            vhosts = configs.len(),
            domains,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Routing table published"
        );
        Ok(domains)
    }

    /// Background rebuild loop: periodic, plus explicit reload signals
    /// (SIGHUP), until shutdown.
    pub async fn run(
        self,
        interval: Duration,
        mut reload: mpsc::Receiver<()>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately; the caller already did the
        // startup rebuild.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.try_rebuild("interval").await;
                }
                Some(()) = reload.recv() => {
                    self.try_rebuild("reload signal").await;
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Rebuild loop stopping");
                    break;
                }
            }
        }
    }

    async fn try_rebuild(&self, trigger: &str) {
        if let Err(err) = self.rebuild().await {
            tracing::error!(
                trigger,
                error = %err,
                "Rebuild failed, keeping previous routing table"
            );
        }
    }
}
