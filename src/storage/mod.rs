//! Job persistence.
//!
//! Records go to the local SQLite store (authoritative) and, when configured,
//! to a remote PostgREST table. Both are keyed by `link`; inserting a link a
//! sink already has is a no-op.

pub mod local;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Config, JobField, JobRecord};

pub use local::LocalStore;
pub use remote::RemoteStore;

/// A destination for job records.
#[async_trait]
pub trait JobSink: Send + Sync {
    /// Short label for logs.
    fn name(&self) -> &'static str;

    /// Insert records whose link the sink does not hold yet.
    /// Returns the number actually inserted.
    async fn insert_or_ignore(&self, records: &[JobRecord]) -> Result<usize>;

    /// Set one field of the record identified by `link`.
    /// Returns whether a record was changed.
    async fn update_field(&self, link: &str, field: JobField, value: &str) -> Result<bool>;
}

/// Outcome of one `save`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub attempted: usize,
    pub local_inserted: usize,
    /// `None` when no remote is configured or the remote write failed
    pub remote_inserted: Option<usize>,
}

impl SaveSummary {
    /// Records the local store already had.
    pub fn skipped(&self) -> usize {
        self.attempted - self.local_inserted
    }
}

/// Fans writes out to the local store and the optional remote.
#[derive(Clone)]
pub struct PersistenceGateway {
    local: Arc<LocalStore>,
    remote: Option<Arc<dyn JobSink>>,
}

impl PersistenceGateway {
    pub fn new(local: Arc<LocalStore>, remote: Option<Arc<dyn JobSink>>) -> Self {
        if remote.is_none() {
            log::info!("No remote store configured; saving locally only");
        }
        Self { local, remote }
    }

    /// Open the configured local store and, when usable, the remote one.
    ///
    /// Only a local store failure is an error. Missing or broken remote
    /// settings leave the gateway local-only.
    pub fn from_config(config: &Config) -> Result<Self> {
        let local = Arc::new(LocalStore::open(&config.storage.database_path)?);
        let remote = RemoteStore::from_config(&config.remote, config.crawler.timeout_secs)
            .map(|store| Arc::new(store) as Arc<dyn JobSink>);
        Ok(Self::new(local, remote))
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Persist a batch. Local failures propagate; remote failures are logged.
    pub async fn save(&self, records: &[JobRecord]) -> Result<SaveSummary> {
        let local_inserted = self.local.insert_or_ignore(records).await?;
        log::info!(
            "Saved {} new jobs locally ({} already stored)",
            local_inserted,
            records.len() - local_inserted
        );

        let remote_inserted = match &self.remote {
            Some(remote) => match remote.insert_or_ignore(records).await {
                Ok(n) => {
                    log::info!("Saved {} new jobs to {} store", n, remote.name());
                    Some(n)
                }
                Err(e) => {
                    log::error!("Saving to {} store failed: {}", remote.name(), e);
                    None
                }
            },
            None => None,
        };

        Ok(SaveSummary {
            attempted: records.len(),
            local_inserted,
            remote_inserted,
        })
    }

    /// Update a field in both sinks. Returns whether the local row changed.
    pub async fn update_field(&self, link: &str, field: JobField, value: &str) -> Result<bool> {
        let changed = self.local.update_field(link, field, value).await?;

        if let Some(remote) = &self.remote {
            match remote.update_field(link, field, value).await {
                Ok(true) => {}
                Ok(false) => log::debug!("{} store has no job {}", remote.name(), link),
                Err(e) => log::warn!(
                    "Updating {} of {} in {} store failed: {}",
                    field.column(),
                    link,
                    remote.name(),
                    e
                ),
            }
        }

        Ok(changed)
    }
}
