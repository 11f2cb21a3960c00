// src/services/reconciler.rs

//! Email backfill for stored jobs.
//!
//! Records saved without an email get their detail page fetched again; any
//! address found is written to every sink by `link`. Records that already
//! have an email are never selected, so repeated passes only touch what is
//! still missing.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::models::{JobField, JobRecord};
use crate::services::sources::SourceRegistry;
use crate::storage::PersistenceGateway;
use crate::utils::http::Fetcher;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileSummary {
    pub candidates: usize,
    pub updated: usize,
    pub unresolved: usize,
}

pub struct EmailReconciler {
    gateway: PersistenceGateway,
    registry: SourceRegistry,
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
}

impl EmailReconciler {
    pub fn new(
        gateway: PersistenceGateway,
        registry: SourceRegistry,
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<Semaphore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            gateway,
            registry,
            fetcher,
            limiter,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Run one pass over every stored record missing an email.
    pub async fn run(&self) -> Result<ReconcileSummary> {
        let candidates = self.gateway.local().missing_email()?;
        let mut summary = ReconcileSummary {
            candidates: candidates.len(),
            ..ReconcileSummary::default()
        };
        if candidates.is_empty() {
            log::info!("No stored jobs are missing an email");
            return Ok(summary);
        }
        log::info!("Looking up emails for {} stored jobs", candidates.len());

        let mut lookups = stream::iter(candidates)
            .map(|record| async move {
                let email = self.derive_email(&record).await;
                (record, email)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((record, email)) = lookups.next().await {
            let Some(email) = email else {
                summary.unresolved += 1;
                continue;
            };
            match self
                .gateway
                .update_field(&record.link, JobField::Email, &email)
                .await
            {
                Ok(true) => {
                    log::info!("Email for {}: {}", record.link, email);
                    summary.updated += 1;
                }
                Ok(false) => summary.unresolved += 1,
                Err(e) => {
                    log::warn!("Could not store email for {}: {}", record.link, e);
                    summary.unresolved += 1;
                }
            }
        }

        Ok(summary)
    }

    async fn derive_email(&self, record: &JobRecord) -> Option<String> {
        let Some(extractor) = self.registry.get(record.source) else {
            log::warn!("No extractor for {} ({})", record.source, record.link);
            return None;
        };
        let _permit = self.limiter.acquire().await.ok();
        extractor
            .derive_email(self.fetcher.as_ref(), &record.link)
            .await
    }
}
