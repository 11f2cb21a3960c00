// src/pipeline/reconcile.rs

//! Standalone email reconciliation, without crawling.

use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::error::Result;
use crate::models::Config;
use crate::services::{EmailReconciler, ReconcileSummary, SourceRegistry};
use crate::storage::PersistenceGateway;
use crate::utils::http::Fetcher;
use crate::utils::log;

/// Backfill missing emails for jobs already in the local store.
pub async fn run_reconcile(
    config: &Config,
    registry: &SourceRegistry,
    fetcher: Arc<dyn Fetcher>,
    gateway: &PersistenceGateway,
) -> Result<ReconcileSummary> {
    log::header("Email reconciliation");
    gateway.local().init_schema()?;

    let max_concurrent = config.crawler.max_concurrent.max(1);
    let reconciler = EmailReconciler::new(
        gateway.clone(),
        registry.clone(),
        fetcher,
        Arc::new(Semaphore::new(max_concurrent)),
        max_concurrent,
    );
    let summary = reconciler.run().await?;

    log::summary(
        "Reconcile",
        &[
            ("Candidates", summary.candidates.to_string()),
            ("Updated", summary.updated.to_string()),
            ("Unresolved", summary.unresolved.to_string()),
        ],
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalStore;
    use crate::utils::http::testing::StubFetcher;

    #[tokio::test]
    async fn test_reconcile_on_fresh_store_is_a_no_op() {
        let gateway = PersistenceGateway::new(Arc::new(LocalStore::open_in_memory().unwrap()), None);
        let config = Config::default();
        let registry = SourceRegistry::from_config(&config.sources).unwrap();
        let fetcher = Arc::new(StubFetcher::new());

        let summary = run_reconcile(&config, &registry, fetcher.clone(), &gateway)
            .await
            .unwrap();
        assert_eq!(summary, ReconcileSummary::default());
        assert!(fetcher.calls().is_empty());
    }
}
