// src/pipeline/pipeline.rs

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Semaphore;

use crate::error::Result;
use crate::models::Config;
use crate::services::{DeadlineFilter, DetailHarvester, EmailReconciler, SourceRegistry};
use crate::storage::PersistenceGateway;
use crate::utils::http::Fetcher;
use crate::utils::log;

use super::crawl::crawl_all;

/// Knobs for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub skip_reconcile: bool,
    /// Date the deadline filter treats as today; the local date when unset
    pub today: Option<NaiveDate>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub found: usize,
    pub expired: usize,
    pub saved_local: usize,
    pub saved_remote: Option<usize>,
    pub skipped: usize,
    pub emails_backfilled: usize,
}

/// Run the full pipeline: crawl, filter, persist, reconcile.
pub async fn run_pipeline(
    config: &Config,
    registry: &SourceRegistry,
    fetcher: Arc<dyn Fetcher>,
    gateway: &PersistenceGateway,
    options: RunOptions,
) -> Result<RunSummary> {
    log::header("Park jobs crawler");

    let total_steps = if options.skip_reconcile { 3 } else { 4 };
    let mut summary = RunSummary::default();

    log::step(1, total_steps, "Store - Verifying local schema");
    gateway.local().init_schema()?;

    log::step(2, total_steps, "Crawl - Fetching listings and details");
    let max_concurrent = config.crawler.max_concurrent.max(1);
    let limiter = Arc::new(Semaphore::new(max_concurrent));
    let harvester = DetailHarvester::with_limiter(fetcher.clone(), limiter.clone(), max_concurrent);
    let crawl = crawl_all(
        registry,
        fetcher.as_ref(),
        &harvester,
        config.crawler.max_pages,
    )
    .await;
    summary.found = crawl.records.len();

    let filter = options
        .today
        .map(DeadlineFilter::new)
        .unwrap_or_else(DeadlineFilter::local);
    let (records, expired) = filter.apply(crawl.records);
    summary.expired = expired;
    let without_email = records.iter().filter(|r| r.is_missing_email()).count();
    log::sub_item(&format!(
        "{} jobs found, {} expired, {} pages, {} without details, {} without email",
        summary.found, expired, crawl.pages, crawl.detail_failures, without_email
    ));

    if records.is_empty() {
        log::warn("No jobs found");
        report(&summary);
        return Ok(summary);
    }

    log::step(3, total_steps, "Save - Persisting jobs");
    let saved = gateway.save(&records).await?;
    summary.saved_local = saved.local_inserted;
    summary.saved_remote = saved.remote_inserted;
    summary.skipped = saved.skipped();

    if !options.skip_reconcile {
        log::step(4, total_steps, "Reconcile - Backfilling missing emails");
        let reconciler = EmailReconciler::new(
            gateway.clone(),
            registry.clone(),
            fetcher,
            limiter,
            max_concurrent,
        );
        match reconciler.run().await {
            Ok(result) => summary.emails_backfilled = result.updated,
            Err(e) => log::error(&format!("Email reconciliation failed: {e}")),
        }
    }

    report(&summary);
    log::success("Pipeline complete");
    Ok(summary)
}

fn report(summary: &RunSummary) {
    log::summary(
        "Run",
        &[
            ("Found", summary.found.to_string()),
            ("Expired", summary.expired.to_string()),
            ("Saved (local)", summary.saved_local.to_string()),
            (
                "Saved (remote)",
                summary
                    .saved_remote
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ),
            ("Skipped (already stored)", summary.skipped.to_string()),
            ("Emails backfilled", summary.emails_backfilled.to_string()),
        ],
    );
}
