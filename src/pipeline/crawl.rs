// src/pipeline/crawl.rs

//! Crawl stage: every enabled source, listings then details.

use std::collections::HashSet;

use futures::future::join_all;

use crate::models::{JobRecord, Source};
use crate::services::{DetailHarvester, Paginator, SourceExtractor, SourceRegistry};
use crate::utils::http::Fetcher;

/// What one source traversal produced.
#[derive(Debug)]
pub struct SourceCrawl {
    pub source: Source,
    pub records: Vec<JobRecord>,
    pub pages: u32,
    pub detail_failures: usize,
}

/// Combined result of crawling all enabled sources.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    pub records: Vec<JobRecord>,
    pub pages: u32,
    pub detail_failures: usize,
    /// Records dropped because an earlier record had the same link
    pub duplicates: usize,
}

/// Walk one source's listing pages, harvesting details page by page.
pub async fn crawl_source(
    extractor: &dyn SourceExtractor,
    fetcher: &dyn Fetcher,
    harvester: &DetailHarvester,
    max_pages: u32,
) -> SourceCrawl {
    let source = extractor.source();
    let mut paginator = Paginator::new(extractor, fetcher, max_pages);
    let mut records = Vec::new();
    let mut detail_failures = 0;

    while let Some(summaries) = paginator.next_page().await {
        let outcome = harvester.harvest(extractor, summaries).await;
        detail_failures += outcome.failures;
        records.extend(outcome.records);
    }

    log::info!(
        "{}: {} jobs from {} pages ({} without details)",
        source,
        records.len(),
        paginator.pages_fetched(),
        detail_failures
    );

    SourceCrawl {
        source,
        records,
        pages: paginator.pages_fetched(),
        detail_failures,
    }
}

/// Crawl every enabled source concurrently and merge the results.
pub async fn crawl_all(
    registry: &SourceRegistry,
    fetcher: &dyn Fetcher,
    harvester: &DetailHarvester,
    max_pages: u32,
) -> CrawlOutcome {
    let extractors = registry.enabled();
    let crawls = join_all(
        extractors
            .iter()
            .map(|extractor| crawl_source(extractor.as_ref(), fetcher, harvester, max_pages)),
    )
    .await;

    let mut outcome = CrawlOutcome::default();
    let mut seen = HashSet::new();
    for crawl in crawls {
        outcome.pages += crawl.pages;
        outcome.detail_failures += crawl.detail_failures;
        for record in crawl.records {
            if seen.insert(record.link.clone()) {
                outcome.records.push(record);
            } else {
                outcome.duplicates += 1;
            }
        }
    }

    if outcome.duplicates > 0 {
        log::debug!("Dropped {} duplicate links", outcome.duplicates);
    }
    outcome
}
