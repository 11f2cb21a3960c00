// src/services/harvester.rs

//! Concurrent detail-page harvesting.
//!
//! Every in-flight detail fetch holds a permit from a shared semaphore, so the
//! cap holds across sources crawled at the same time. Each future owns its
//! summary; results are paired by ownership, not by completion order.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Semaphore;

use crate::error::FetchFailure;
use crate::models::{JobDetails, JobRecord, JobSummary};
use crate::services::sources::SourceExtractor;
use crate::utils::http::Fetcher;

/// Records harvested from one batch of summaries.
#[derive(Debug, Default)]
pub struct HarvestOutcome {
    pub records: Vec<JobRecord>,
    /// Summaries kept with empty details because their page could not be fetched
    pub failures: usize,
}

pub struct DetailHarvester {
    fetcher: Arc<dyn Fetcher>,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
}

impl DetailHarvester {
    pub fn new(fetcher: Arc<dyn Fetcher>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self::with_limiter(fetcher, Arc::new(Semaphore::new(max_concurrent)), max_concurrent)
    }

    /// Harvester sharing an existing limiter.
    pub fn with_limiter(
        fetcher: Arc<dyn Fetcher>,
        limiter: Arc<Semaphore>,
        max_concurrent: usize,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Fetch and parse the detail page of every summary.
    pub async fn harvest(
        &self,
        extractor: &dyn SourceExtractor,
        summaries: Vec<JobSummary>,
    ) -> HarvestOutcome {
        let source = extractor.source();
        let mut outcome = HarvestOutcome::default();

        let mut details = stream::iter(summaries)
            .map(|summary| async move {
                let result = self.fetch_details(extractor, &summary.link).await;
                (summary, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((summary, result)) = details.next().await {
            let details = match result {
                Ok(details) => details,
                Err(failure) => {
                    outcome.failures += 1;
                    log::warn!(
                        "{}: keeping {} without details ({})",
                        source,
                        summary.link,
                        failure
                    );
                    JobDetails::default()
                }
            };
            outcome
                .records
                .push(JobRecord::from_parts(summary, source, details));
        }

        outcome
    }

    async fn fetch_details(
        &self,
        extractor: &dyn SourceExtractor,
        link: &str,
    ) -> Result<JobDetails, FetchFailure> {
        // The semaphore is never closed, so acquire only fails on shutdown.
        let _permit = self.limiter.acquire().await.ok();
        extractor.fetch_details(self.fetcher.as_ref(), link).await
    }
}
