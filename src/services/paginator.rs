// src/services/paginator.rs

//! Page-by-page traversal of one source.
//!
//! `FETCH_PAGE(1) -> PARSE -> HAS_MORE ? FETCH_PAGE(n + 1) : STOP`. A failed
//! fetch, an empty page, or a missing "has more" signal stops the traversal;
//! pages already returned stay valid.

use crate::models::{JobSummary, PageCursor};
use crate::services::sources::SourceExtractor;
use crate::utils::http::Fetcher;

pub struct Paginator<'a> {
    extractor: &'a dyn SourceExtractor,
    fetcher: &'a dyn Fetcher,
    cursor: PageCursor,
    max_pages: u32,
    pages_fetched: u32,
    done: bool,
}

impl<'a> Paginator<'a> {
    pub fn new(extractor: &'a dyn SourceExtractor, fetcher: &'a dyn Fetcher, max_pages: u32) -> Self {
        Self {
            extractor,
            fetcher,
            cursor: PageCursor::start(),
            max_pages,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Number of listing fetches issued so far.
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Fetch and parse the next listing page. `None` once traversal is over.
    pub async fn next_page(&mut self) -> Option<Vec<JobSummary>> {
        if self.done {
            return None;
        }
        if self.pages_fetched >= self.max_pages {
            log::warn!(
                "{}: stopping after {} pages (page cap reached)",
                self.extractor.source(),
                self.pages_fetched
            );
            self.done = true;
            return None;
        }

        let url = self.extractor.listing_url(&self.cursor);
        self.pages_fetched += 1;

        let body = match self.fetcher.fetch(&url).await {
            Ok(body) => body,
            Err(failure) => {
                log::warn!(
                    "{}: page {} unavailable ({}), ending traversal",
                    self.extractor.source(),
                    self.cursor.page,
                    failure
                );
                self.done = true;
                return None;
            }
        };

        let page = self.extractor.parse_listing_page(&body, &url);
        if page.summaries.is_empty() {
            log::info!(
                "{}: page {} has no jobs, ending traversal",
                self.extractor.source(),
                self.cursor.page
            );
            self.done = true;
            return None;
        }

        log::info!(
            "{}: page {} listed {} jobs",
            self.extractor.source(),
            self.cursor.page,
            page.summaries.len()
        );

        if !self.cursor.advance(&page.next) {
            self.done = true;
        }
        Some(page.summaries)
    }

    /// Drain every page into one flat list.
    pub async fn collect_all(&mut self) -> Vec<JobSummary> {
        let mut all = Vec::new();
        while let Some(summaries) = self.next_page().await {
            all.extend(summaries);
        }
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchFailure;
    use crate::models::{InfoparkConfig, TechnoparkConfig, UlCyberparkConfig};
    use crate::services::sources::{InfoparkExtractor, TechnoparkExtractor, UlCyberparkExtractor};
    use crate::utils::http::testing::StubFetcher;

    const INFOPARK: &str = "https://infopark.in/companies/job-search";
    const TECHNOPARK: &str = "https://technopark.org/api/paginated-jobs";

    fn infopark_page(id: u32, with_next: bool) -> String {
        let next = if with_next {
            r#"<ul><li class="page-item"><a rel="next" href="?page=2">Next</a></li></ul>"#
        } else {
            ""
        };
        format!(
            r#"<table id="job-list"><tbody><tr>
                 <td class="head">Role {id}</td><td class="date">Co {id}</td><td>01-01-2031</td>
                 <td class="btn-sec"><a href="/companies/job-details/{id}">View</a></td>
               </tr></tbody></table>{next}"#
        )
    }

    fn technopark_page(current: u32, last: u32, ids: &[u32]) -> String {
        let data: Vec<String> = ids
            .iter()
            .map(|id| {
                format!(r#"{{"id": {id}, "job_title": "T{id}", "closing_date": "2031-01-01", "company": {{"company": "C{id}"}}}}"#)
            })
            .collect();
        format!(
            r#"{{"current_page": {current}, "last_page": {last}, "data": [{}]}}"#,
            data.join(",")
        )
    }

    #[tokio::test]
    async fn test_infopark_stops_when_next_anchor_missing() {
        let fetcher = StubFetcher::new()
            .route(format!("{INFOPARK}?page=1"), infopark_page(1, true))
            .route(format!("{INFOPARK}?page=2"), infopark_page(2, false))
            .route(format!("{INFOPARK}?page=3"), infopark_page(3, false));
        let extractor = InfoparkExtractor::new(&InfoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        let summaries = paginator.collect_all().await;

        assert_eq!(summaries.len(), 2);
        assert_eq!(paginator.pages_fetched(), 2);
        assert_eq!(fetcher.calls().len(), 2);
        assert_eq!(fetcher.call_count(&format!("{INFOPARK}?page=3")), 0);
    }

    #[tokio::test]
    async fn test_technopark_stops_on_last_page() {
        let fetcher = StubFetcher::new()
            .route(format!("{TECHNOPARK}?page=1"), technopark_page(1, 2, &[1, 2]))
            .route(format!("{TECHNOPARK}?page=2"), technopark_page(2, 2, &[3]));
        let extractor = TechnoparkExtractor::new(&TechnoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        let summaries = paginator.collect_all().await;

        assert_eq!(summaries.len(), 3);
        assert_eq!(
            fetcher.calls(),
            vec![format!("{TECHNOPARK}?page=1"), format!("{TECHNOPARK}?page=2")]
        );
    }

    #[tokio::test]
    async fn test_first_page_failure_yields_nothing() {
        let fetcher =
            StubFetcher::new().fail(format!("{TECHNOPARK}?page=1"), FetchFailure::Timeout);
        let extractor = TechnoparkExtractor::new(&TechnoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        assert!(paginator.collect_all().await.is_empty());
        assert!(paginator.next_page().await.is_none());
        assert_eq!(fetcher.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_later_failure_keeps_earlier_pages() {
        let fetcher = StubFetcher::new()
            .route(format!("{TECHNOPARK}?page=1"), technopark_page(1, 5, &[1, 2]))
            .fail(format!("{TECHNOPARK}?page=2"), FetchFailure::Status(502));
        let extractor = TechnoparkExtractor::new(&TechnoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        let summaries = paginator.collect_all().await;
        assert_eq!(summaries.len(), 2);
        assert_eq!(paginator.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn test_empty_data_stops() {
        let fetcher = StubFetcher::new()
            .route(format!("{TECHNOPARK}?page=1"), technopark_page(1, 9, &[1]))
            .route(format!("{TECHNOPARK}?page=2"), technopark_page(2, 9, &[]));
        let extractor = TechnoparkExtractor::new(&TechnoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        assert_eq!(paginator.collect_all().await.len(), 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_page_cap() {
        let fetcher = StubFetcher::new()
            .route(format!("{INFOPARK}?page=1"), infopark_page(1, true))
            .route(format!("{INFOPARK}?page=2"), infopark_page(2, true))
            .route(format!("{INFOPARK}?page=3"), infopark_page(3, true));
        let extractor = InfoparkExtractor::new(&InfoparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 2);
        assert_eq!(paginator.collect_all().await.len(), 2);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_ulcyberpark_follows_next_link() {
        let page = |n: u32, next: &str| {
            format!(
                r#"<div class="table-responsive-sm table-job"><table class="table"><tr>
                     <td><a class="btn-1">Job {n}</a></td><td><a class="btn-1">Co</a></td>
                     <td><a href="/jobs/view/{n}">Details</a></td></tr></table></div>{next}"#
            )
        };
        let fetcher = StubFetcher::new()
            .route(
                "https://www.ulcyberpark.com/jobs/index",
                page(1, r#"<ul class="pagination"><li><a rel="next" href="/jobs/index?page=2">2</a></li></ul>"#),
            )
            .route("https://www.ulcyberpark.com/jobs/index?page=2", page(2, ""));
        let extractor = UlCyberparkExtractor::new(&UlCyberparkConfig::default()).unwrap();

        let mut paginator = Paginator::new(&extractor, &fetcher, 50);
        let links: Vec<String> = paginator
            .collect_all()
            .await
            .into_iter()
            .map(|s| s.link)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://www.ulcyberpark.com/jobs/view/1".to_string(),
                "https://www.ulcyberpark.com/jobs/view/2".to_string(),
            ]
        );
    }
}
