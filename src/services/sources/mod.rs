//! Source-specific extraction rules.
//!
//! Each portal gets one extractor. The crawl picks an extractor once per
//! traversal and never compares source names afterwards.

mod cyberpark_feed;
mod infopark;
mod technopark;
mod ulcyberpark;

use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, FetchFailure, Result};
use crate::models::{JobDetails, ListingPage, PageCursor, Source, SourcesConfig};
use crate::utils::http::Fetcher;
use crate::utils::text::{element_text, find_email, mailto_address};

pub use cyberpark_feed::CyberparkFeedExtractor;
pub use infopark::InfoparkExtractor;
pub use technopark::TechnoparkExtractor;
pub use ulcyberpark::UlCyberparkExtractor;

/// Listing and detail extraction for one portal.
#[async_trait]
pub trait SourceExtractor: Send + Sync {
    fn source(&self) -> Source;

    /// URL of the listing page the cursor points at.
    fn listing_url(&self, cursor: &PageCursor) -> String;

    /// Parse a listing body fetched from `page_url`.
    fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage;

    /// Parse a detail page body.
    fn parse_detail_page(&self, body: &str) -> JobDetails;

    /// Fetch everything known about one job.
    async fn fetch_details(
        &self,
        fetcher: &dyn Fetcher,
        link: &str,
    ) -> std::result::Result<JobDetails, FetchFailure> {
        let body = fetcher.fetch(link).await?;
        Ok(self.parse_detail_page(&body))
    }

    /// Re-derive a missing email from the live detail page.
    async fn derive_email(&self, fetcher: &dyn Fetcher, link: &str) -> Option<String> {
        let body = fetcher.fetch(link).await.ok()?;
        let email = self.parse_detail_page(&body).email;
        if email.trim().is_empty() {
            None
        } else {
            Some(email)
        }
    }
}

/// The set of known extractors plus which ones are crawled.
#[derive(Clone)]
pub struct SourceRegistry {
    extractors: Vec<Arc<dyn SourceExtractor>>,
    enabled: Vec<Source>,
}

impl SourceRegistry {
    /// Build every extractor; crawl only those enabled in config.
    pub fn from_config(config: &SourcesConfig) -> Result<Self> {
        let extractors: Vec<Arc<dyn SourceExtractor>> = vec![
            Arc::new(InfoparkExtractor::new(&config.infopark)?),
            Arc::new(TechnoparkExtractor::new(&config.technopark)?),
            Arc::new(UlCyberparkExtractor::new(&config.ulcyberpark)?),
            Arc::new(CyberparkFeedExtractor::new(&config.cyberpark_feed)),
        ];

        let mut enabled = Vec::new();
        if config.infopark.enabled {
            enabled.push(Source::Infopark);
        }
        if config.technopark.enabled {
            enabled.push(Source::Technopark);
        }
        if config.ulcyberpark.enabled {
            enabled.push(Source::UlCyberpark);
        }
        if config.cyberpark_feed.enabled {
            enabled.push(Source::CyberparkFeed);
        }

        Ok(Self {
            extractors,
            enabled,
        })
    }

    /// Registry over explicit extractors, all enabled.
    pub fn with_extractors(extractors: Vec<Arc<dyn SourceExtractor>>) -> Self {
        let enabled = extractors.iter().map(|e| e.source()).collect();
        Self {
            extractors,
            enabled,
        }
    }

    /// Extractor for a stored record's source, enabled or not.
    pub fn get(&self, source: Source) -> Option<Arc<dyn SourceExtractor>> {
        self.extractors
            .iter()
            .find(|e| e.source() == source)
            .cloned()
    }

    /// Extractors to crawl, in registry order.
    pub fn enabled(&self) -> Vec<Arc<dyn SourceExtractor>> {
        self.extractors
            .iter()
            .filter(|e| self.enabled.contains(&e.source()))
            .cloned()
            .collect()
    }
}

pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

/// Normalized text of the first match, or empty.
pub(crate) fn first_text(scope: &ElementRef<'_>, selector: &Selector) -> String {
    scope
        .select(selector)
        .next()
        .map(|el| element_text(&el))
        .unwrap_or_default()
}

/// Email from the first `mailto:` anchor: its visible text when that holds an
/// address, else the anchor target.
pub(crate) fn mailto_email(document: &Html, selector: &Selector) -> Option<String> {
    let anchor = document.select(selector).next()?;
    find_email(&element_text(&anchor))
        .or_else(|| anchor.value().attr("href").and_then(mailto_address))
}
