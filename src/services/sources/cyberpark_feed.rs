//! Cyberpark Kerala: a single RSS document of job posts.
//!
//! Feed items carry no contact block, so there is no detail page to harvest
//! and nothing for the email backfill to re-derive.

use async_trait::async_trait;
use rss::{Channel, Item};

use super::SourceExtractor;
use crate::error::FetchFailure;
use crate::models::{
    CyberparkFeedConfig, JobDetails, JobSummary, ListingPage, NextPage, PageCursor, Source,
};
use crate::utils::http::Fetcher;
use crate::utils::resolve;
use crate::utils::text::normalize_whitespace;

const NOT_AVAILABLE: &str = "N/A";

/// WP Job Manager's feed namespace prefix and its company element.
const JOB_LISTING_PREFIX: &str = "job_listing";
const COMPANY_ELEMENT: &str = "company";

pub struct CyberparkFeedExtractor {
    feed_url: String,
}

impl CyberparkFeedExtractor {
    pub fn new(config: &CyberparkFeedConfig) -> Self {
        Self {
            feed_url: config.feed_url.clone(),
        }
    }

    fn summary(&self, item: &Item, page_url: &str) -> Option<JobSummary> {
        let link = item.link().map(str::trim).filter(|l| !l.is_empty())?;

        let or_na = |s: String| if s.is_empty() { NOT_AVAILABLE.to_string() } else { s };

        Some(JobSummary {
            company: or_na(company(item)),
            role: or_na(item.title().map(normalize_whitespace).unwrap_or_default()),
            deadline: item
                .pub_date()
                .map(|d| d.trim().to_string())
                .unwrap_or_default(),
            link: resolve(page_url, link),
        })
    }
}

/// Company from the job-listing extension, else the item's Dublin Core creator.
fn company(item: &Item) -> String {
    let listed = item
        .extensions()
        .get(JOB_LISTING_PREFIX)
        .and_then(|elements| elements.get(COMPANY_ELEMENT))
        .and_then(|values| values.first())
        .and_then(|ext| ext.value())
        .map(normalize_whitespace)
        .filter(|c| !c.is_empty());

    listed
        .or_else(|| {
            item.dublin_core_ext()
                .and_then(|dc| dc.creators().first())
                .map(|c| normalize_whitespace(c))
        })
        .unwrap_or_default()
}

#[async_trait]
impl SourceExtractor for CyberparkFeedExtractor {
    fn source(&self) -> Source {
        Source::CyberparkFeed
    }

    fn listing_url(&self, _cursor: &PageCursor) -> String {
        self.feed_url.clone()
    }

    fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage {
        let channel = match Channel::read_from(body.as_bytes()) {
            Ok(channel) => channel,
            Err(e) => {
                log::warn!("Malformed Cyberpark feed at {}: {}", page_url, e);
                return ListingPage::empty();
            }
        };

        let summaries = channel
            .items()
            .iter()
            .filter_map(|item| self.summary(item, page_url))
            .collect();

        ListingPage {
            summaries,
            next: NextPage::None,
        }
    }

    fn parse_detail_page(&self, _body: &str) -> JobDetails {
        JobDetails::default()
    }

    async fn fetch_details(
        &self,
        _fetcher: &dyn Fetcher,
        _link: &str,
    ) -> std::result::Result<JobDetails, FetchFailure> {
        Ok(JobDetails::default())
    }

    async fn derive_email(&self, _fetcher: &dyn Fetcher, _link: &str) -> Option<String> {
        None
    }
}
