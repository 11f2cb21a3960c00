//! Technopark: paginated JSON API for listings, HTML detail pages.

use async_trait::async_trait;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;

use super::{SourceExtractor, first_text, mailto_email, parse_selector};
use crate::error::Result;
use crate::models::{
    JobDetails, JobSummary, ListingPage, NextPage, PageCursor, Source, TechnoparkConfig,
};
use crate::utils::text::{element_lines, normalize_whitespace};
use crate::utils::with_page;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
struct ListingPayload {
    #[serde(default)]
    data: Option<Vec<ListingJob>>,
    #[serde(default)]
    current_page: Value,
    #[serde(default)]
    last_page: Value,
}

#[derive(Debug, Deserialize)]
struct ListingJob {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    job_title: Option<String>,
    #[serde(default)]
    closing_date: Option<String>,
    #[serde(default)]
    company: Option<CompanyRef>,
}

#[derive(Debug, Deserialize)]
struct CompanyRef {
    #[serde(default)]
    company: Option<String>,
}

/// Page numbers arrive as numbers or numeric strings.
fn page_number(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn job_id(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

struct Selectors {
    description: Selector,
    sidebar: Selector,
    company_name: Selector,
    address: Selector,
    website: Selector,
    mailto: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            description: parse_selector(
                r#"div[class="mb-4 flex w-full flex-col gap-8 pb-12 pt-10 lg:w-2/3"]"#,
            )?,
            sidebar: parse_selector(
                r#"div[class="w-full border-b px-8 pt-8 lg:w-1/3 lg:border-r lg:border-b-0"]"#,
            )?,
            company_name: parse_selector("a.bodybold.text-theme_color_1")?,
            address: parse_selector("p.bodysmall")?,
            website: parse_selector("div.pt-4.pb-4 a")?,
            mailto: parse_selector(r#"a[href^="mailto:"]"#)?,
        })
    }
}

pub struct TechnoparkExtractor {
    listing_url: String,
    detail_url: String,
    selectors: Selectors,
}

impl TechnoparkExtractor {
    pub fn new(config: &TechnoparkConfig) -> Result<Self> {
        Ok(Self {
            listing_url: config.listing_url.clone(),
            detail_url: config.detail_url.clone(),
            selectors: Selectors::new()?,
        })
    }

    fn detail_link(&self, id: &str) -> String {
        format!("{}/{}", self.detail_url.trim_end_matches('/'), id)
    }

    fn company_profile(&self, document: &Html) -> String {
        let Some(sidebar) = document.select(&self.selectors.sidebar).next() else {
            return String::new();
        };

        let or_na = |s: String| if s.is_empty() { NOT_AVAILABLE.to_string() } else { s };

        let name = or_na(first_text(&sidebar, &self.selectors.company_name));
        let address = or_na(
            sidebar
                .select(&self.selectors.address)
                .next()
                .map(|p| element_lines(&p))
                .unwrap_or_default(),
        );
        let website = or_na(
            sidebar
                .select(&self.selectors.website)
                .next()
                .and_then(|a| a.value().attr("href"))
                .map(|href| href.trim().to_string())
                .unwrap_or_default(),
        );

        format!("Company Name: {name}\nAddress: {address}\nWebsite: {website}")
    }
}

#[async_trait]
impl SourceExtractor for TechnoparkExtractor {
    fn source(&self) -> Source {
        Source::Technopark
    }

    fn listing_url(&self, cursor: &PageCursor) -> String {
        with_page(&self.listing_url, cursor.page)
    }

    fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage {
        let payload: ListingPayload = match serde_json::from_str(body) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Malformed Technopark listing at {}: {}", page_url, e);
                return ListingPage::empty();
            }
        };

        let summaries: Vec<JobSummary> = payload
            .data
            .unwrap_or_default()
            .into_iter()
            .filter_map(|job| {
                let id = job_id(&job.id)?;
                Some(JobSummary {
                    company: job
                        .company
                        .and_then(|c| c.company)
                        .map(|c| normalize_whitespace(&c))
                        .unwrap_or_default(),
                    role: job
                        .job_title
                        .map(|t| normalize_whitespace(&t))
                        .unwrap_or_default(),
                    deadline: job
                        .closing_date
                        .map(|d| d.trim().to_string())
                        .unwrap_or_default(),
                    link: self.detail_link(&id),
                })
            })
            .collect();

        // Without both page numbers, keep going until an empty page.
        let next = match (
            page_number(&payload.current_page),
            page_number(&payload.last_page),
        ) {
            (Some(current), Some(last)) if current >= last => NextPage::None,
            _ if summaries.is_empty() => NextPage::None,
            _ => NextPage::Numbered,
        };

        ListingPage { summaries, next }
    }

    fn parse_detail_page(&self, body: &str) -> JobDetails {
        let document = Html::parse_document(body);

        let description = document
            .select(&self.selectors.description)
            .next()
            .map(|el| element_lines(&el))
            .unwrap_or_default();

        JobDetails {
            description,
            company_profile: self.company_profile(&document),
            email: mailto_email(&document, &self.selectors.mailto).unwrap_or_default(),
        }
    }
}
