//! Infopark: HTML job table, `?page=N` pagination, separate company profile page.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{SourceExtractor, first_text, parse_selector};
use crate::error::{FetchFailure, Result};
use crate::models::{
    InfoparkConfig, JobDetails, JobSummary, ListingPage, NextPage, PageCursor, Source,
};
use crate::utils::http::Fetcher;
use crate::utils::text::{element_lines, element_text, find_email};
use crate::utils::{last_path_segment, resolve, with_page};

struct Selectors {
    row: Selector,
    role: Selector,
    company: Selector,
    deadline: Selector,
    link: Selector,
    next: Selector,
    description: Selector,
    contact: Selector,
    contact_name: Selector,
    anchor: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector("#job-list tbody tr")?,
            role: parse_selector("td.head")?,
            company: parse_selector("td.date")?,
            deadline: parse_selector("td:nth-child(3)")?,
            link: parse_selector("td.btn-sec a[href]")?,
            next: parse_selector("li.page-item a[rel='next']")?,
            description: parse_selector("div.deatil-box")?,
            contact: parse_selector("div.carer-box div.con")?,
            contact_name: parse_selector("h4")?,
            anchor: parse_selector("a")?,
        })
    }
}

/// Contact block of an Infopark company profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyContact {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
}

impl CompanyContact {
    pub fn to_profile(&self) -> String {
        format!(
            "Company Name: {}\nAddress: {}\nPhone: {}\nEmail: {}\nWebsite: {}",
            self.name, self.address, self.phone, self.email, self.website
        )
    }
}

pub struct InfoparkExtractor {
    listing_url: String,
    profile_url: String,
    selectors: Selectors,
}

impl InfoparkExtractor {
    pub fn new(config: &InfoparkConfig) -> Result<Self> {
        Ok(Self {
            listing_url: config.listing_url.clone(),
            profile_url: config.profile_url.clone(),
            selectors: Selectors::new()?,
        })
    }

    /// Company profile URL for a job link.
    pub fn profile_url_for(&self, link: &str) -> Option<String> {
        let company_id = last_path_segment(link)?;
        Some(format!(
            "{}/{}",
            self.profile_url.trim_end_matches('/'),
            company_id
        ))
    }

    /// Parse the contact block. `None` when the page has no contact container.
    pub fn parse_company_profile(&self, body: &str) -> Option<CompanyContact> {
        let document = Html::parse_document(body);
        let contact = document.select(&self.selectors.contact).next()?;

        let spans: Vec<ElementRef<'_>> = contact
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "span")
            .collect();

        let website = spans
            .get(3)
            .map(|span| {
                span.select(&self.selectors.anchor)
                    .next()
                    .map(|a| element_text(&a))
                    .unwrap_or_else(|| element_text(span))
            })
            .unwrap_or_default();

        Some(CompanyContact {
            name: first_text(&contact, &self.selectors.contact_name),
            address: spans.first().map(element_lines).unwrap_or_default(),
            phone: spans.get(1).map(element_text).unwrap_or_default(),
            email: spans.get(2).map(element_text).unwrap_or_default(),
            website,
        })
    }
}

#[async_trait]
impl SourceExtractor for InfoparkExtractor {
    fn source(&self) -> Source {
        Source::Infopark
    }

    fn listing_url(&self, cursor: &PageCursor) -> String {
        with_page(&self.listing_url, cursor.page)
    }

    fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage {
        let document = Html::parse_document(body);
        let sel = &self.selectors;

        let summaries = document
            .select(&sel.row)
            .filter_map(|row| {
                let href = row
                    .select(&sel.link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::trim)
                    .filter(|href| !href.is_empty());
                let Some(href) = href else {
                    log::debug!("Skipping Infopark row without a detail link");
                    return None;
                };

                Some(JobSummary {
                    company: first_text(&row, &sel.company),
                    role: first_text(&row, &sel.role),
                    deadline: first_text(&row, &sel.deadline),
                    link: resolve(page_url, href),
                })
            })
            .collect();

        let next = if document.select(&sel.next).next().is_some() {
            NextPage::Numbered
        } else {
            NextPage::None
        };

        ListingPage { summaries, next }
    }

    fn parse_detail_page(&self, body: &str) -> JobDetails {
        let document = Html::parse_document(body);
        let description = document
            .select(&self.selectors.description)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_default();
        let email = find_email(&description).unwrap_or_default();

        JobDetails {
            description,
            company_profile: String::new(),
            email,
        }
    }

    async fn fetch_details(
        &self,
        fetcher: &dyn Fetcher,
        link: &str,
    ) -> std::result::Result<JobDetails, FetchFailure> {
        let body = fetcher.fetch(link).await?;
        let mut details = self.parse_detail_page(&body);

        let Some(profile_url) = self.profile_url_for(link) else {
            return Ok(details);
        };
        // A missing profile page only costs the profile; the detail stands.
        if let Ok(profile_body) = fetcher.fetch(&profile_url).await {
            if let Some(contact) = self.parse_company_profile(&profile_body) {
                details.company_profile = contact.to_profile();
                if let Some(email) = find_email(&contact.email) {
                    details.email = email;
                }
            }
        }
        Ok(details)
    }
}
