//! UL Cyberpark: HTML job table whose pagination links the next page directly.

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use super::{SourceExtractor, first_text, mailto_email, parse_selector};
use crate::error::Result;
use crate::models::{
    JobDetails, JobSummary, ListingPage, NextPage, PageCursor, Source, UlCyberparkConfig,
};
use crate::utils::resolve;
use crate::utils::text::{element_text, find_email};

const NOT_AVAILABLE: &str = "N/A";
const CLOSING_DATE_LABEL: &str = "closing date:";

struct Selectors {
    row: Selector,
    cell: Selector,
    button_link: Selector,
    span: Selector,
    href: Selector,
    pagination: Selector,
    rel_next: Selector,
    after_active: Selector,
    mailto: Selector,
    body: Selector,
}

impl Selectors {
    fn new() -> Result<Self> {
        Ok(Self {
            row: parse_selector("div.table-responsive-sm.table-job table.table tr")?,
            cell: parse_selector("td")?,
            button_link: parse_selector("a.btn-1")?,
            span: parse_selector("span")?,
            href: parse_selector("a[href]")?,
            pagination: parse_selector(r#"ul[class*="pagination"], section[class*="pagination"]"#)?,
            rel_next: parse_selector(r#"a[rel="next"][href]"#)?,
            after_active: parse_selector("li.active + li a[href]")?,
            mailto: parse_selector(r#"a[href^="mailto:"]"#)?,
            body: parse_selector("body")?,
        })
    }
}

pub struct UlCyberparkExtractor {
    listing_url: String,
    selectors: Selectors,
}

impl UlCyberparkExtractor {
    pub fn new(config: &UlCyberparkConfig) -> Result<Self> {
        Ok(Self {
            listing_url: config.listing_url.clone(),
            selectors: Selectors::new()?,
        })
    }

    fn parse_row(&self, row: ElementRef<'_>, page_url: &str) -> Option<JobSummary> {
        let sel = &self.selectors;
        let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
        if cells.len() < 3 {
            return None;
        }

        let or_na = |s: String| if s.is_empty() { NOT_AVAILABLE.to_string() } else { s };

        let role = or_na(first_text(&cells[0], &sel.button_link));
        let deadline = or_na(
            cells[0]
                .select(&sel.span)
                .next()
                .map(|span| closing_date(&element_text(&span)))
                .unwrap_or_default(),
        );
        let company = or_na(first_text(&cells[1], &sel.button_link));

        let href = cells[2]
            .select(&sel.href)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty())?;

        Some(JobSummary {
            company,
            role,
            deadline,
            link: resolve(page_url, href),
        })
    }

    fn next_page(&self, document: &Html, page_url: &str) -> NextPage {
        let sel = &self.selectors;
        let Some(pagination) = document.select(&sel.pagination).next() else {
            return NextPage::None;
        };

        let href = pagination
            .select(&sel.rel_next)
            .next()
            .or_else(|| pagination.select(&sel.after_active).next())
            .and_then(|a| a.value().attr("href"))
            .map(str::trim)
            .filter(|href| !href.is_empty() && !href.starts_with('#'));

        match href.map(|href| resolve(page_url, href)) {
            Some(next) if next != page_url => NextPage::Url(next),
            _ => NextPage::None,
        }
    }
}

/// Text after the "closing date:" label, or the whole text when there is none.
fn closing_date(text: &str) -> String {
    match text.to_ascii_lowercase().rfind(CLOSING_DATE_LABEL) {
        Some(idx) => text[idx + CLOSING_DATE_LABEL.len()..].trim().to_string(),
        None => text.trim().to_string(),
    }
}

#[async_trait]
impl SourceExtractor for UlCyberparkExtractor {
    fn source(&self) -> Source {
        Source::UlCyberpark
    }

    fn listing_url(&self, cursor: &PageCursor) -> String {
        cursor
            .next_url
            .clone()
            .unwrap_or_else(|| self.listing_url.clone())
    }

    fn parse_listing_page(&self, body: &str, page_url: &str) -> ListingPage {
        let document = Html::parse_document(body);
        let summaries: Vec<JobSummary> = document
            .select(&self.selectors.row)
            .filter_map(|row| self.parse_row(row, page_url))
            .collect();

        if summaries.is_empty() {
            log::info!("No UL Cyberpark job rows at {}", page_url);
            return ListingPage::empty();
        }

        ListingPage {
            next: self.next_page(&document, page_url),
            summaries,
        }
    }

    fn parse_detail_page(&self, body: &str) -> JobDetails {
        let document = Html::parse_document(body);
        let email = mailto_email(&document, &self.selectors.mailto)
            .or_else(|| {
                document
                    .select(&self.selectors.body)
                    .next()
                    .and_then(|body| find_email(&element_text(&body)))
            })
            .unwrap_or_default();

        JobDetails {
            email,
            ..JobDetails::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> UlCyberparkExtractor {
        UlCyberparkExtractor::new(&UlCyberparkConfig::default()).unwrap()
    }

    const PAGE_URL: &str = "https://www.ulcyberpark.com/jobs/index";

    fn listing(pagination: &str) -> String {
        format!(
            r#"<div class="table-responsive-sm table-job"><table class="table">
                 <tr><th>Job</th><th>Company</th><th></th></tr>
                 <tr>
                   <td><a class="btn-1">Flutter Developer</a><span>Closing Date: 15 Jan 2031</span></td>
                   <td><a class="btn-1" href="https://apply.example">Kappa Tech</a></td>
                   <td><a href="/jobs/view/55">Details</a></td>
                 </tr>
                 <tr>
                   <td><a class="btn-1">Intern</a></td>
                   <td></td>
                   <td><a href="/jobs/view/56">Details</a></td>
                 </tr>
                 <tr><td>short</td><td>row</td></tr>
               </table></div>{pagination}"#
        )
    }

    #[test]
    fn test_parse_listing_rows() {
        let page = extractor().parse_listing_page(&listing(""), PAGE_URL);
        assert_eq!(page.summaries.len(), 2);
        assert_eq!(
            page.summaries[0],
            JobSummary {
                company: "Kappa Tech".into(),
                role: "Flutter Developer".into(),
                deadline: "15 Jan 2031".into(),
                link: "https://www.ulcyberpark.com/jobs/view/55".into(),
            }
        );
        assert_eq!(page.summaries[1].company, "N/A");
        assert_eq!(page.summaries[1].deadline, "N/A");
        assert_eq!(page.next, NextPage::None);
    }

    #[test]
    fn test_next_page_from_rel_next() {
        let body = listing(
            r##"<ul class="pagination"><li class="active"><a href="#">1</a></li>
               <li><a rel="next" href="index?page=2">Next</a></li></ul>"##,
        );
        let page = extractor().parse_listing_page(&body, PAGE_URL);
        assert_eq!(
            page.next,
            NextPage::Url("https://www.ulcyberpark.com/jobs/index?page=2".into())
        );
    }

    #[test]
    fn test_next_page_after_active_item() {
        let body = listing(
            r#"<section class="site-pagination"><ul>
                 <li><a href="/jobs/index?page=1">1</a></li>
                 <li class="active"><a href="/jobs/index?page=2">2</a></li>
                 <li><a href="/jobs/index?page=3">3</a></li>
               </ul></section>"#,
        );
        let page = extractor()
            .parse_listing_page(&body, "https://www.ulcyberpark.com/jobs/index?page=2");
        assert_eq!(
            page.next,
            NextPage::Url("https://www.ulcyberpark.com/jobs/index?page=3".into())
        );
    }

    #[test]
    fn test_listing_url_follows_cursor() {
        let mut cursor = PageCursor::start();
        assert_eq!(extractor().listing_url(&cursor), PAGE_URL);
        cursor.advance(&NextPage::Url("https://www.ulcyberpark.com/jobs/index?page=2".into()));
        assert_eq!(
            extractor().listing_url(&cursor),
            "https://www.ulcyberpark.com/jobs/index?page=2"
        );
    }

    #[test]
    fn test_detail_email_from_page_text() {
        let details =
            extractor().parse_detail_page("<body><p>Send resumes to hr@kappa.example</p></body>");
        assert_eq!(details.email, "hr@kappa.example");
        assert_eq!(details.description, "");
    }

    #[test]
    fn test_closing_date() {
        assert_eq!(closing_date("Closing Date: 15 Jan 2031"), "15 Jan 2031");
        assert_eq!(closing_date("2031-01-15"), "2031-01-15");
    }
}
