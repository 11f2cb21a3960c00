//! Job data structures.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The portal a job was crawled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    Infopark,
    Technopark,
    #[serde(rename = "UL Cyberpark")]
    UlCyberpark,
    /// Cyberpark Kerala's RSS job feed
    #[serde(rename = "Cyberpark")]
    CyberparkFeed,
}

impl Source {
    pub const ALL: [Source; 4] = [
        Source::Infopark,
        Source::Technopark,
        Source::UlCyberpark,
        Source::CyberparkFeed,
    ];

    /// Name stored in the `source` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Infopark => "Infopark",
            Source::Technopark => "Technopark",
            Source::UlCyberpark => "UL Cyberpark",
            Source::CyberparkFeed => "Cyberpark",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        Source::ALL
            .into_iter()
            .find(|source| {
                let name: String = source.as_str().chars().filter(|c| !c.is_whitespace()).collect();
                name.eq_ignore_ascii_case(&wanted)
            })
            .ok_or_else(|| AppError::validation(format!("unknown source '{s}'")))
    }
}

/// A row from a listing page, before its detail page is fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub company: String,
    pub role: String,
    pub deadline: String,
    /// Detail-page URL; the natural key
    pub link: String,
}

/// Fields harvested from a detail page (and, for Infopark, the profile page).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDetails {
    pub description: String,
    pub company_profile: String,
    pub email: String,
}

/// A fully harvested job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub company: String,
    pub role: String,
    pub deadline: String,
    pub link: String,
    pub source: Source,
    pub description: String,
    pub company_profile: String,
    #[serde(default)]
    pub email: String,
}

impl JobRecord {
    /// Combine a listing row with its harvested details.
    pub fn from_parts(summary: JobSummary, source: Source, details: JobDetails) -> Self {
        Self {
            company: summary.company,
            role: summary.role,
            deadline: summary.deadline,
            link: summary.link,
            source,
            description: details.description,
            company_profile: details.company_profile,
            email: details.email,
        }
    }

    /// True when the record still needs an email from the reconciler.
    pub fn is_missing_email(&self) -> bool {
        self.email.trim().is_empty()
    }
}

/// Columns that may be updated after insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobField {
    Description,
    CompanyProfile,
    Email,
}

impl JobField {
    pub fn column(&self) -> &'static str {
        match self {
            JobField::Description => "description",
            JobField::CompanyProfile => "company_profile",
            JobField::Email => "email",
        }
    }
}

/// Pagination state for one source traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor {
    /// 1-based page number
    pub page: u32,
    /// Explicit URL for the page, when the site links it instead of numbering it
    pub next_url: Option<String>,
}

impl PageCursor {
    pub fn start() -> Self {
        Self {
            page: 1,
            next_url: None,
        }
    }

    /// Move to the page advertised by the last listing. Returns false when
    /// there is nowhere left to go.
    pub fn advance(&mut self, next: &NextPage) -> bool {
        match next {
            NextPage::None => false,
            NextPage::Numbered => {
                self.page += 1;
                self.next_url = None;
                true
            }
            NextPage::Url(url) => {
                self.page += 1;
                self.next_url = Some(url.clone());
                true
            }
        }
    }
}

/// The "has more" signal of a listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    None,
    /// Next page is `page + 1` of the same endpoint
    Numbered,
    /// Next page lives at this absolute URL
    Url(String),
}

/// A parsed listing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub summaries: Vec<JobSummary>,
    pub next: NextPage,
}

impl ListingPage {
    pub fn empty() -> Self {
        Self {
            summaries: Vec::new(),
            next: NextPage::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_round_trips_through_column_name() {
        for source in Source::ALL {
            assert_eq!(source.as_str().parse::<Source>().unwrap(), source);
        }
        assert_eq!("ulcyberpark".parse::<Source>().unwrap(), Source::UlCyberpark);
        assert_eq!("cyberpark".parse::<Source>().unwrap(), Source::CyberparkFeed);
        assert!("Kinfra".parse::<Source>().is_err());
    }

    #[test]
    fn test_source_serializes_as_display_name() {
        assert_eq!(
            serde_json::to_string(&Source::UlCyberpark).unwrap(),
            "\"UL Cyberpark\""
        );
    }

    #[test]
    fn test_cursor_advance() {
        let mut cursor = PageCursor::start();
        assert!(cursor.advance(&NextPage::Numbered));
        assert_eq!(cursor.page, 2);
        assert!(cursor.advance(&NextPage::Url("https://x/jobs?p=3".into())));
        assert_eq!(cursor.next_url.as_deref(), Some("https://x/jobs?p=3"));
        assert!(!cursor.advance(&NextPage::None));
        assert_eq!(cursor.page, 3);
    }

    #[test]
    fn test_missing_email_ignores_whitespace() {
        let summary = JobSummary {
            company: "Acme".into(),
            role: "Engineer".into(),
            deadline: "2030-01-01".into(),
            link: "https://x/1".into(),
        };
        let mut record = JobRecord::from_parts(summary, Source::Infopark, JobDetails::default());
        record.email = "  ".into();
        assert!(record.is_missing_email());
        record.email = "hr@acme.com".into();
        assert!(!record.is_missing_email());
    }
}
