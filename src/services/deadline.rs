//! Deadline parsing and the expired-job filter.

use std::sync::LazyLock;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::models::JobRecord;

static ORDINAL_SUFFIX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").ok());

/// Date-only layouts, day-first wherever day and month are both numeric.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d %b %Y",
    "%d %B %Y",
    "%b %d %Y",
    "%B %d %Y",
    "%d-%b-%Y",
    "%d-%B-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
];

/// Parse a free-form deadline. `None` when no known layout matches.
pub fn parse_deadline(raw: &str) -> Option<NaiveDate> {
    let text = clean(raw);
    if text.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(dt.date());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
            return Some(date);
        }
    }

    // "2031-01-15T00:00:00.000000Z" style timestamps with odd precision
    text.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Strip ordinal suffixes and commas, collapse whitespace.
fn clean(raw: &str) -> String {
    let text = match ORDINAL_SUFFIX.as_ref() {
        Some(re) => re.replace_all(raw, "$1").into_owned(),
        None => raw.to_string(),
    };
    text.replace(',', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drops records whose deadline falls before a fixed "today".
#[derive(Debug, Clone, Copy)]
pub struct DeadlineFilter {
    today: NaiveDate,
}

impl DeadlineFilter {
    pub fn new(today: NaiveDate) -> Self {
        Self { today }
    }

    /// Filter anchored at the current local date.
    pub fn local() -> Self {
        Self::new(Local::now().date_naive())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Expired iff the deadline parses to a date strictly before today.
    pub fn is_expired(&self, deadline: &str) -> bool {
        parse_deadline(deadline).is_some_and(|date| date < self.today)
    }

    /// Keep live and unparseable records. Returns the survivors and the
    /// number dropped.
    pub fn apply(&self, records: Vec<JobRecord>) -> (Vec<JobRecord>, usize) {
        let total = records.len();
        let kept: Vec<JobRecord> = records
            .into_iter()
            .filter(|record| {
                if self.is_expired(&record.deadline) {
                    log::debug!(
                        "Dropping expired job {} (deadline {})",
                        record.link,
                        record.deadline
                    );
                    false
                } else {
                    true
                }
            })
            .collect();
        let expired = total - kept.len();
        (kept, expired)
    }
}
