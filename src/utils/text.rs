//! Text extraction helpers shared by the source extractors.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

static EMAIL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+\-]+@[A-Za-z0-9.\-]+\.[A-Za-z]{2,}").ok());

/// Collapse every whitespace run to a single space and trim.
pub fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of an element with whitespace normalized across child nodes.
pub fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of an element, one trimmed line per text node, blank lines dropped.
pub fn element_lines(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// First email address found in `text`.
pub fn find_email(text: &str) -> Option<String> {
    EMAIL_PATTERN
        .as_ref()?
        .find(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
}

/// Address part of a `mailto:` href, without scheme or query.
pub fn mailto_address(href: &str) -> Option<String> {
    let rest = href.trim();
    let rest = rest
        .get(..7)
        .filter(|scheme| scheme.eq_ignore_ascii_case("mailto:"))
        .map(|_| &rest[7..])?;
    let address = rest.split('?').next().unwrap_or("").trim();
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  a \n\t b  c "), "a b c");
        assert_eq!(normalize_whitespace("   "), "");
    }

    #[test]
    fn test_find_email() {
        assert_eq!(
            find_email("contact: jane@acme.com"),
            Some("jane@acme.com".to_string())
        );
        assert_eq!(
            find_email("Send CVs to hr.team+jobs@acme-labs.co.in."),
            Some("hr.team+jobs@acme-labs.co.in".to_string())
        );
        assert_eq!(find_email("no address here @ all"), None);
    }

    #[test]
    fn test_mailto_address() {
        assert_eq!(
            mailto_address("mailto:careers@acme.com?subject=Apply"),
            Some("careers@acme.com".to_string())
        );
        assert_eq!(
            mailto_address("MAILTO:careers@acme.com"),
            Some("careers@acme.com".to_string())
        );
        assert_eq!(mailto_address("mailto:"), None);
        assert_eq!(mailto_address("https://acme.com"), None);
    }

    #[test]
    fn test_element_text_and_lines() {
        let html = Html::parse_fragment("<div> Senior <b>Rust</b>\n Engineer <p>  </p><p>Kochi</p></div>");
        let sel = Selector::parse("div").unwrap();
        let div = html.select(&sel).next().unwrap();
        assert_eq!(element_text(&div), "Senior Rust Engineer Kochi");
        assert_eq!(element_lines(&div), "Senior\nRust\nEngineer\nKochi");
    }
}
