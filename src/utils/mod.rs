//! Utility functions and helpers.

pub mod http;
pub mod log;
pub mod text;

use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Resolve a URL string against a base URL string.
///
/// Returns `href` unchanged when the base itself cannot be parsed.
pub fn resolve(base_url: &str, href: &str) -> String {
    match Url::parse(base_url) {
        Ok(base) => resolve_url(&base, href),
        Err(_) => href.to_string(),
    }
}

/// Last non-empty path segment of a URL, ignoring query and fragment.
pub fn last_path_segment(url_str: &str) -> Option<String> {
    if let Ok(url) = Url::parse(url_str) {
        return url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string);
    }

    url_str
        .split(['?', '#'])
        .next()
        .and_then(|path| path.split('/').filter(|s| !s.is_empty()).last())
        .map(str::to_string)
}

/// Append a `page` query parameter, keeping any existing query.
pub fn with_page(base_url: &str, page: u32) -> String {
    match Url::parse(base_url) {
        Ok(mut url) => {
            let kept: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(k, _)| k != "page")
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            url.query_pairs_mut()
                .clear()
                .extend_pairs(kept)
                .append_pair("page", &page.to_string());
            url.to_string()
        }
        Err(_) => format!("{base_url}?page={page}"),
    }
}
