//! URL helpers for list and detail pages
//!
//! Boards are addressed by a prefix to which the page number is appended, and
//! list rows carry relative hrefs that must be resolved against the list page.

use crate::{UrlError, UrlResult};
use url::Url;

/// Builds the URL of a 1-based list page
///
/// # Example
///
/// ```
/// use bulletin_harvest::url::list_page_url;
///
/// let url = list_page_url("https://example.com/list.do?pageIndex=", 3);
/// assert_eq!(url, "https://example.com/list.do?pageIndex=3");
/// ```
pub fn list_page_url(prefix: &str, page: u32) -> String {
    format!("{}{}", prefix, page)
}

/// Resolves a row href to an absolute http(s) URL
///
/// # Arguments
///
/// * `href` - The raw attribute value
/// * `base_url` - The list page the href was found on
///
/// # Returns
///
/// * `Ok(String)` - Absolute URL
/// * `Err(UrlError)` - Empty, unparsable or non-http(s) target
pub fn resolve_link(href: &str, base_url: &Url) -> UrlResult<String> {
    let href = href.trim();

    if href.is_empty() {
        return Err(UrlError::Empty);
    }

    let absolute = base_url
        .join(href)
        .map_err(|e| UrlError::Parse(format!("{}: {}", href, e)))?;

    match absolute.scheme() {
        "http" | "https" => Ok(absolute.to_string()),
        other => Err(UrlError::InvalidScheme(other.to_string())),
    }
}
