//! Page count discovery from the pagination markup of list page 1

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

static PAGE_ANCHORS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(".pagination .page_wrap a[href]").expect("static selector")
});

static LAST_PAGE_CONTROL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".pagination .next_end").expect("static selector"));

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

static PAGE_INDEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"pageIndex=(\d+)").expect("static regex"));

/// Infers the total page count of a board from its first list page
///
/// Takes the largest `pageIndex=` found on the numbered anchors and on the
/// "jump to last" control. Returns 1 when neither yields an index.
pub fn resolve_total_pages(document: &Html) -> u32 {
    let from_anchors = document
        .select(&PAGE_ANCHORS)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(page_index);

    // The control is usually an anchor, sometimes a wrapper around one
    let from_last = document.select(&LAST_PAGE_CONTROL).flat_map(|el| {
        let own = el.value().attr("href").and_then(page_index);
        let nested = el
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(page_index)
            .max();
        own.into_iter().chain(nested)
    });

    from_anchors.chain(from_last).max().unwrap_or(1).max(1)
}

/// Extracts the `pageIndex` query value from an href
fn page_index(href: &str) -> Option<u32> {
    PAGE_INDEX
        .captures(href)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
