//! List page parser
//!
//! This module turns one board list page into post rows:
//! - Row discovery (`tbody > tr`, at least 4 cells)
//! - Title and detail link from the second cell
//! - Classification of the trailing cells into department, date and views
//! - The attachment icon column of welfare boards

use crate::config::BoardKind;
use crate::model::Post;
use crate::url::resolve_link;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

static ROWS: Lazy<Selector> = Lazy::new(|| Selector::parse("tbody > tr").expect("static selector"));

static TITLE_ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static selector"));

static IMAGE: Lazy<Selector> = Lazy::new(|| Selector::parse("img").expect("static selector"));

static DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}[.\-/]\d{1,2}[.\-/]\d{1,2}\.?$").expect("static regex"));

static COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}(,\d{3})+|\d+)$").expect("static regex"));

/// Rows with fewer cells are headers, spacers or "no posts" placeholders
const MIN_CELLS: usize = 4;

/// Fields recovered from the cells after the title
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrailingFields {
    pub department: String,
    pub published_date: String,
    pub views: u64,
}

/// Parses every post row of a list page, in page order
///
/// # Arguments
///
/// * `document` - The parsed list page
/// * `page_url` - URL the page was fetched from, used to resolve row links
/// * `kind` - Row layout of the board
///
/// # Example
///
/// ```
/// use bulletin_harvest::config::BoardKind;
/// use bulletin_harvest::crawler::parse_list_page;
/// use scraper::Html;
/// use url::Url;
///
/// let html = r#"<table><tbody><tr>
///     <td>12</td><td><a href="view.do?nttNo=12">도로 공사 안내</a></td>
///     <td>건설과</td><td>2024.05.01</td>
/// </tr></tbody></table>"#;
/// let page = Url::parse("https://example.com/board/list.do?pageIndex=1").unwrap();
/// let posts = parse_list_page(&Html::parse_document(html), &page, BoardKind::Standard);
///
/// assert_eq!(posts[0].link, "https://example.com/board/view.do?nttNo=12");
/// assert_eq!(posts[0].department, "건설과");
/// ```
pub fn parse_list_page(document: &Html, page_url: &Url, kind: BoardKind) -> Vec<Post> {
    let mut posts = Vec::new();

    for (index, row) in document.select(&ROWS).enumerate() {
        let cells: Vec<ElementRef> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();

        if cells.len() < MIN_CELLS {
            tracing::trace!(row = index, cells = cells.len(), "Skipping short row");
            continue;
        }

        let Some(anchor) = cells[1].select(&TITLE_ANCHOR).next() else {
            tracing::debug!(url = %page_url, row = index, "Row has no title anchor");
            continue;
        };

        let href = anchor.value().attr("href").unwrap_or_default();
        let link = match resolve_link(href, page_url) {
            Ok(link) => link,
            Err(e) => {
                tracing::debug!(url = %page_url, row = index, href, error = %e, "Unusable row link");
                continue;
            }
        };

        let mut post = Post::new(&element_text(&anchor), &link);
        post.ordinal_id = element_text(&cells[0]).parse().unwrap_or(0);

        let attachment_column = kind.attachment_column();
        if let Some(column) = attachment_column {
            post.has_attachment = cells
                .get(column)
                .map(|cell| cell.select(&IMAGE).next().is_some())
                .unwrap_or(false);
        }

        let trailing: Vec<String> = cells
            .iter()
            .enumerate()
            .skip(2)
            .filter(|(i, _)| Some(*i) != attachment_column)
            .map(|(_, cell)| element_text(cell))
            .collect();

        let fields = classify_trailing_cells(&trailing);
        post.department = fields.department;
        post.published_date = fields.published_date;
        post.views = fields.views;

        posts.push(post);
    }

    posts
}

/// Classifies the texts of the cells after the title
///
/// The result does not depend on cell positions: a date-like text is the
/// publish date, a count-like text is the view count and any other non-empty
/// text joins the department. Only the first date and count are taken as
/// such; later date-like or count-like texts join the department too.
pub fn classify_trailing_cells<S: AsRef<str>>(texts: &[S]) -> TrailingFields {
    let mut fields = TrailingFields::default();
    let mut department = Vec::new();
    let mut seen_views = false;

    for text in texts {
        let text = text.as_ref().trim();
        if text.is_empty() {
            continue;
        }

        if DATE.is_match(text) && fields.published_date.is_empty() {
            fields.published_date = text.to_string();
        } else if COUNT.is_match(text) && !seen_views {
            fields.views = text.replace(',', "").parse().unwrap_or(0);
            seen_views = true;
        } else {
            department.push(text);
        }
    }

    fields.department = department.join(" ");
    fields
}

/// Text of an element with whitespace runs collapsed
fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
