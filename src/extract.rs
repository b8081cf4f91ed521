use once_cell::sync::Lazy;
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};

/// Elements that never carry article text, whatever the site.
pub const EXCLUDED_TAGS: [&str; 7] = ["script", "style", "nav", "header", "footer", "aside", "iframe"];

/// Main-content containers in priority order. Only the first
/// selector that matches anything is used.
pub const CONTENT_SELECTORS: [&str; 9] = [
    "main",
    "article",
    ".content",
    ".main-content",
    ".post-content",
    ".entry-content",
    "#content",
    ".article-content",
    ".page-content",
];

static PARSED_SELECTORS: Lazy<Vec<Selector>> = Lazy::new(|| {
    CONTENT_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .collect()
});

static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n+").unwrap());

fn is_excluded(tag: &str) -> bool {
    EXCLUDED_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag))
}

fn inside_excluded(element: &ElementRef) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| is_excluded(a.value().name()))
}

/// Text of `element` with excluded subtrees skipped, one entry per text node.
fn collect_text(element: ElementRef, out: &mut Vec<String>) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    out.push(text.to_string());
                }
            }
            Node::Element(el) if !is_excluded(el.name()) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, out);
                }
            }
            _ => {}
        }
    }
}

fn main_content(document: &Html) -> Option<Vec<String>> {
    for selector in PARSED_SELECTORS.iter() {
        let matches: Vec<ElementRef> = document
            .select(selector)
            .filter(|el| !is_excluded(el.value().name()) && !inside_excluded(el))
            .collect();
        if matches.is_empty() {
            continue;
        }

        let mut parts = Vec::new();
        for el in &matches {
            // A nested match is already covered by its outer match.
            let nested = el
                .ancestors()
                .any(|a| matches.iter().any(|m| m.id() == a.id()));
            if !nested {
                collect_text(*el, &mut parts);
            }
        }
        return Some(parts);
    }
    None
}

pub fn normalize_whitespace(text: &str) -> String {
    let collapsed = WHITESPACE_RUNS.replace_all(text, " ");
    NEWLINE_RUNS.replace_all(&collapsed, "\n").trim().to_string()
}

/// Best-effort readable text of a rendered page.
///
/// Chrome and script blocks are dropped first, then the first matching
/// content selector wins; a page with no (or an empty) content area falls
/// back to all remaining text. Malformed markup degrades to less text, and
/// a page with nothing readable yields an empty string.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut parts = main_content(&document).unwrap_or_default();
    if parts.iter().all(|p| p.trim().is_empty()) {
        parts.clear();
        collect_text(document.root_element(), &mut parts);
    }

    normalize_whitespace(&parts.join(" "))
}
