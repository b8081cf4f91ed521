use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::browser::RenderedPage;

pub const NUTRITION_KEYWORDS: [&str; 24] = [
    "nutrition",
    "diet",
    "food",
    "health",
    "diabetes",
    "protein",
    "carbohydrates",
    "fats",
    "vitamins",
    "minerals",
    "fiber",
    "calories",
    "nutrients",
    "dietary",
    "eating",
    "meal",
    "recipe",
    "ingredient",
    "supplement",
    "vitamin",
    "mineral",
    "antioxidant",
    "omega",
    "fatty acid",
];

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// An absolute link found on a page, annotated with the two checks that
/// decide whether it gets crawled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: String,
    pub nutrition_relevant: bool,
    pub same_domain: bool,
}

impl LinkCandidate {
    pub fn should_visit(&self) -> bool {
        self.nutrition_relevant && self.same_domain
    }
}

pub fn is_nutrition_related(anchor_text: &str, url: &str) -> bool {
    let text = anchor_text.to_lowercase();
    let url = url.to_lowercase();
    NUTRITION_KEYWORDS
        .iter()
        .any(|k| text.contains(k) || url.contains(k))
}

/// Canonical form of an http(s) URL as the crawlers track it: parsed,
/// fragment dropped. `None` for anything else.
pub fn normalize_url(raw: &str) -> Option<String> {
    let mut url = Url::parse(raw.trim()).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}

/// Scheme, host and port all equal.
pub fn same_domain(link: &Url, base: &Url) -> bool {
    link.origin() == base.origin()
}

/// Every http(s) anchor on the page, resolved the way the browser resolves
/// `a.href`, fragment dropped, in document order.
pub fn link_candidates(page: &RenderedPage, base: &Url) -> Vec<LinkCandidate> {
    let Ok(page_url) = Url::parse(&page.url) else {
        return Vec::new();
    };
    let document = Html::parse_document(&page.html);

    document
        .select(&ANCHOR)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?.trim();
            let mut target = page_url.join(href).ok()?;
            if !matches!(target.scheme(), "http" | "https") {
                return None;
            }
            target.set_fragment(None);

            let text = anchor.text().collect::<Vec<_>>().join(" ");
            Some(LinkCandidate {
                nutrition_relevant: is_nutrition_related(&text, target.as_str()),
                same_domain: same_domain(&target, base),
                url: target.into(),
            })
        })
        .collect()
}

/// Same-domain, nutrition-related links of `page`, deduplicated in first-seen order.
pub fn discover(page: &RenderedPage, base_url: &str) -> Vec<String> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    link_candidates(page, &base)
        .into_iter()
        .filter(LinkCandidate::should_visit)
        .filter_map(|c| seen.insert(c.url.clone()).then_some(c.url))
        .collect()
}
