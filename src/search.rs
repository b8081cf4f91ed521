use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{SearchForm, SessionLauncher, SubmitAction};
use crate::config::{CrawlConfig, SiteConfig};
use crate::crawler::{CrawlPhase, HarvestRun, PageContent, SiteCrawl};
use crate::error::SessionError;
use crate::extract::extract_text;
use crate::links::normalize_url;

const PUBMED_TERMS: [&str; 27] = [
    "diabetes nutrition management",
    "protein diet benefits",
    "carbohydrates health effects",
    "vitamins minerals deficiency",
    "dietary fiber benefits",
    "nutritional supplements safety",
    "omega 3 fatty acids",
    "antioxidants health",
    "probiotics gut health",
    "calcium bone health",
    "iron deficiency anemia",
    "vitamin D deficiency",
    "B vitamins energy",
    "zinc immune system",
    "magnesium muscle function",
    "potassium blood pressure",
    "sodium hypertension",
    "folic acid pregnancy",
    "vitamin C immunity",
    "vitamin E antioxidant",
    "vitamin K blood clotting",
    "selenium thyroid function",
    "copper metabolism",
    "manganese bone formation",
    "chromium blood sugar",
    "molybdenum enzyme function",
    "iodine thyroid health",
];

const FOOD_TERMS: [&str; 5] = ["apple", "chicken", "rice", "spinach", "salmon"];

/// How a search-driven site is harvested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchProfile {
    /// Prefix for each recorded result, e.g. "PubMed".
    pub label: String,
    pub form: SearchForm,
    pub terms: Vec<String>,
    /// Only this many leading terms are searched.
    pub term_limit: usize,
    /// Scroll the landing page and keep its text before searching.
    pub keep_landing_page: bool,
}

impl SearchProfile {
    /// Literature search: `#term` input, `.search-btn` button.
    pub fn pubmed() -> Self {
        Self {
            label: "PubMed".to_string(),
            form: SearchForm {
                input_selector: "#term".to_string(),
                submit: SubmitAction::ClickButton(".search-btn".to_string()),
            },
            terms: PUBMED_TERMS.iter().map(|t| t.to_string()).collect(),
            term_limit: 3,
            keep_landing_page: false,
        }
    }

    /// Food composition catalog: `query` input submitted with its form.
    pub fn food_data_central() -> Self {
        Self {
            label: "FDC".to_string(),
            form: SearchForm {
                input_selector: "input[name='query']".to_string(),
                submit: SubmitAction::SubmitForm,
            },
            terms: FOOD_TERMS.iter().map(|t| t.to_string()).collect(),
            term_limit: 2,
            keep_landing_page: true,
        }
    }

    pub fn active_terms(&self) -> &[String] {
        &self.terms[..self.term_limit.min(self.terms.len())]
    }
}

/// Harvest a site through its search box instead of its links.
///
/// The session is launched once and dropped once, whatever happens to the
/// individual terms. A term that cannot be searched is skipped. A landing page
/// already fetched earlier in the run is not fetched again, and without it
/// there is no search box, so the site yields nothing.
pub async fn crawl_search_site(
    launcher: &dyn SessionLauncher,
    config: &CrawlConfig,
    run: &mut HarvestRun,
    site: &SiteConfig,
    profile: &SearchProfile,
) -> Result<SiteCrawl, SessionError> {
    info!("🔎 Starting {} search crawl at {}", profile.label, site.seed_url);
    let mut crawl = SiteCrawl::new(&site.id);
    let seed = normalize_url(&site.seed_url).unwrap_or_else(|| site.seed_url.clone());
    if run.is_visited(&seed) {
        debug!("[{}] landing page {} already visited", site.id, seed);
        crawl.enter(CrawlPhase::Closed);
        return Ok(crawl);
    }

    let mut session = launcher.launch()?;
    crawl.enter(CrawlPhase::SessionOpen);

    run.mark_visited(&seed);
    crawl.pages_fetched += 1;
    let landing = if profile.keep_landing_page {
        session.render(&seed).await.map(Some)
    } else {
        session.navigate(&seed).await.map(|_| None)
    };

    match landing {
        Ok(Some(page)) => {
            let text = extract_text(&page.html);
            if !text.is_empty() {
                crawl.pages.push(PageContent {
                    url: page.url,
                    text,
                    site: site.id.clone(),
                });
            }
        }
        Ok(None) => {}
        Err(e) => {
            // Without the landing page there is no search box to use.
            warn!("⚠️ [{}] {}", site.id, e);
            crawl.failures += 1;
            drop(session);
            crawl.enter(CrawlPhase::Closed);
            return Ok(crawl);
        }
    }
    crawl.enter(CrawlPhase::SeedFetched);
    crawl.enter(CrawlPhase::Expanding);

    for term in profile.active_terms() {
        if crawl.pages_fetched >= config.max_pages_per_site {
            break;
        }
        crawl.pages_fetched += 1;

        let result = match session.search(&profile.form, term).await {
            Ok(()) => session.snapshot().await,
            Err(e) => Err(e),
        };
        let page = match result {
            Ok(page) => page,
            Err(e) => {
                warn!("⚠️ [{}] search for '{}' skipped: {}", site.id, term, e);
                crawl.failures += 1;
                continue;
            }
        };

        let text = extract_text(&page.html);
        debug!("[{}] '{}' returned {} chars", site.id, term, text.len());
        if !text.is_empty() {
            crawl.pages.push(PageContent {
                url: page.url,
                text: format!("{} Search Results for '{}':\n{}", profile.label, term, text),
                site: site.id.clone(),
            });
        }
        sleep(config.search_pause).await;
    }

    drop(session);
    crawl.enter(CrawlPhase::Closed);
    info!(
        "✅ [{}] {} searches recorded, {} failed",
        site.id,
        crawl.pages.len(),
        crawl.failures
    );
    Ok(crawl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_profiles_truncate_their_terms() {
        let pubmed = SearchProfile::pubmed();
        assert_eq!(
            pubmed.active_terms(),
            ["diabetes nutrition management", "protein diet benefits", "carbohydrates health effects"]
        );
        assert_eq!(SearchProfile::food_data_central().active_terms(), ["apple", "chicken"]);
    }

    #[test]
    fn term_limit_larger_than_list_is_clamped() {
        let mut profile = SearchProfile::food_data_central();
        profile.term_limit = 99;
        assert_eq!(profile.active_terms().len(), 5);
    }
}
