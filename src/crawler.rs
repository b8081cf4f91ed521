use std::collections::{HashSet, VecDeque};

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::SessionLauncher;
use crate::config::{CrawlConfig, SiteConfig};
use crate::error::SessionError;
use crate::extract::extract_text;
use crate::links::{discover, normalize_url};

/// Separator placed between page texts of one site.
pub const PAGE_SEPARATOR: &str = "\n\n";

// ============================================================================
// Harvest-scoped state
// ============================================================================

/// State of one harvest run, handed by `&mut` to every crawler it drives.
/// Nothing here outlives the run.
#[derive(Debug, Default)]
pub struct HarvestRun {
    visited: HashSet<String>,
}

impl HarvestRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the URL was already fetched in this run.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

/// Text kept from one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContent {
    pub url: String,
    pub text: String,
    pub site: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Idle,
    SessionOpen,
    SeedFetched,
    Expanding,
    Closed,
}

/// Everything one site crawl produced.
#[derive(Debug, Clone)]
pub struct SiteCrawl {
    pub site: String,
    pub pages: Vec<PageContent>,
    /// Fetch attempts, successful or not. Never exceeds the page budget.
    pub pages_fetched: usize,
    pub failures: usize,
    pub phase: CrawlPhase,
}

impl SiteCrawl {
    pub fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            pages: Vec::new(),
            pages_fetched: 0,
            failures: 0,
            phase: CrawlPhase::Idle,
        }
    }

    pub(crate) fn enter(&mut self, next: CrawlPhase) {
        debug!("[{}] {:?} -> {:?}", self.site, self.phase, next);
        self.phase = next;
    }

    /// All kept page texts joined by a blank line.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }
}

// ============================================================================
// Generic link-following crawler
// ============================================================================

/// Crawl one site by following nutrition links breadth-first from its seed.
///
/// A single session serves the whole site and is dropped (closing the browser)
/// on every way out of this function. Page failures count as empty pages;
/// only a failure to launch the session is returned.
pub async fn crawl_site(
    launcher: &dyn SessionLauncher,
    config: &CrawlConfig,
    run: &mut HarvestRun,
    site: &SiteConfig,
) -> Result<SiteCrawl, SessionError> {
    info!("🌐 Starting crawl of {} at {}", site.id, site.seed_url);
    let mut crawl = SiteCrawl::new(&site.id);

    let mut session = launcher.launch()?;
    crawl.enter(CrawlPhase::SessionOpen);

    // Tracked in the same form as discovered links.
    let seed = normalize_url(&site.seed_url).unwrap_or_else(|| site.seed_url.clone());
    let mut frontier: VecDeque<(String, usize)> = VecDeque::new();
    let mut queued: HashSet<String> = HashSet::new();
    frontier.push_back((seed.clone(), 0));
    queued.insert(seed.clone());

    while let Some((url, depth)) = frontier.pop_front() {
        if crawl.pages_fetched >= config.max_pages_per_site {
            debug!("[{}] page budget of {} reached", site.id, config.max_pages_per_site);
            break;
        }
        if !run.mark_visited(&url) {
            debug!("[{}] already visited {}", site.id, url);
            continue;
        }

        if crawl.pages_fetched > 0 {
            sleep(config.politeness_delay).await;
        }
        crawl.pages_fetched += 1;

        let page = match session.render(&url).await {
            Ok(page) => Some(page),
            Err(e) => {
                warn!("⚠️ [{}] {}", site.id, e);
                crawl.failures += 1;
                None
            }
        };

        let text = page
            .as_ref()
            .map(|p| extract_text(&p.html))
            .unwrap_or_default();
        // The seed is kept whenever it has any text at all.
        let min_len = if depth == 0 { 1 } else { config.min_content_len };
        let text_len = text.chars().count();
        if text_len >= min_len {
            debug!("[{}] kept {} chars from {}", site.id, text_len, url);
            crawl.pages.push(PageContent {
                url: url.clone(),
                text,
                site: site.id.clone(),
            });
        } else {
            debug!("[{}] skipped {} ({} chars)", site.id, url, text_len);
        }

        if depth == 0 {
            crawl.enter(CrawlPhase::SeedFetched);
        }

        let Some(page) = page else { continue };
        if depth >= config.max_depth || crawl.pages_fetched >= config.max_pages_per_site {
            continue;
        }
        if crawl.phase == CrawlPhase::SeedFetched {
            crawl.enter(CrawlPhase::Expanding);
        }
        let links = discover(&page, &seed);
        debug!("[{}] {} candidate links on {}", site.id, links.len(), url);
        for link in links {
            if !run.is_visited(&link) && queued.insert(link.clone()) {
                frontier.push_back((link, depth + 1));
            }
        }
    }

    drop(session);
    crawl.enter(CrawlPhase::Closed);
    info!(
        "✅ [{}] fetched {} pages, kept {}, {} failed",
        site.id,
        crawl.pages_fetched,
        crawl.pages.len(),
        crawl.failures
    );
    Ok(crawl)
}
