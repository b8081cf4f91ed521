use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::browser::SessionLauncher;
use crate::config::{CrawlConfig, SiteConfig};
use crate::crawler::{crawl_site, HarvestRun, SiteCrawl};
use crate::error::HarvestError;
use crate::search::{crawl_search_site, SearchProfile};

/// Which crawler handles a site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlStrategy {
    FollowLinks,
    Search(SearchProfile),
}

impl CrawlStrategy {
    pub fn for_site(site_id: &str) -> Self {
        match site_id {
            "pubmed" => CrawlStrategy::Search(SearchProfile::pubmed()),
            "fdc" => CrawlStrategy::Search(SearchProfile::food_data_central()),
            _ => CrawlStrategy::FollowLinks,
        }
    }
}

/// Text collected for one site. `text` is empty when the site failed entirely.
#[derive(Debug, Clone)]
pub struct SiteHarvest {
    pub site: String,
    pub text: String,
    pub pages: usize,
    pub failures: usize,
}

#[derive(Debug, Clone)]
pub struct Harvest {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// In configured order.
    pub sites: Vec<SiteHarvest>,
    pub urls_visited: usize,
}

impl Harvest {
    pub fn text_for(&self, site: &str) -> Option<&str> {
        self.sites
            .iter()
            .find(|s| s.site == site)
            .map(|s| s.text.as_str())
    }
}

impl From<SiteCrawl> for SiteHarvest {
    fn from(crawl: SiteCrawl) -> Self {
        Self {
            text: crawl.text(),
            pages: crawl.pages.len(),
            failures: crawl.failures,
            site: crawl.site,
        }
    }
}

/// Crawl every configured site, one after another.
///
/// A site that cannot be crawled contributes an empty text; the harvest only
/// fails when no site produced anything.
pub async fn harvest_all(
    launcher: &dyn SessionLauncher,
    config: &CrawlConfig,
    sites: &[SiteConfig],
) -> Result<Harvest, HarvestError> {
    let run_id = Uuid::new_v4();
    let started_at = Utc::now();
    let mut run = HarvestRun::new();
    let mut results = Vec::with_capacity(sites.len());
    info!("🚀 Harvest {} started for {} sites", run_id, sites.len());

    for site in sites {
        let outcome = match CrawlStrategy::for_site(&site.id) {
            CrawlStrategy::FollowLinks => crawl_site(launcher, config, &mut run, site).await,
            CrawlStrategy::Search(profile) => {
                crawl_search_site(launcher, config, &mut run, site, &profile).await
            }
        };

        let harvest = match outcome {
            Ok(crawl) => SiteHarvest::from(crawl),
            Err(e) => {
                error!("🔥 [{}] crawl aborted: {}", site.id, e);
                SiteHarvest {
                    site: site.id.clone(),
                    text: String::new(),
                    pages: 0,
                    failures: 1,
                }
            }
        };
        if harvest.text.is_empty() {
            warn!("⚠️ [{}] produced no content", site.id);
        }
        results.push(harvest);
    }

    if results.iter().all(|s| s.text.is_empty()) {
        return Err(HarvestError::NothingToIndex { sites: sites.len() });
    }

    info!(
        "✅ Harvest {} finished: {} URLs visited",
        run_id,
        run.visited_count()
    );
    Ok(Harvest {
        run_id,
        started_at,
        sites: results,
        urls_visited: run.visited_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_site_identifier() {
        assert_eq!(
            CrawlStrategy::for_site("pubmed"),
            CrawlStrategy::Search(SearchProfile::pubmed())
        );
        assert_eq!(
            CrawlStrategy::for_site("fdc"),
            CrawlStrategy::Search(SearchProfile::food_data_central())
        );
        assert_eq!(CrawlStrategy::for_site("eatright"), CrawlStrategy::FollowLinks);
        assert_eq!(
            CrawlStrategy::for_site("harvard_nutrition"),
            CrawlStrategy::FollowLinks
        );
    }
}
