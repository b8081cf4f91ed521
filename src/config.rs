use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::HarvestError;
use crate::links::normalize_url;

pub const DEFAULT_MAX_PAGES_PER_SITE: usize = 50;
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_MIN_CONTENT_LEN: usize = 100;
pub const DEFAULT_MIN_INDEX_LEN: usize = 100;
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;
pub const DEFAULT_STORE_DIR: &str = "./chunk_store";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";
pub const WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// The reference deployment: two search-driven sites and two link-following ones.
pub const REFERENCE_SITES: [(&str, &str); 4] = [
    ("pubmed", "https://pubmed.ncbi.nlm.nih.gov/"),
    ("fdc", "https://fdc.nal.usda.gov/"),
    ("eatright", "https://www.eatright.org/"),
    ("harvard_nutrition", "https://nutritionsource.hsph.harvard.edu/"),
];

/// One entry of the allow-list: a site identifier and the page the crawl starts from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub id: String,
    pub seed_url: String,
}

impl SiteConfig {
    pub fn new(id: impl Into<String>, seed_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seed_url: seed_url.into(),
        }
    }

    pub fn reference_sites() -> Vec<SiteConfig> {
        REFERENCE_SITES
            .iter()
            .map(|(id, url)| SiteConfig::new(*id, *url))
            .collect()
    }
}

impl FromStr for SiteConfig {
    type Err = HarvestError;

    /// Parses `name=https://host/path`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, url) = s
            .split_once('=')
            .ok_or_else(|| HarvestError::InvalidConfig(format!("site `{s}` is not name=url")))?;
        let id = id.trim();
        let url = url.trim();
        if id.is_empty() {
            return Err(HarvestError::InvalidConfig(format!("site `{s}` has an empty name")));
        }
        Url::parse(url)
            .map_err(|e| HarvestError::InvalidConfig(format!("site `{id}` has a bad url: {e}")))?;
        let seed = normalize_url(url).ok_or_else(|| {
            HarvestError::InvalidConfig(format!("site `{id}` must use http or https"))
        })?;
        Ok(SiteConfig::new(id, seed))
    }
}

/// Budgets and waits shared by every crawler in a harvest.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Hard ceiling on pages fetched per site, seed included.
    pub max_pages_per_site: usize,
    /// Link hops followed from the seed (seed is hop 0).
    pub max_depth: usize,
    /// Followed pages shorter than this are visited but not kept.
    pub min_content_len: usize,
    pub page_load_timeout: Duration,
    pub settle_pause: Duration,
    pub scroll_pause: Duration,
    pub politeness_delay: Duration,
    pub search_pause: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages_per_site: DEFAULT_MAX_PAGES_PER_SITE,
            max_depth: DEFAULT_MAX_DEPTH,
            min_content_len: DEFAULT_MIN_CONTENT_LEN,
            page_load_timeout: Duration::from_secs(10),
            settle_pause: Duration::from_secs(2),
            scroll_pause: Duration::from_secs(1),
            politeness_delay: Duration::from_secs(1),
            search_pause: Duration::from_secs(2),
        }
    }
}

impl CrawlConfig {
    /// Same budgets, no waiting. Used when the session is not a real browser.
    pub fn without_delays(mut self) -> Self {
        self.page_load_timeout = Duration::ZERO;
        self.settle_pause = Duration::ZERO;
        self.scroll_pause = Duration::ZERO;
        self.politeness_delay = Duration::ZERO;
        self.search_pause = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.chunk_size == 0 {
            return Err(HarvestError::InvalidConfig("chunk size must be positive".into()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(HarvestError::InvalidConfig(format!(
                "chunk overlap {} must be smaller than chunk size {}",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub sites: Vec<SiteConfig>,
    pub crawl: CrawlConfig,
    pub chunking: ChunkingConfig,
    /// A site's harvested text must be longer than this to be chunked.
    pub min_index_len: usize,
    pub store_dir: PathBuf,
    pub headless: bool,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            sites: SiteConfig::reference_sites(),
            crawl: CrawlConfig::default(),
            chunking: ChunkingConfig::default(),
            min_index_len: DEFAULT_MIN_INDEX_LEN,
            store_dir: PathBuf::from(DEFAULT_STORE_DIR),
            headless: true,
        }
    }
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<(), HarvestError> {
        if self.sites.is_empty() {
            return Err(HarvestError::InvalidConfig("no sites configured".into()));
        }
        if self.crawl.max_pages_per_site == 0 {
            return Err(HarvestError::InvalidConfig("page budget must be positive".into()));
        }
        self.chunking.validate()
    }
}
