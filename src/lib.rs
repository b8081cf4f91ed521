pub mod browser;
pub mod chunker;
pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod harvest;
pub mod links;
pub mod search;
pub mod store;

pub use browser::{BrowserSession, ChromeLauncher, RenderedPage, SearchForm, SessionLauncher, SubmitAction};
pub use chunker::{Chunk, TextChunker};
pub use config::{ChunkingConfig, CrawlConfig, HarvestConfig, SiteConfig};
pub use crawler::{crawl_site, CrawlPhase, HarvestRun, PageContent, SiteCrawl};
pub use error::{HarvestError, PageError, SessionError};
pub use harvest::{harvest_all, CrawlStrategy, Harvest, SiteHarvest};
pub use search::{crawl_search_site, SearchProfile};
pub use store::{load_or_harvest, ChunkRecord, ChunkStore};
