use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nutrition_crawler::config::{
    ChunkingConfig, CrawlConfig, HarvestConfig, SiteConfig, DEFAULT_CHUNK_OVERLAP,
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES_PER_SITE, DEFAULT_MIN_CONTENT_LEN,
    DEFAULT_MIN_INDEX_LEN, DEFAULT_STORE_DIR,
};
use nutrition_crawler::{load_or_harvest, ChromeLauncher, ChunkStore};

/// Harvest nutrition sites into chunked text for indexing.
#[derive(Parser, Debug)]
#[command(name = "nutrition-crawler", version)]
struct Cli {
    /// Site to crawl as NAME=URL. Repeat to replace the built-in site list.
    #[arg(long = "site", value_name = "NAME=URL")]
    sites: Vec<SiteConfig>,

    /// Maximum pages fetched per site.
    #[arg(long, env = "HARVEST_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES_PER_SITE)]
    max_pages: usize,

    /// Link hops followed from each seed page.
    #[arg(long, env = "HARVEST_MAX_DEPTH", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Minimum characters for a followed page to be kept.
    #[arg(long, env = "HARVEST_MIN_CONTENT", default_value_t = DEFAULT_MIN_CONTENT_LEN)]
    min_content: usize,

    /// Minimum characters of site text for the site to be indexed.
    #[arg(long, env = "HARVEST_MIN_INDEX", default_value_t = DEFAULT_MIN_INDEX_LEN)]
    min_index: usize,

    #[arg(long, env = "HARVEST_CHUNK_SIZE", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    #[arg(long, env = "HARVEST_CHUNK_OVERLAP", default_value_t = DEFAULT_CHUNK_OVERLAP)]
    chunk_overlap: usize,

    /// Directory holding the chunk store.
    #[arg(long, env = "HARVEST_STORE_DIR", default_value = DEFAULT_STORE_DIR)]
    store_dir: PathBuf,

    #[arg(long, env = "HARVEST_HEADLESS", default_value_t = true, action = ArgAction::Set)]
    headless: bool,

    /// Harvest again even if a chunk store exists.
    #[arg(long)]
    force: bool,
}

impl Cli {
    fn to_config(&self) -> HarvestConfig {
        let sites = if self.sites.is_empty() {
            SiteConfig::reference_sites()
        } else {
            self.sites.clone()
        };
        HarvestConfig {
            sites,
            crawl: CrawlConfig {
                max_pages_per_site: self.max_pages,
                max_depth: self.max_depth,
                min_content_len: self.min_content,
                ..CrawlConfig::default()
            },
            chunking: ChunkingConfig {
                chunk_size: self.chunk_size,
                chunk_overlap: self.chunk_overlap,
            },
            min_index_len: self.min_index,
            store_dir: self.store_dir.clone(),
            headless: self.headless,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.to_config();
    config.validate()?;

    let store = ChunkStore::new(&config.store_dir);
    let launcher = ChromeLauncher::new(config.headless, config.crawl.clone());
    let records = load_or_harvest(&store, &launcher, &config, cli.force).await?;

    let mut per_site: BTreeMap<&str, usize> = BTreeMap::new();
    for record in &records {
        *per_site.entry(record.site.as_str()).or_default() += 1;
    }
    for (site, count) in &per_site {
        info!("📚 {}: {} chunks", site, count);
    }
    info!(
        "✅ {} chunks ready for indexing at {}",
        records.len(),
        store.path().display()
    );
    Ok(())
}
