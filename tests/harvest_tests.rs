// Tests for the harvest orchestrator and the chunk store hand-off

mod common;

use common::{article, long_text, test_config, FakeWeb};
use nutrition_crawler::{
    harvest_all, load_or_harvest, ChunkStore, ChunkingConfig, HarvestConfig, HarvestError,
    SiteConfig,
};

const EATRIGHT: &str = "https://www.eatright.org/";
const HARVARD: &str = "https://nutritionsource.hsph.harvard.edu/";
const PUBMED: &str = "https://pubmed.ncbi.nlm.nih.gov/";

fn sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig::new("eatright", EATRIGHT),
        SiteConfig::new("harvard_nutrition", HARVARD),
    ]
}

// ============================================================================
// Orchestration
// ============================================================================

#[tokio::test]
async fn test_failed_site_does_not_stop_the_harvest() {
    let web = FakeWeb::new()
        .failing_launch(1)
        .page(EATRIGHT, article(&long_text("Eatright"), &[]))
        .page(HARVARD, article(&long_text("Harvard"), &[]));

    let harvest = harvest_all(&web, &test_config(50), &sites()).await.unwrap();

    assert_eq!(harvest.sites.len(), 2);
    assert_eq!(harvest.text_for("eatright"), Some(""));
    assert_eq!(harvest.sites[0].failures, 1);
    assert!(harvest.text_for("harvard_nutrition").unwrap().starts_with("Harvard"));
    assert_eq!(web.navigations(), vec![HARVARD.to_string()]);
}

#[tokio::test]
async fn test_all_sites_empty_is_an_error() {
    let web = FakeWeb::new().broken(EATRIGHT).failing_launch(2);

    let result = harvest_all(&web, &test_config(50), &sites()).await;

    assert!(matches!(result, Err(HarvestError::NothingToIndex { sites: 2 })));
}

#[tokio::test]
async fn test_dispatches_search_sites_to_search_crawler() {
    let web = FakeWeb::new()
        .page(PUBMED, article("PubMed", &[]))
        .search_result("diabetes nutrition management", article("Diabetes abstract", &[]))
        .page(EATRIGHT, article(&long_text("Eatright"), &[]));
    let sites = vec![
        SiteConfig::new("pubmed", PUBMED),
        SiteConfig::new("eatright", EATRIGHT),
    ];

    let harvest = harvest_all(&web, &test_config(50), &sites).await.unwrap();

    assert_eq!(web.searches().len(), 3);
    assert_eq!(
        harvest.text_for("pubmed"),
        Some("PubMed Search Results for 'diabetes nutrition management':\nDiabetes abstract")
    );
    assert!(harvest.text_for("eatright").unwrap().starts_with("Eatright"));
    // One session per site, each released.
    assert_eq!(web.session_balance(), (2, 2));
}

#[tokio::test]
async fn test_visited_set_spans_the_whole_run() {
    let web = FakeWeb::new().page(EATRIGHT, article(&long_text("Eatright"), &[]));
    let sites = vec![
        SiteConfig::new("eatright", EATRIGHT),
        SiteConfig::new("eatright_mirror", EATRIGHT),
    ];

    let harvest = harvest_all(&web, &test_config(50), &sites).await.unwrap();

    assert_eq!(web.navigations().len(), 1);
    assert_eq!(harvest.text_for("eatright_mirror"), Some(""));
    assert_eq!(harvest.urls_visited, 1);
}

// ============================================================================
// Store hand-off
// ============================================================================

fn harvest_config(dir: &std::path::Path) -> HarvestConfig {
    HarvestConfig {
        sites: sites(),
        crawl: test_config(50),
        chunking: ChunkingConfig::default(),
        min_index_len: 100,
        store_dir: dir.to_path_buf(),
        headless: true,
    }
}

#[tokio::test]
async fn test_existing_store_is_reused() {
    let dir = tempfile::tempdir().unwrap();
    let config = harvest_config(dir.path());
    let store = ChunkStore::new(dir.path());
    let body = "Legumes provide protein and fiber. ".repeat(40);
    let web = FakeWeb::new()
        .page(EATRIGHT, article(&body, &[]))
        .page(HARVARD, article("tiny", &[]));

    let built = load_or_harvest(&store, &web, &config, false).await.unwrap();
    assert!(built.len() > 1);
    // Too short to be worth indexing.
    assert!(built.iter().all(|r| r.site == "eatright"));
    assert!(built.iter().all(|r| r.text.chars().count() <= 500));

    let launches_before = web.session_balance();
    let loaded = load_or_harvest(&store, &web, &config, false).await.unwrap();
    assert_eq!(loaded, built);
    assert_eq!(web.session_balance(), launches_before);
}

#[tokio::test]
async fn test_force_rebuilds_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = harvest_config(dir.path());
    let store = ChunkStore::new(dir.path());
    let web = FakeWeb::new().page(EATRIGHT, article(&long_text("Eatright"), &[]));

    let first = load_or_harvest(&store, &web, &config, false).await.unwrap();
    let second = load_or_harvest(&store, &web, &config, true).await.unwrap();

    assert_ne!(first[0].run_id, second[0].run_id);
    assert_eq!(store.load().unwrap(), second);
}

#[tokio::test]
async fn test_page_threshold_does_not_change_site_indexing() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = harvest_config(dir.path());
    config.crawl.min_content_len = 1000;
    let store = ChunkStore::new(dir.path());
    // Seed pages are kept whatever the page threshold; 200-odd chars clears the site one.
    let web = FakeWeb::new().page(EATRIGHT, article(&long_text("Eatright"), &[]));

    let records = load_or_harvest(&store, &web, &config, false).await.unwrap();

    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.site == "eatright"));
}

#[tokio::test]
async fn test_nothing_to_index_leaves_no_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = harvest_config(dir.path());
    let store = ChunkStore::new(dir.path());
    let web = FakeWeb::new().page(EATRIGHT, article("short", &[]));

    let result = load_or_harvest(&store, &web, &config, false).await;

    assert!(matches!(result, Err(HarvestError::NothingToIndex { .. })));
    assert!(!store.exists());
}
