// Scripted stand-in for a browser, shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use nutrition_crawler::{
    BrowserSession, CrawlConfig, PageError, RenderedPage, SearchForm, SessionError,
    SessionLauncher,
};

#[derive(Debug, Default)]
pub struct SessionLog {
    pub launches: usize,
    pub opened: usize,
    pub releases: usize,
    pub navigations: Vec<String>,
    pub searches: Vec<String>,
}

#[derive(Default, Clone)]
pub struct FakeWeb {
    pages: HashMap<String, String>,
    broken: HashSet<String>,
    search_results: HashMap<String, String>,
    failing_launches: HashSet<usize>,
    pub log: Arc<Mutex<SessionLog>>,
}

impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }

    pub fn broken(mut self, url: &str) -> Self {
        self.broken.insert(url.to_string());
        self
    }

    pub fn search_result(mut self, term: &str, html: impl Into<String>) -> Self {
        self.search_results.insert(term.to_string(), html.into());
        self
    }

    /// The n-th launch (starting at 1) fails.
    pub fn failing_launch(mut self, n: usize) -> Self {
        self.failing_launches.insert(n);
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.log.lock().unwrap().navigations.clone()
    }

    /// (sessions opened, sessions released)
    pub fn session_balance(&self) -> (usize, usize) {
        let log = self.log.lock().unwrap();
        (log.opened, log.releases)
    }

    pub fn searches(&self) -> Vec<String> {
        self.log.lock().unwrap().searches.clone()
    }
}

impl SessionLauncher for FakeWeb {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let attempt = {
            let mut log = self.log.lock().unwrap();
            log.launches += 1;
            log.launches
        };
        if self.failing_launches.contains(&attempt) {
            return Err(SessionError::Launch("chrome not found".to_string()));
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(FakeSession {
            web: self.clone(),
            current: None,
        }))
    }
}

struct FakeSession {
    web: FakeWeb,
    current: Option<RenderedPage>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        self.web.log.lock().unwrap().navigations.push(url.to_string());
        if self.web.broken.contains(url) {
            self.current = None;
            return Err(PageError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_CONNECTION_RESET".to_string(),
            });
        }
        let html = self
            .web
            .pages
            .get(url)
            .cloned()
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        self.current = Some(RenderedPage {
            url: url.to_string(),
            html,
        });
        Ok(())
    }

    async fn scroll_through(&mut self) {}

    async fn snapshot(&mut self) -> Result<RenderedPage, PageError> {
        self.current.clone().ok_or_else(|| PageError::Content {
            url: "about:blank".to_string(),
            reason: "no page loaded".to_string(),
        })
    }

    async fn search(&mut self, form: &SearchForm, term: &str) -> Result<(), PageError> {
        self.web.log.lock().unwrap().searches.push(term.to_string());
        let html = self
            .web
            .search_results
            .get(term)
            .cloned()
            .ok_or_else(|| PageError::ElementMissing {
                url: "https://search.test/".to_string(),
                selector: form.input_selector.clone(),
            })?;
        self.current = Some(RenderedPage {
            url: format!("https://search.test/?q={}", term.replace(' ', "+")),
            html,
        });
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.web.log.lock().unwrap().releases += 1;
    }
}

pub fn test_config(max_pages: usize) -> CrawlConfig {
    CrawlConfig {
        max_pages_per_site: max_pages,
        ..CrawlConfig::default()
    }
    .without_delays()
}

/// A page whose main content is `text`, plus the given anchors.
pub fn article(text: &str, links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect();
    format!(
        "<html><body><nav>menu</nav><main><p>{text}</p></main><div>{anchors}</div></body></html>"
    )
}

pub fn long_text(topic: &str) -> String {
    format!("{topic} {}", "Balanced meals matter for long term health. ".repeat(4))
}

/// A page with links but no readable content: everything sits in `<nav>`.
pub fn link_hub(links: &[(&str, &str)]) -> String {
    let anchors: String = links
        .iter()
        .map(|(href, label)| format!(r#"<a href="{href}">{label}</a>"#))
        .collect();
    format!("<html><body><nav>{anchors}</nav></body></html>")
}
