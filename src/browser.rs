use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::{CrawlConfig, USER_AGENT, WINDOW_SIZE};
use crate::error::{PageError, SessionError};

// Bottom, top, middle: enough to wake up most lazy loaders.
const SCROLL_SCRIPTS: [(&str, &str); 3] = [
    ("bottom", "window.scrollTo(0, document.body.scrollHeight);"),
    ("top", "window.scrollTo(0, 0);"),
    ("middle", "window.scrollTo(0, document.body.scrollHeight / 2);"),
];

/// Markup of a page as the browser sees it after scripts have run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPage {
    /// Final URL after redirects.
    pub url: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitAction {
    /// Click the element matching this selector.
    ClickButton(String),
    /// Submit the form that owns the search input.
    SubmitForm,
}

/// Where a site keeps its search box and how to send it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchForm {
    pub input_selector: String,
    pub submit: SubmitAction,
}

/// One live browser. Whoever launched it owns it; dropping it ends the process.
#[async_trait]
pub trait BrowserSession: Send {
    /// Go to `url` and wait (bounded) for the document body. A readiness timeout
    /// is not an error, only a failed navigation is.
    async fn navigate(&mut self, url: &str) -> Result<(), PageError>;

    /// Scroll around the current page to trigger lazy content. Never fails.
    async fn scroll_through(&mut self);

    /// Current document markup.
    async fn snapshot(&mut self) -> Result<RenderedPage, PageError>;

    /// Clear the search input, type `term`, submit, and wait for the result page.
    async fn search(&mut self, form: &SearchForm, term: &str) -> Result<(), PageError>;

    async fn render(&mut self, url: &str) -> Result<RenderedPage, PageError> {
        self.navigate(url).await?;
        self.scroll_through().await;
        self.snapshot().await
    }
}

/// Acquires sessions. Called once per site crawl.
pub trait SessionLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError>;
}

/// Launches headless Chrome through the DevTools protocol.
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    headless: bool,
    timing: CrawlConfig,
}

impl ChromeLauncher {
    pub fn new(headless: bool, timing: CrawlConfig) -> Self {
        Self { headless, timing }
    }
}

impl SessionLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, SessionError> {
        let ua_arg = format!("--user-agent={}", USER_AGENT);
        let args = vec![
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--disable-gpu"),
            OsStr::new(&ua_arg),
        ];

        let browser = Browser::new(LaunchOptions {
            headless: self.headless,
            sandbox: false,
            window_size: Some(WINDOW_SIZE),
            idle_browser_timeout: Duration::from_secs(120),
            args,
            ..Default::default()
        })
        .map_err(|e| SessionError::Launch(format!("{e:#}")))?;

        let tab = browser
            .new_tab()
            .map_err(|e| SessionError::Launch(format!("could not open tab: {e:#}")))?;

        info!("🧭 Browser session started (headless: {})", self.headless);
        Ok(Box::new(ChromeSession {
            _browser: browser,
            tab,
            timing: self.timing.clone(),
        }))
    }
}

pub struct ChromeSession {
    // Held only so the Chrome process lives exactly as long as the session.
    _browser: Browser,
    tab: Arc<Tab>,
    timing: CrawlConfig,
}

impl ChromeSession {
    async fn wait_for_ready(&self, url: &str) {
        match self
            .tab
            .wait_for_element_with_custom_timeout("body", self.timing.page_load_timeout)
        {
            Ok(_) => debug!("Page body loaded: {}", url),
            Err(e) => warn!("⚠️ Body wait timed out on {}: {}. Extracting anyway...", url, e),
        }
        sleep(self.timing.settle_pause).await;
    }

    fn fill_and_submit(&self, form: &SearchForm, term: &str) -> Result<(), PageError> {
        let url = self.tab.get_url();
        let input = self
            .tab
            .find_element(&form.input_selector)
            .map_err(|_| PageError::ElementMissing {
                url: url.clone(),
                selector: form.input_selector.clone(),
            })?;

        let script_err = |e: anyhow::Error| PageError::Script {
            url: url.clone(),
            reason: format!("{e:#}"),
        };

        input
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(script_err)?;
        input.type_into(term).map_err(script_err)?;

        match &form.submit {
            SubmitAction::ClickButton(selector) => {
                let button =
                    self.tab
                        .find_element(selector)
                        .map_err(|_| PageError::ElementMissing {
                            url: url.clone(),
                            selector: selector.clone(),
                        })?;
                button.click().map_err(script_err)?;
            }
            SubmitAction::SubmitForm => {
                let submitted = input
                    .call_js_fn(
                        "function() { if (!this.form) { return false; } this.form.submit(); return true; }",
                        vec![],
                        false,
                    )
                    .map_err(script_err)?;
                if submitted.value != Some(serde_json::Value::Bool(true)) {
                    return Err(PageError::ElementMissing {
                        url,
                        selector: format!("form owning {}", form.input_selector),
                    });
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&mut self, url: &str) -> Result<(), PageError> {
        debug!("Navigating to: {}", url);
        self.tab
            .navigate_to(url)
            .map_err(|e| PageError::Navigation {
                url: url.to_string(),
                reason: format!("{e:#}"),
            })?;
        self.wait_for_ready(url).await;
        Ok(())
    }

    async fn scroll_through(&mut self) {
        for (position, script) in SCROLL_SCRIPTS {
            if let Err(e) = self.tab.evaluate(script, false) {
                debug!("Scroll to {} failed (ignored): {}", position, e);
            }
            sleep(self.timing.scroll_pause).await;
        }
    }

    async fn snapshot(&mut self) -> Result<RenderedPage, PageError> {
        let url = self.tab.get_url();
        let html = self.tab.get_content().map_err(|e| PageError::Content {
            url: url.clone(),
            reason: format!("{e:#}"),
        })?;
        debug!("Got content of {}. Length: {}", url, html.len());
        Ok(RenderedPage { url, html })
    }

    async fn search(&mut self, form: &SearchForm, term: &str) -> Result<(), PageError> {
        self.fill_and_submit(form, term)?;
        let url = self.tab.get_url();
        if let Err(e) = self.tab.wait_until_navigated() {
            debug!("No navigation observed after submitting '{}': {}", term, e);
        }
        self.wait_for_ready(&url).await;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        info!("🧹 Closing browser session");
    }
}
