use thiserror::Error;

/// Failure while rendering or reading a single page. Always recoverable:
/// callers log it and treat the page as having no content.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element `{selector}` not found on {url}")]
    ElementMissing { url: String, selector: String },

    #[error("script evaluation failed on {url}: {reason}")]
    Script { url: String, reason: String },

    #[error("could not read page content of {url}: {reason}")]
    Content { url: String, reason: String },
}

/// The browser could not be started. Fatal for the site being crawled, nothing else.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to launch browser: {0}")]
    Launch(String),
}

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no documents to index: all {sites} configured sites came back empty")]
    NothingToIndex { sites: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("chunk store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("chunk store record is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}
