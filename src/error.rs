use std::time::Duration;

/// Errors raised while driving a browser session through an extraction.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// The input identifier is not an absolute http(s) URL.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The browser process could not be started.
    #[error("Failed to launch browser: {0}")]
    SessionLaunch(String),

    /// No readiness selector matched before the wait budget ran out.
    #[error("Timed out after {timeout:?} waiting for [{selectors}] on {url}")]
    NavigationTimeout {
        url: String,
        selectors: String,
        timeout: Duration,
    },

    /// The photo gallery could not be brought into view.
    #[error("Photo extraction timed out on {url}: {reason}")]
    ExtractionTimeout { url: String, reason: String },

    /// Unexpected failure talking to the page (script evaluation, CDP, task join).
    #[error("Browser error: {0}")]
    Browser(String),

    /// The whole pipeline exceeded its wall-clock budget.
    #[error("Extraction did not finish within {0:?}")]
    PipelineTimeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ScrapeError {
    /// Wraps an `anyhow` error coming out of headless_chrome.
    pub fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser(format!("{err:#}"))
    }

    /// True when the failure only means the awaited section never rendered.
    pub fn is_section_absent(&self) -> bool {
        matches!(self, Self::NavigationTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
