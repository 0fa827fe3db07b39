//! Runtime configuration for the listing scout.

use crate::error::ScrapeError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Space-separated Chrome flags
const EXTRA_ARGS_VAR: &str = "SCRAPER_BROWSER__EXTRA_ARGS";

/// Browser launch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Extra Chrome flags appended verbatim after the fixed profile
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Chrome binary; auto-detected when unset
    #[serde(default)]
    pub chrome_path: Option<PathBuf>,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Upper bound on live browser sessions across all pipelines
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_idle_timeout_secs() -> u64 {
    120
}

fn default_max_sessions() -> usize {
    4
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            extra_args: Vec::new(),
            chrome_path: None,
            idle_timeout_secs: default_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

/// Wait budgets and delays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Readiness budget for primary content
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// Readiness budget for sections known to render slowly (reviews)
    #[serde(default = "default_slow_navigation_timeout_ms")]
    pub slow_navigation_timeout_ms: u64,
    /// Fixed pause after readiness for rendering the readiness selector cannot observe
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_poll_initial_ms")]
    pub poll_initial_ms: u64,
    #[serde(default = "default_poll_max_ms")]
    pub poll_max_ms: u64,
    /// Wall-clock ceiling for one `extract` call
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_timeout_secs: u64,
}

fn default_navigation_timeout_ms() -> u64 {
    10_000
}

fn default_slow_navigation_timeout_ms() -> u64 {
    20_000
}

fn default_settle_delay_ms() -> u64 {
    1_500
}

fn default_poll_initial_ms() -> u64 {
    100
}

fn default_poll_max_ms() -> u64 {
    1_000
}

fn default_pipeline_timeout_secs() -> u64 {
    180
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            slow_navigation_timeout_ms: default_slow_navigation_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            poll_initial_ms: default_poll_initial_ms(),
            poll_max_ms: default_poll_max_ms(),
            pipeline_timeout_secs: default_pipeline_timeout_secs(),
        }
    }
}

impl TimingConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn slow_navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.slow_navigation_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }
}

/// Tuning for the scroll-until-stable loop
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub max_attempts: u32,
    pub delay_ms: u64,
}

impl ScrollConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

fn default_reviews_scroll() -> ScrollConfig {
    ScrollConfig {
        max_attempts: 30,
        delay_ms: 1_500,
    }
}

/// Reviews extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewsConfig {
    #[serde(default = "default_reviews_scroll")]
    pub scroll: ScrollConfig,
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            scroll: default_reviews_scroll(),
        }
    }
}

fn default_photos_scroll() -> ScrollConfig {
    ScrollConfig {
        max_attempts: 20,
        delay_ms: 2_000,
    }
}

fn default_photo_url_pattern() -> String {
    r"https://a0\.muscache\.com/im/pictures/[^\s,?]+\.(?:jpe?g|png|webp)".to_string()
}

/// Photos extractor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotosConfig {
    #[serde(default = "default_photos_scroll")]
    pub scroll: ScrollConfig,
    /// Regex a candidate must match to count as a high-resolution photo
    #[serde(default = "default_photo_url_pattern")]
    pub url_pattern: String,
}

impl Default for PhotosConfig {
    fn default() -> Self {
        Self {
            scroll: default_photos_scroll(),
            url_pattern: default_photo_url_pattern(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bearer token callers must present. Required, never defaulted.
    pub api_key: String,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub reviews: ReviewsConfig,
    #[serde(default)]
    pub photos: PhotosConfig,
}

impl AppConfig {
    /// Load configuration from `scraper.toml` (optional) and `SCRAPER_*` environment variables
    pub fn load() -> Result<Self, ScrapeError> {
        Self::load_from(std::env::vars().collect())
    }

    fn load_from(vars: config::Map<String, String>) -> Result<Self, ScrapeError> {
        // Env values stay strings so secrets like `00123` survive untouched;
        // numeric fields are converted during deserialization instead.
        let extra_args = vars
            .get(EXTRA_ARGS_VAR)
            .map(|v| v.split_whitespace().map(str::to_string).collect::<Vec<_>>());

        let config = config::Config::builder()
            .add_source(config::File::with_name("scraper").required(false))
            // SCRAPER_API_KEY, SCRAPER_TIMING__SETTLE_DELAY_MS, ...
            .add_source(
                config::Environment::with_prefix("SCRAPER")
                    .prefix_separator("_")
                    .separator("__")
                    .source(Some(vars)),
            )
            .set_override_option("browser.extra_args", extra_args)
            .and_then(|builder| builder.build())
            .map_err(|e| ScrapeError::Config(e.to_string()))?;

        let app: AppConfig = config
            .try_deserialize()
            .map_err(|e| ScrapeError::Config(e.to_string()))?;
        app.validate()?;
        Ok(app)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.api_key.trim().is_empty() {
            return Err(ScrapeError::Config(
                "api_key must be set (SCRAPER_API_KEY)".to_string(),
            ));
        }
        if self.browser.max_sessions == 0 {
            return Err(ScrapeError::Config(
                "browser.max_sessions must be at least 1".to_string(),
            ));
        }
        if self.reviews.scroll.max_attempts == 0 || self.photos.scroll.max_attempts == 0 {
            return Err(ScrapeError::Config(
                "scroll max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timing.poll_initial_ms == 0 || self.timing.poll_max_ms < self.timing.poll_initial_ms {
            return Err(ScrapeError::Config(
                "timing.poll_initial_ms must be non-zero and not exceed poll_max_ms".to_string(),
            ));
        }
        regex::Regex::new(&self.photos.url_pattern)
            .map_err(|e| ScrapeError::Config(format!("photos.url_pattern: {e}")))?;
        Ok(())
    }

    /// Configuration with every default and the given key
    #[cfg(test)]
    pub fn with_api_key(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            browser: BrowserConfig::default(),
            timing: TimingConfig::default(),
            reviews: ReviewsConfig::default(),
            photos: PhotosConfig::default(),
        }
    }
}
