use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::{BrowserSession, SessionProvider};
use anyhow::Context;
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::{OsStr, OsString};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Flags every session gets. Sandboxing is off so Chrome runs inside containers.
const BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-first-run",
    "--no-default-browser-check",
];

/// Launches headless Chrome processes
#[derive(Debug, Clone)]
pub struct ChromeProvider {
    chrome_path: Option<PathBuf>,
    idle_timeout: Duration,
}

impl ChromeProvider {
    pub fn new(chrome_path: Option<PathBuf>, idle_timeout: Duration) -> Self {
        Self {
            chrome_path,
            idle_timeout,
        }
    }
}

/// Full launch argument list: the fixed profile, then operator flags verbatim
pub fn launch_args(extra_args: &[String]) -> Vec<OsString> {
    BASE_ARGS
        .iter()
        .map(OsString::from)
        .chain(extra_args.iter().map(OsString::from))
        .collect()
}

#[async_trait]
impl SessionProvider for ChromeProvider {
    type Session = ChromeSession;

    async fn launch(&self, extra_args: &[String]) -> Result<ChromeSession> {
        let args = launch_args(extra_args);
        let chrome_path = self.chrome_path.clone();
        let idle_timeout = self.idle_timeout;

        info!("Launching headless Chrome...");

        let session = blocking(move || -> anyhow::Result<ChromeSession> {
            let arg_refs: Vec<&OsStr> = args.iter().map(OsString::as_os_str).collect();
            let options = LaunchOptions::default_builder()
                .headless(true)
                .sandbox(false)
                .path(chrome_path)
                .window_size(Some((1920, 1080)))
                .idle_browser_timeout(idle_timeout)
                .args(arg_refs)
                .build()
                .map_err(|e| anyhow::anyhow!("{e}"))
                .context("Failed to build launch options")?;

            let browser = Browser::new(options).context("Failed to launch Chrome browser")?;
            let tab = browser.new_tab().context("Failed to open tab")?;
            Ok(ChromeSession { browser, tab })
        })
        .await?
        .map_err(|e| ScrapeError::SessionLaunch(format!("{e:#}")))?;

        debug!("Chrome session ready");
        Ok(session)
    }
}

/// A headless Chrome process and its working tab.
///
/// Dropping the session drops the `Browser`, which kills the Chrome process.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
}

#[async_trait]
impl BrowserSession for ChromeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let url = url.to_string();
        blocking(move || -> anyhow::Result<()> {
            tab.navigate_to(&url)
                .with_context(|| format!("Failed to navigate to {url}"))?;
            tab.wait_until_navigated()
                .with_context(|| format!("Navigation to {url} did not complete"))?;
            Ok(())
        })
        .await?
        .map_err(ScrapeError::browser)
    }

    async fn execute(&self, script: &str) -> Result<Value> {
        let tab = Arc::clone(&self.tab);
        let script = script.to_string();
        let remote = blocking(move || tab.evaluate(&script, true))
            .await?
            .map_err(ScrapeError::browser)?;
        Ok(remote.value.unwrap_or(Value::Null))
    }

    /// The browser process is gone afterwards even when closing the tab fails
    async fn quit(self) -> Result<()> {
        blocking(move || {
            let closed = self.tab.close(false);
            drop(self.browser);
            closed
        })
        .await?
        .map_err(|e| ScrapeError::Browser(format!("closing tab failed: {e:#}")))?;
        debug!("Chrome session closed");
        Ok(())
    }
}

/// headless_chrome is synchronous; keep its calls off the async workers
async fn blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ScrapeError::Browser(format!("browser task failed: {e}")))
}
