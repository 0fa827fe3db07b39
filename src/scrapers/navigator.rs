use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::SelectorChain;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Cookie banners that sit on top of listing content
const CONSENT_BUTTONS: &[&str] = &[
    r#"button[data-testid="accept-btn"]"#,
    r#"button[id*="accept"]"#,
    r#"[data-testid="main-cookies-banner-container"] button"#,
];

/// Doubling poll interval, capped
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    next: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self { next: initial, max }
    }

    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(self.max);
        delay
    }
}

/// How long to wait for readiness and how to poll for it
#[derive(Debug, Clone, Copy)]
pub struct Readiness {
    pub timeout: Duration,
    /// Fixed pause after readiness; covers rendering no selector can observe
    pub settle: Duration,
    pub poll_initial: Duration,
    pub poll_max: Duration,
}

impl Readiness {
    pub fn with_timeout(self, timeout: Duration) -> Self {
        Self { timeout, ..self }
    }
}

/// Load `url` and block until `ready` matches, then settle.
///
/// Returns the selector that signalled readiness.
pub async fn goto<S: BrowserSession>(
    session: &S,
    url: &str,
    ready: &SelectorChain,
    readiness: Readiness,
) -> Result<&'static str> {
    info!(url, "Navigating");
    session.navigate(url).await?;

    let matched = wait_for_any(session, ready, readiness).await.map_err(|e| match e {
        ScrapeError::NavigationTimeout { selectors, timeout, .. } => ScrapeError::NavigationTimeout {
            url: url.to_string(),
            selectors,
            timeout,
        },
        other => other,
    })?;
    debug!(url, selector = matched, "Page ready");

    dismiss_consent(session).await;

    if !readiness.settle.is_zero() {
        sleep(readiness.settle).await;
    }
    Ok(matched)
}

/// Poll the chain until some candidate matches at least one element
pub async fn wait_for_any<S: BrowserSession>(
    session: &S,
    chain: &SelectorChain,
    readiness: Readiness,
) -> Result<&'static str> {
    let deadline = Instant::now() + readiness.timeout;
    let mut backoff = Backoff::new(readiness.poll_initial, readiness.poll_max);

    loop {
        for &selector in chain.candidates() {
            if !session.find_all(selector).await?.is_empty() {
                return Ok(selector);
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ScrapeError::NavigationTimeout {
                url: String::new(),
                selectors: chain.to_string(),
                timeout: readiness.timeout,
            });
        }
        sleep(backoff.next_delay().min(deadline - now)).await;
    }
}

/// Best effort; a banner that will not close is not worth failing over
async fn dismiss_consent<S: BrowserSession>(session: &S) {
    for selector in CONSENT_BUTTONS {
        if let Ok(true) = session.click(selector).await {
            debug!(selector, "Dismissed cookie banner");
            return;
        }
    }
}
