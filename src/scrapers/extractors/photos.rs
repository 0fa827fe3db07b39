use crate::config::ScrollConfig;
use crate::error::{Result, ScrapeError};
use crate::models::ExtractionTarget;
use crate::scrapers::extractors::{first_match, Extractor};
use crate::scrapers::navigator::{goto, wait_for_any, Readiness};
use crate::scrapers::scroll::scroll_until_stable;
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::{dedup_non_empty, ElementSnapshot, SelectorChain};
use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

const READY: &[&str] = &["picture source[srcset]", "img[srcset]", "img[src]"];

const SHOW_ALL: &[&str] = &[
    r#"button[aria-label*="Show all photos"]"#,
    r#"button[data-testid="show-all-photos"]"#,
];

const GALLERY: &[&str] = &[
    r#"[data-testid="photo-viewer-section"] img"#,
    r#"div[role="dialog"] picture source"#,
    r#"div[role="dialog"] img"#,
];

/// Elements whose attributes carry photo URLs, most specific first
const CANDIDATES: &[&str] = &[
    r#"[data-testid="photo-viewer-section"] picture source"#,
    r#"[data-testid="photo-viewer-section"] img"#,
    r#"div[role="dialog"] picture source"#,
    r#"div[role="dialog"] img"#,
    "picture source",
    "img",
];

/// Attributes scanned for URLs, responsive-image set first
const URL_ATTRIBUTES: &[&str] = &["srcset", "data-original-uri", "src"];

/// Deep link opening the photo tour without clicking
const PHOTO_MODAL: (&str, &str) = ("modal", "PHOTO_TOUR_SCROLLABLE");

/// High-resolution photo URLs from the listing's photo tour
pub struct PhotosExtractor {
    ready: SelectorChain,
    show_all: SelectorChain,
    gallery: SelectorChain,
    candidates: SelectorChain,
    url_pattern: Regex,
    readiness: Readiness,
    scroll: ScrollConfig,
}

impl PhotosExtractor {
    pub fn new(readiness: Readiness, scroll: ScrollConfig, url_pattern: &str) -> Result<Self> {
        let url_pattern = Regex::new(url_pattern)
            .map_err(|e| ScrapeError::Config(format!("photos.url_pattern: {e}")))?;
        Ok(Self {
            ready: SelectorChain::new(READY),
            show_all: SelectorChain::new(SHOW_ALL),
            gallery: SelectorChain::new(GALLERY),
            candidates: SelectorChain::new(CANDIDATES),
            url_pattern,
            readiness,
            scroll,
        })
    }

    /// Matching URLs from every candidate's URL attributes; everything else is dropped
    pub fn photo_urls(&self, candidates: &[ElementSnapshot]) -> Vec<String> {
        let found = candidates.iter().flat_map(|el| {
            URL_ATTRIBUTES
                .iter()
                .filter_map(|name| el.attr(name))
                .flat_map(|value| self.url_pattern.find_iter(value))
                .map(|m| m.as_str().to_string())
        });
        dedup_non_empty(found)
    }

    /// Click through to the gallery, or load it by deep link when that fails
    async fn open_gallery<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<()> {
        let base = target.url().as_str();
        goto(session, base, &self.ready, self.readiness)
            .await
            .map_err(|e| as_extraction_timeout(e, base))?;

        for &selector in self.show_all.candidates() {
            if !session.click(selector).await? {
                continue;
            }
            debug!(selector, "Opened photo gallery");
            match wait_for_any(session, &self.gallery, self.readiness).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_section_absent() => break,
                Err(e) => return Err(e),
            }
        }

        let deep_link = target.with_query(PHOTO_MODAL.0, PHOTO_MODAL.1);
        warn!(url = %deep_link, "Show-all control unavailable, using deep link");
        goto(session, deep_link.as_str(), &self.gallery, self.readiness)
            .await
            .map_err(|e| as_extraction_timeout(e, deep_link.as_str()))?;
        Ok(())
    }
}

fn as_extraction_timeout(err: ScrapeError, url: &str) -> ScrapeError {
    match err {
        ScrapeError::NavigationTimeout { selectors, timeout, .. } => ScrapeError::ExtractionTimeout {
            url: url.to_string(),
            reason: format!("no match for [{selectors}] within {timeout:?}"),
        },
        other => other,
    }
}

#[async_trait]
impl Extractor for PhotosExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "photos"
    }

    async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<Vec<String>> {
        self.open_gallery(session, target).await?;
        let scrolled = scroll_until_stable(session, self.scroll).await?;
        debug!(
            attempts = scrolled.attempts,
            complete = scrolled.stable,
            "Gallery loaded"
        );

        let photos = match first_match(session, &self.candidates).await? {
            Some((_, found)) => self.photo_urls(&found),
            None => Vec::new(),
        };
        info!(count = photos.len(), "Extracted photos");
        Ok(photos)
    }
}
