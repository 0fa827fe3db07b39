use crate::config::ScrollConfig;
use crate::error::Result;
use crate::models::ExtractionTarget;
use crate::scrapers::extractors::{first_match, Extractor};
use crate::scrapers::navigator::{goto, Readiness};
use crate::scrapers::scroll::scroll_until_stable;
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::{collapse_whitespace, dedup_non_empty, SelectorChain};
use async_trait::async_trait;
use tracing::{debug, info, warn};

const READY: &[&str] = &[
    r#"[data-testid="pdp-reviews-modal-scrollable-panel"]"#,
    r#"div[role="dialog"] [data-review-id]"#,
    r#"[data-section-id="REVIEWS_DEFAULT"]"#,
    "[data-review-id]",
];

const REVIEW_TEXT: &[&str] = &[
    r#"[data-review-id] span[lang]"#,
    r#"[data-review-id] [data-testid="review-text"]"#,
    "[data-review-id]",
    r#"[data-section-id="REVIEWS_DEFAULT"] li"#,
];

/// Review texts from `{url}/reviews`, scrolled until the list stops growing
pub struct ReviewsExtractor {
    ready: SelectorChain,
    text: SelectorChain,
    readiness: Readiness,
    scroll: ScrollConfig,
}

impl ReviewsExtractor {
    /// `readiness` should carry the slow-section timeout
    pub fn new(readiness: Readiness, scroll: ScrollConfig) -> Self {
        Self {
            ready: SelectorChain::new(READY),
            text: SelectorChain::new(REVIEW_TEXT),
            readiness,
            scroll,
        }
    }
}

#[async_trait]
impl Extractor for ReviewsExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "reviews"
    }

    async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<Vec<String>> {
        let url = target.subpage("reviews");
        match goto(session, url.as_str(), &self.ready, self.readiness).await {
            Ok(_) => {}
            Err(e) if e.is_section_absent() => {
                warn!(url = %url, "No reviews section, returning none");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }

        let scrolled = scroll_until_stable(session, self.scroll).await?;
        debug!(
            attempts = scrolled.attempts,
            height = scrolled.final_height,
            complete = scrolled.stable,
            "Review list loaded"
        );

        let reviews = match first_match(session, &self.text).await? {
            Some((_, found)) => {
                dedup_non_empty(found.into_iter().map(|el| collapse_whitespace(&el.text)))
            }
            None => Vec::new(),
        };
        info!(count = reviews.len(), "Extracted reviews");
        Ok(reviews)
    }
}
