use crate::error::Result;
use crate::models::ExtractionTarget;
use crate::scrapers::extractors::Extractor;
use crate::scrapers::navigator::{goto, Readiness};
use crate::scrapers::sanitizer::{sanitize, visible_text};
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::SelectorChain;
use async_trait::async_trait;
use tracing::info;

const READY: &[&str] = &[
    r#"[data-section-id="DESCRIPTION_DEFAULT"]"#,
    r#"[data-section-id="TITLE_DEFAULT"]"#,
    "main",
    "#site-content",
    "body",
];

/// Sanitized, whitespace-collapsed text of the base page
pub struct MainTextExtractor {
    ready: SelectorChain,
    readiness: Readiness,
}

impl MainTextExtractor {
    pub fn new(readiness: Readiness) -> Self {
        Self {
            ready: SelectorChain::new(READY),
            readiness,
        }
    }
}

#[async_trait]
impl Extractor for MainTextExtractor {
    type Output = String;

    fn name(&self) -> &'static str {
        "main_text"
    }

    async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<String> {
        goto(session, target.url().as_str(), &self.ready, self.readiness).await?;
        sanitize(session).await?;

        let html = session.content().await?;
        let text = visible_text(&html);
        info!(chars = text.len(), "Extracted main text");
        Ok(text)
    }
}
