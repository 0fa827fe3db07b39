use crate::error::Result;
use crate::models::ExtractionTarget;
use crate::scrapers::extractors::{first_match, Extractor};
use crate::scrapers::navigator::{goto, Readiness};
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::{collapse_whitespace, dedup_non_empty, SelectorChain};
use async_trait::async_trait;
use tracing::{info, warn};

const READY: &[&str] = &[
    r#"div[role="dialog"] ul li"#,
    r#"[data-testid="modal-container"] ul li"#,
    r#"[data-section-id="AMENITIES_DEFAULT"] li"#,
];

/// Containers holding one amenity category each
const LISTS: &[&str] = &[
    r#"div[role="dialog"] ul"#,
    r#"[data-testid="modal-container"] ul"#,
    r#"[data-section-id="AMENITIES_DEFAULT"] ul"#,
];

/// Items carrying these are not amenities the listing has
const EXCLUDED: &[&str] = &["Unavailable:", "Show all"];

/// Amenity names from `{url}/amenities`
pub struct AmenitiesExtractor {
    ready: SelectorChain,
    lists: SelectorChain,
    readiness: Readiness,
}

impl AmenitiesExtractor {
    pub fn new(readiness: Readiness) -> Self {
        Self {
            ready: SelectorChain::new(READY),
            lists: SelectorChain::new(LISTS),
            readiness,
        }
    }
}

/// Trimmed amenity names, minus sentinels and repeats
pub fn clean_amenities<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    dedup_non_empty(
        items
            .into_iter()
            .map(|item| collapse_whitespace(&item))
            .filter(|item| !EXCLUDED.iter().any(|s| item.contains(s))),
    )
}

#[async_trait]
impl Extractor for AmenitiesExtractor {
    type Output = Vec<String>;

    fn name(&self) -> &'static str {
        "amenities"
    }

    async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<Vec<String>> {
        let url = target.subpage("amenities");
        match goto(session, url.as_str(), &self.ready, self.readiness).await {
            Ok(_) => {}
            Err(e) if e.is_section_absent() => {
                warn!(url = %url, "No amenities list, returning none");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        }

        let Some((list, _)) = first_match(session, &self.lists).await? else {
            return Ok(Vec::new());
        };
        let items = session.find_all(&format!("{list} li")).await?;
        let amenities = clean_amenities(items.into_iter().map(|el| el.text));

        info!(count = amenities.len(), "Extracted amenities");
        Ok(amenities)
    }
}
