//! Field extractors. Each one navigates its own session to its own target,
//! waits for its own readiness chain and produces one result field.

pub mod amenities;
pub mod main_text;
pub mod photos;
pub mod reviews;

pub use amenities::AmenitiesExtractor;
pub use main_text::MainTextExtractor;
pub use photos::PhotosExtractor;
pub use reviews::ReviewsExtractor;

use crate::error::Result;
use crate::models::ExtractionTarget;
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::{ElementSnapshot, SelectorChain};
use async_trait::async_trait;
use tracing::debug;

#[async_trait]
pub trait Extractor: Send + Sync {
    type Output: Send;

    /// Short name used in logs and session bookkeeping
    fn name(&self) -> &'static str;

    /// Produce this extractor's field using a session nobody else touches
    async fn extract<S: BrowserSession>(
        &self,
        session: &S,
        target: &ExtractionTarget,
    ) -> Result<Self::Output>;
}

/// Elements of the first candidate in `chain` that matches anything
pub async fn first_match<S: BrowserSession>(
    session: &S,
    chain: &SelectorChain,
) -> Result<Option<(&'static str, Vec<ElementSnapshot>)>> {
    for &selector in chain.candidates() {
        let found = session.find_all(selector).await?;
        if !found.is_empty() {
            debug!(selector, count = found.len(), "Selector matched");
            return Ok(Some((selector, found)));
        }
    }
    Ok(None)
}
