//! Chooses extractors by page kind, runs them and assembles the result.
//!
//! Failure policy is strict: detail extractors already turn a missing
//! section into an empty list, so anything they still return as an error is
//! an infrastructure failure and fails the whole call. All four detail
//! extractors always run to completion first, each releasing its own session.

use crate::config::AppConfig;
use crate::error::{Result, ScrapeError};
use crate::models::{ExtractionResult, ExtractionTarget, PageKind};
use crate::scrapers::extractors::{
    AmenitiesExtractor, Extractor, MainTextExtractor, PhotosExtractor, ReviewsExtractor,
};
use crate::scrapers::navigator::Readiness;
use crate::scrapers::session::SessionManager;
use crate::scrapers::traits::SessionProvider;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct Pipeline<P: SessionProvider> {
    sessions: SessionManager<P>,
    main_text: MainTextExtractor,
    reviews: ReviewsExtractor,
    amenities: AmenitiesExtractor,
    photos: PhotosExtractor,
    timeout: Duration,
}

impl<P: SessionProvider> Pipeline<P> {
    pub fn new(provider: P, config: &AppConfig) -> Result<Self> {
        let timing = &config.timing;
        let readiness = Readiness {
            timeout: timing.navigation_timeout(),
            settle: timing.settle_delay(),
            poll_initial: Duration::from_millis(timing.poll_initial_ms),
            poll_max: Duration::from_millis(timing.poll_max_ms),
        };

        Ok(Self {
            sessions: SessionManager::new(
                provider,
                config.browser.extra_args.clone(),
                config.browser.max_sessions,
            ),
            main_text: MainTextExtractor::new(readiness),
            reviews: ReviewsExtractor::new(
                readiness.with_timeout(timing.slow_navigation_timeout()),
                config.reviews.scroll,
            ),
            amenities: AmenitiesExtractor::new(readiness),
            photos: PhotosExtractor::new(readiness, config.photos.scroll, &config.photos.url_pattern)?,
            timeout: timing.pipeline_timeout(),
        })
    }

    /// Extract everything `url` supports.
    ///
    /// On timeout the in-flight extractors are dropped, which terminates
    /// their browsers through their leases.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult> {
        let target = ExtractionTarget::parse(url)?;
        let started = Instant::now();
        info!(url = %target.url(), kind = ?target.kind(), "Starting extraction");

        let result = tokio::time::timeout(self.timeout, self.run(&target))
            .await
            .map_err(|_| {
                warn!(url = %target.url(), "Extraction timed out, abandoning sessions");
                ScrapeError::PipelineTimeout(self.timeout)
            })??;

        info!(
            url = %target.url(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            live_sessions = self.live_sessions(),
            "Extraction finished"
        );
        Ok(result)
    }

    async fn run(&self, target: &ExtractionTarget) -> Result<ExtractionResult> {
        match target.kind() {
            PageKind::Generic => Ok(ExtractionResult {
                main_text: self.run_one(&self.main_text, target).await?,
                ..ExtractionResult::default()
            }),
            PageKind::DetailListing => {
                let (main_text, reviews, amenities, photos) = tokio::join!(
                    self.run_one(&self.main_text, target),
                    self.run_one(&self.reviews, target),
                    self.run_one(&self.amenities, target),
                    self.run_one(&self.photos, target),
                );
                Ok(ExtractionResult {
                    main_text: main_text?,
                    reviews: Some(reviews?),
                    amenities: Some(amenities?),
                    photos: Some(photos?),
                })
            }
        }
    }

    /// One extractor on one fresh session, released on every path
    async fn run_one<E: Extractor>(
        &self,
        extractor: &E,
        target: &ExtractionTarget,
    ) -> Result<E::Output> {
        let session = self.sessions.acquire(extractor.name()).await?;
        let outcome = extractor.extract(&*session, target).await;
        if let Err(e) = &outcome {
            warn!(extractor = extractor.name(), error = %e, "Extractor failed");
        }
        session.finish(outcome).await
    }

    pub fn live_sessions(&self) -> usize {
        self.sessions.live_sessions()
    }
}
