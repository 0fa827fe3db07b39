//! Session acquisition and guaranteed release.
//!
//! Every extractor call gets its own [`Lease`]. Releasing is explicit on the
//! normal path; a lease dropped any other way (error unwinding, cancelled
//! future, pipeline timeout) still drops the session, which terminates its
//! browser, and the live-session count stays accurate.

use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::{BrowserSession, SessionProvider};
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

pub struct SessionManager<P: SessionProvider> {
    provider: P,
    extra_args: Vec<String>,
    slots: Arc<Semaphore>,
    live: Arc<AtomicUsize>,
}

impl<P: SessionProvider> SessionManager<P> {
    pub fn new(provider: P, extra_args: Vec<String>, max_sessions: usize) -> Self {
        Self {
            provider,
            extra_args,
            slots: Arc::new(Semaphore::new(max_sessions.max(1))),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Launch a fresh session, waiting for a free slot first
    pub async fn acquire(&self, purpose: &'static str) -> Result<Lease<P::Session>> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|_| ScrapeError::SessionLaunch("session pool closed".to_string()))?;

        // On launch failure the permit drops here and no session exists to release.
        let session = self.provider.launch(&self.extra_args).await?;

        let live = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(purpose, live, "Session acquired");

        Ok(Lease {
            session: Some(session),
            purpose,
            _slot: LiveSlot {
                live: Arc::clone(&self.live),
                purpose,
            },
            _permit: permit,
        })
    }

    /// Sessions currently launched and not yet released
    pub fn live_sessions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }
}

/// One unit of the live-session count, given back when the lease goes away
/// however it goes away, including mid-quit cancellation.
struct LiveSlot {
    live: Arc<AtomicUsize>,
    purpose: &'static str,
}

impl Drop for LiveSlot {
    fn drop(&mut self) {
        let live = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        debug!(purpose = self.purpose, live, "Session released");
    }
}

/// Exclusive handle on one browser session
pub struct Lease<S: BrowserSession> {
    session: Option<S>,
    purpose: &'static str,
    _slot: LiveSlot,
    _permit: OwnedSemaphorePermit,
}

impl<S: BrowserSession> Lease<S> {
    /// Quit the browser. The count drops even if quitting fails or is cancelled.
    pub async fn release(mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.quit().await,
            None => Ok(()),
        }
    }

    /// Release the session, then hand back `outcome` untouched.
    ///
    /// A failed quit is logged but never masks the extractor's own result.
    pub async fn finish<T>(self, outcome: Result<T>) -> Result<T> {
        let purpose = self.purpose;
        if let Err(e) = self.release().await {
            warn!(purpose, error = %e, "Failed to close browser cleanly");
        }
        outcome
    }
}

impl<S: BrowserSession> Deref for Lease<S> {
    type Target = S;

    fn deref(&self) -> &S {
        // Only `release` and `drop` take the session, and both consume the lease.
        match &self.session {
            Some(session) => session,
            None => unreachable!("lease used after release"),
        }
    }
}

impl<S: BrowserSession> Drop for Lease<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!(purpose = self.purpose, "Session dropped without release, terminating browser");
            drop(session);
        }
    }
}
