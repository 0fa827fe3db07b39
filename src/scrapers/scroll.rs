use crate::config::ScrollConfig;
use crate::error::Result;
use crate::scrapers::traits::BrowserSession;
use tokio::time::sleep;
use tracing::{debug, warn};

/// How a scroll-until-stable run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub attempts: u32,
    pub final_height: u64,
    /// False when the attempt budget ran out while the page was still growing
    pub stable: bool,
}

/// Scroll to the bottom until the document stops growing or attempts run out.
///
/// Running out of attempts is not an error: whatever loaded is kept.
pub async fn scroll_until_stable<S: BrowserSession>(
    session: &S,
    tuning: ScrollConfig,
) -> Result<ScrollOutcome> {
    let mut previous = session.scroll_height().await?;
    let mut attempts = 0;

    while attempts < tuning.max_attempts {
        session.scroll_to(previous).await?;
        attempts += 1;
        sleep(tuning.delay()).await;

        let current = session.scroll_height().await?;
        debug!(attempts, previous, current, "Scrolled");
        if current <= previous {
            return Ok(ScrollOutcome {
                attempts,
                final_height: current,
                stable: true,
            });
        }
        previous = current;
    }

    warn!(
        attempts,
        height = previous,
        "Page still growing after scroll budget, keeping partial content"
    );
    Ok(ScrollOutcome {
        attempts,
        final_height: previous,
        stable: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::{FakePage, FakeProvider};
    use crate::scrapers::traits::SessionProvider;

    const URL: &str = "https://example.com/rooms/1/reviews";

    async fn run(page: FakePage, max_attempts: u32) -> ScrollOutcome {
        let provider = FakeProvider::new().page(URL, page);
        let session = provider.launch(&[]).await.unwrap();
        session.navigate(URL).await.unwrap();
        let tuning = ScrollConfig {
            max_attempts,
            delay_ms: 0,
        };
        scroll_until_stable(&session, tuning).await.unwrap()
    }

    #[tokio::test]
    async fn never_growing_page_stops_after_one_attempt() {
        let outcome = run(FakePage::new().heights(&[800]), 20).await;
        assert_eq!(
            outcome,
            ScrollOutcome {
                attempts: 1,
                final_height: 800,
                stable: true
            }
        );
    }

    #[tokio::test]
    async fn stops_once_growth_ends() {
        let outcome = run(FakePage::new().heights(&[800, 1600, 2400, 2400]), 20).await;
        assert_eq!(outcome.attempts, 3);
        assert_eq!(outcome.final_height, 2400);
        assert!(outcome.stable);
    }

    #[tokio::test]
    async fn endless_growth_is_capped() {
        let heights: Vec<u64> = (1..=100).map(|i| i * 500).collect();
        let outcome = run(FakePage::new().heights(&heights), 5).await;
        assert_eq!(outcome.attempts, 5);
        assert_eq!(outcome.final_height, 3000);
        assert!(!outcome.stable);
    }

    #[tokio::test]
    async fn shrinking_page_counts_as_stable() {
        let outcome = run(FakePage::new().heights(&[1200, 900]), 10).await;
        assert!(outcome.stable);
        assert_eq!(outcome.attempts, 1);
    }
}
