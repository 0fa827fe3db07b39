//! Scripted in-memory sessions for exercising extractors without Chrome.

use crate::error::{Result, ScrapeError};
use crate::scrapers::traits::{BrowserSession, SessionProvider};
use crate::scrapers::types::ElementSnapshot;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What a URL looks like once loaded
#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<ElementSnapshot>>,
    /// Selector -> number of empty polls before it starts matching
    late: HashMap<String, usize>,
    /// Document height after 0, 1, 2, ... scrolls; the last value repeats
    heights: Vec<u64>,
    html: String,
    clickable: Vec<String>,
    navigate_delay: Duration,
    broken: bool,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.elements.insert(selector.to_string(), elements);
        self
    }

    pub fn texts(self, selector: &str, texts: &[&str]) -> Self {
        let elements = texts.iter().map(|t| ElementSnapshot::with_text(*t)).collect();
        self.with(selector, elements)
    }

    pub fn appears_after(mut self, selector: &str, polls: usize) -> Self {
        self.late.insert(selector.to_string(), polls);
        self
    }

    pub fn heights(mut self, heights: &[u64]) -> Self {
        self.heights = heights.to_vec();
        self
    }

    pub fn html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    pub fn clickable(mut self, selector: &str) -> Self {
        self.clickable.push(selector.to_string());
        self
    }

    pub fn slow(mut self, delay: Duration) -> Self {
        self.navigate_delay = delay;
        self
    }

    /// Every in-page script fails, as a crashed renderer would
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }
}

/// Counters shared between a provider and the sessions it launched
#[derive(Debug, Default)]
pub struct FakeStats {
    launched: AtomicUsize,
    quit_cleanly: AtomicUsize,
    dropped: AtomicUsize,
    last_args: Mutex<Vec<String>>,
    visited: Mutex<Vec<String>>,
    clicked: Mutex<Vec<String>>,
    removed: Mutex<Vec<String>>,
}

impl FakeStats {
    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::SeqCst)
    }

    pub fn quit_cleanly(&self) -> usize {
        self.quit_cleanly.load(Ordering::SeqCst)
    }

    /// Sessions whose browser is gone, by quit or by drop
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    pub fn last_args(&self) -> Vec<String> {
        self.last_args.lock().unwrap().clone()
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().unwrap().clone()
    }

    pub fn clicked(&self) -> Vec<String> {
        self.clicked.lock().unwrap().clone()
    }

    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().unwrap().clone()
    }
}

#[derive(Debug, Default)]
pub struct FakeProvider {
    pages: Arc<HashMap<String, FakePage>>,
    fail_launch: bool,
    fail_quit: bool,
    quit_delay: Duration,
    stats: Arc<FakeStats>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.pages).insert(url.to_string(), page);
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    /// Quitting tears the session down but reports an error
    pub fn failing_quit(mut self) -> Self {
        self.fail_quit = true;
        self
    }

    /// Every launched session takes this long to quit
    pub fn slow_quit(mut self, delay: Duration) -> Self {
        self.quit_delay = delay;
        self
    }

    pub fn stats(&self) -> Arc<FakeStats> {
        Arc::clone(&self.stats)
    }
}

#[async_trait]
impl SessionProvider for FakeProvider {
    type Session = FakeSession;

    async fn launch(&self, extra_args: &[String]) -> Result<FakeSession> {
        if self.fail_launch {
            return Err(ScrapeError::SessionLaunch("chrome not found".to_string()));
        }
        self.stats.launched.fetch_add(1, Ordering::SeqCst);
        *self.stats.last_args.lock().unwrap() = extra_args.to_vec();
        Ok(FakeSession {
            pages: Arc::clone(&self.pages),
            stats: Arc::clone(&self.stats),
            state: Mutex::new(SessionState::default()),
            quit_delay: self.quit_delay,
            fail_quit: self.fail_quit,
        })
    }
}

#[derive(Debug, Default)]
struct SessionState {
    current: FakePage,
    polls: HashMap<String, usize>,
    scrolls: usize,
}

pub struct FakeSession {
    pages: Arc<HashMap<String, FakePage>>,
    stats: Arc<FakeStats>,
    state: Mutex<SessionState>,
    quit_delay: Duration,
    fail_quit: bool,
}

impl FakeSession {
    fn check(&self) -> Result<()> {
        if self.state.lock().unwrap().current.broken {
            return Err(ScrapeError::Browser("renderer crashed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.stats.visited.lock().unwrap().push(url.to_string());
        let page = self.pages.get(url).cloned().unwrap_or_default();
        let delay = page.navigate_delay;
        *self.state.lock().unwrap() = SessionState {
            current: page,
            ..SessionState::default()
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    async fn execute(&self, _script: &str) -> Result<Value> {
        self.check()?;
        Ok(Value::Null)
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let polls = state.polls.entry(selector.to_string()).or_insert(0);
        *polls += 1;
        let seen = *polls;
        if state.current.late.get(selector).is_some_and(|late| seen <= *late) {
            return Ok(Vec::new());
        }
        Ok(state.current.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn scroll_to(&self, _y: u64) -> Result<()> {
        self.check()?;
        self.state.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        self.check()?;
        let state = self.state.lock().unwrap();
        let heights = &state.current.heights;
        Ok(match heights.len() {
            0 => 1_000,
            n => heights[state.scrolls.min(n - 1)],
        })
    }

    async fn remove_all(&self, selectors: &[&str]) -> Result<u64> {
        self.check()?;
        let mut state = self.state.lock().unwrap();
        let mut removed = 0;
        for selector in selectors {
            if let Some(gone) = state.current.elements.remove(*selector) {
                removed += gone.len() as u64;
            }
        }
        self.stats
            .removed
            .lock()
            .unwrap()
            .extend(selectors.iter().map(|s| s.to_string()));
        Ok(removed)
    }

    async fn click(&self, selector: &str) -> Result<bool> {
        self.check()?;
        let hit = self
            .state
            .lock()
            .unwrap()
            .current
            .clickable
            .iter()
            .any(|s| s == selector);
        if hit {
            self.stats.clicked.lock().unwrap().push(selector.to_string());
        }
        Ok(hit)
    }

    async fn content(&self) -> Result<String> {
        self.check()?;
        Ok(self.state.lock().unwrap().current.html.clone())
    }

    async fn quit(self) -> Result<()> {
        if !self.quit_delay.is_zero() {
            tokio::time::sleep(self.quit_delay).await;
        }
        if self.fail_quit {
            return Err(ScrapeError::Browser("closing tab failed: target closed".to_string()));
        }
        self.stats.quit_cleanly.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.stats.dropped.fetch_add(1, Ordering::SeqCst);
    }
}
