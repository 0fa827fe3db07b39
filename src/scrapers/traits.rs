use crate::error::{Result, ScrapeError};
use crate::scrapers::types::ElementSnapshot;
use async_trait::async_trait;
use serde_json::Value;

const SCROLL_HEIGHT_JS: &str =
    "Math.max(document.body ? document.body.scrollHeight : 0, document.documentElement.scrollHeight)";

const OUTER_HTML_JS: &str = "document.documentElement.outerHTML";

/// One live browser plus one tab.
///
/// Implementations must terminate the underlying browser when dropped, so a
/// session abandoned mid-await (timeout, cancellation) never outlives its owner.
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url` and wait for the navigation to commit
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate `script` in the page, awaiting a returned promise
    async fn execute(&self, script: &str) -> Result<Value>;

    /// Snapshot every element matching `selector`; no match is an empty list
    async fn find_all(&self, selector: &str) -> Result<Vec<ElementSnapshot>> {
        let script = find_all_script(selector)?;
        let value = self.execute(&script).await?;
        let raw = value.as_str().unwrap_or("[]");
        serde_json::from_str(raw).map_err(ScrapeError::browser)
    }

    async fn scroll_to(&self, y: u64) -> Result<()> {
        self.execute(&format!("window.scrollTo(0, {y})")).await?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64> {
        let value = self.execute(SCROLL_HEIGHT_JS).await?;
        value
            .as_f64()
            .map(|h| h.max(0.0) as u64)
            .ok_or_else(|| ScrapeError::Browser(format!("scroll height was not a number: {value}")))
    }

    /// Remove every element matching any of `selectors`, returning how many went
    async fn remove_all(&self, selectors: &[&str]) -> Result<u64> {
        let joined = serde_json::to_string(&selectors.join(", ")).map_err(ScrapeError::browser)?;
        let script = format!(
            "(() => {{ const found = document.querySelectorAll({joined}); found.forEach(e => e.remove()); return found.length; }})()"
        );
        Ok(self.execute(&script).await?.as_u64().unwrap_or(0))
    }

    /// Click the first element matching `selector`; false when nothing matched
    async fn click(&self, selector: &str) -> Result<bool> {
        let quoted = serde_json::to_string(selector).map_err(ScrapeError::browser)?;
        let script = format!(
            "(() => {{ const el = document.querySelector({quoted}); if (!el) return false; el.click(); return true; }})()"
        );
        Ok(self.execute(&script).await?.as_bool().unwrap_or(false))
    }

    /// Serialized document, as currently mutated
    async fn content(&self) -> Result<String> {
        let value = self.execute(OUTER_HTML_JS).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Close the tab and shut the browser down
    async fn quit(self) -> Result<()>
    where
        Self: Sized;
}

/// Launches fresh browser sessions
#[async_trait]
pub trait SessionProvider: Send + Sync + 'static {
    type Session: BrowserSession + 'static;

    /// Start a browser with the fixed headless profile plus `extra_args`
    async fn launch(&self, extra_args: &[String]) -> Result<Self::Session>;
}

fn find_all_script(selector: &str) -> Result<String> {
    let quoted = serde_json::to_string(selector).map_err(ScrapeError::browser)?;
    Ok(format!(
        r#"JSON.stringify(Array.from(document.querySelectorAll({quoted})).map(e => ({{
            text: e.innerText || e.textContent || "",
            attributes: Object.fromEntries(Array.from(e.attributes).map(a => [a.name, a.value]))
        }})))"#
    ))
}
