use crate::error::Result;
use crate::scrapers::traits::BrowserSession;
use crate::scrapers::types::collapse_whitespace;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Elements that never carry listing content
pub const NOISE_SELECTORS: &[&str] = &[
    "script",
    "style",
    "noscript",
    "template",
    "iframe",
    "svg",
    "nav",
    "header",
    "footer",
    r#"[role="navigation"]"#,
    r#"[role="banner"]"#,
    r#"[role="contentinfo"]"#,
    r#"[data-testid="main-cookies-banner-container"]"#,
    r#"[data-testid*="header"]"#,
    r#"[data-testid*="footer"]"#,
    r#"[data-testid="modal-container"]"#,
];

/// Strip non-content elements from the live document.
///
/// Idempotent: a second call finds nothing and removes nothing.
pub async fn sanitize<S: BrowserSession>(session: &S) -> Result<u64> {
    let removed = session.remove_all(NOISE_SELECTORS).await?;
    debug!(removed, "Sanitized document");
    Ok(removed)
}

/// Visible body text of `html`, skipping anything under a noise element
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let noise_list = NOISE_SELECTORS.join(", ");
    let (Ok(noise), Ok(body)) = (Selector::parse(&noise_list), Selector::parse("body")) else {
        warn!("Noise selectors failed to parse");
        return String::new();
    };

    let skipped: HashSet<_> = document.select(&noise).map(|el| el.id()).collect();
    let Some(body) = document.select(&body).next() else {
        return String::new();
    };

    let mut parts: Vec<&str> = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if node.ancestors().any(|a| skipped.contains(&a.id())) {
            continue;
        }
        parts.push(&**text);
    }

    collapse_whitespace(&parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::testing::{FakePage, FakeProvider};
    use crate::scrapers::traits::SessionProvider;

    #[test]
    fn visible_text_skips_chrome_and_scripts() {
        let html = r#"
            <html><head><title>t</title><style>.x{}</style></head>
            <body>
              <header><a>Log in</a></header>
              <nav>Homes Experiences</nav>
              <main>
                <h1>Sunny   loft</h1>
                <script>window.__state = {};</script>
                <p>Walk to the
                   river.</p>
              </main>
              <div data-testid="main-cookies-banner-container">Accept cookies</div>
              <footer>Terms</footer>
            </body></html>"#;
        assert_eq!(visible_text(html), "Sunny loft Walk to the river.");
    }

    #[test]
    fn visible_text_of_empty_document_is_empty() {
        assert_eq!(visible_text(""), "");
    }

    #[tokio::test]
    async fn sanitize_is_idempotent() {
        let page = FakePage::new()
            .texts("script", &["a", "b"])
            .texts("nav", &["menu"])
            .texts("main", &["keep"]);
        let provider = FakeProvider::new().page("https://example.com/", page);
        let session = provider.launch(&[]).await.unwrap();
        session.navigate("https://example.com/").await.unwrap();

        assert_eq!(sanitize(&session).await.unwrap(), 3);
        assert_eq!(sanitize(&session).await.unwrap(), 0);
        assert_eq!(session.find_all("main").await.unwrap().len(), 1);
    }

    #[test]
    fn noise_selectors_all_parse() {
        for selector in NOISE_SELECTORS {
            assert!(Selector::parse(selector).is_ok(), "{selector}");
        }
    }
}
