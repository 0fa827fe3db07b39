//! Request validation and response shaping for whatever transport fronts the
//! pipeline. Only the bearer check and the single `url` parameter live here.

use crate::config::AppConfig;
use crate::error::ScrapeError;
use serde::Serialize;

/// A request that passed authorization and carries a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    pub url: String,
}

/// Why a request was turned away before or during extraction
#[derive(Debug, thiserror::Error)]
pub enum Rejection {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("URL parameter is required")]
    MissingUrl,

    #[error("Scraping failed: {0}")]
    Failed(#[from] ScrapeError),
}

/// JSON error body returned to callers
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl Rejection {
    pub fn status(&self) -> u16 {
        match self {
            Self::Unauthorized => 401,
            Self::MissingUrl => 400,
            Self::Failed(ScrapeError::InvalidUrl { .. }) => 400,
            Self::Failed(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        match self {
            Self::Unauthorized | Self::MissingUrl => ErrorBody {
                error: self.to_string(),
                details: None,
            },
            Self::Failed(e) => ErrorBody {
                error: "Scraping failed".to_string(),
                details: Some(e.to_string()),
            },
        }
    }
}

/// True when `header` is exactly `Bearer <api_key>`
pub fn authorize(header: Option<&str>, config: &AppConfig) -> bool {
    let Some(token) = header.and_then(|h| h.strip_prefix("Bearer ")) else {
        return false;
    };
    !config.api_key.is_empty() && token == config.api_key
}

impl ScrapeRequest {
    /// Authorization first, then the URL parameter
    pub fn from_parts(
        authorization: Option<&str>,
        url: Option<&str>,
        config: &AppConfig,
    ) -> Result<Self, Rejection> {
        if !authorize(authorization, config) {
            return Err(Rejection::Unauthorized);
        }
        match url.map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Self {
                url: url.to_string(),
            }),
            _ => Err(Rejection::MissingUrl),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> AppConfig {
        AppConfig::with_api_key("s3cret")
    }

    #[test]
    fn bearer_token_must_match_exactly() {
        let config = config();
        assert!(authorize(Some("Bearer s3cret"), &config));
        assert!(!authorize(Some("Bearer s3cret "), &config));
        assert!(!authorize(Some("bearer s3cret"), &config));
        assert!(!authorize(Some("s3cret"), &config));
        assert!(!authorize(None, &config));
    }

    #[test]
    fn empty_key_never_authorizes() {
        let config = AppConfig::with_api_key("");
        assert!(!authorize(Some("Bearer "), &config));
    }

    #[test]
    fn unauthorized_is_checked_before_url() {
        let err = ScrapeRequest::from_parts(Some("Bearer nope"), None, &config()).unwrap_err();
        assert_eq!(err.status(), 401);
        assert_eq!(
            serde_json::to_value(err.body()).unwrap(),
            serde_json::json!({ "error": "Unauthorized" })
        );
    }

    #[test]
    fn missing_or_blank_url_is_bad_request() {
        for url in [None, Some(""), Some("   ")] {
            let err = ScrapeRequest::from_parts(Some("Bearer s3cret"), url, &config()).unwrap_err();
            assert_eq!(err.status(), 400);
            assert_eq!(err.body().error, "URL parameter is required");
        }
    }

    #[test]
    fn accepted_request_keeps_trimmed_url() {
        let request =
            ScrapeRequest::from_parts(Some("Bearer s3cret"), Some(" https://example.com/rooms/1 "), &config())
                .unwrap();
        assert_eq!(request.url, "https://example.com/rooms/1");
    }

    #[test]
    fn pipeline_failures_carry_details() {
        let err = Rejection::from(ScrapeError::PipelineTimeout(Duration::from_secs(5)));
        assert_eq!(err.status(), 500);
        let body = err.body();
        assert_eq!(body.error, "Scraping failed");
        assert_eq!(body.details.as_deref(), Some("Extraction did not finish within 5s"));
    }
}
