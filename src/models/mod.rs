use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Which extractors a target gets
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PageKind {
    Generic,
    DetailListing,
}

/// A page to extract from, classified once at pipeline entry
#[derive(Debug, Clone)]
pub struct ExtractionTarget {
    url: Url,
    kind: PageKind,
    listing_id: Option<String>,
}

impl ExtractionTarget {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim()).map_err(|e| ScrapeError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ScrapeError::InvalidUrl {
                url: raw.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let listing_id = detail_listing_id(&url);
        let kind = if listing_id.is_some() {
            PageKind::DetailListing
        } else {
            PageKind::Generic
        };

        Ok(Self {
            url,
            kind,
            listing_id,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> PageKind {
        self.kind
    }

    /// Numeric id from `/rooms/<id>`, present only for detail listings
    pub fn listing_id(&self) -> Option<&str> {
        self.listing_id.as_deref()
    }

    /// `{url}/{segment}`, keeping the query string
    pub fn subpage(&self, segment: &str) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    /// Base URL with one extra query parameter
    pub fn with_query(&self, key: &str, value: &str) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair(key, value);
        url
    }
}

/// Finds `rooms/<digits>` anywhere in the path
fn detail_listing_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments.windows(2).find_map(|pair| {
        let is_id = !pair[1].is_empty() && pair[1].chars().all(|c| c.is_ascii_digit());
        (pair[0] == "rooms" && is_id).then(|| pair[1].to_string())
    })
}

/// Assembled extraction output.
///
/// The detail fields are `None` for generic pages and serialize as absent,
/// never as empty arrays.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub main_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amenities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photos: Option<Vec<String>>,
}
