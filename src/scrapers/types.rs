use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Ordered selector candidates for one logical field.
///
/// The first candidate matching at least one element wins, so the most
/// specific selector goes first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorChain {
    candidates: Vec<&'static str>,
}

impl SelectorChain {
    pub fn new(candidates: &[&'static str]) -> Self {
        Self {
            candidates: candidates.to_vec(),
        }
    }

    pub fn candidates(&self) -> &[&'static str] {
        &self.candidates
    }
}

impl fmt::Display for SelectorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.candidates.join(" | "))
    }
}

/// Snapshot of one matched element, taken inside the page
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ElementSnapshot {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ElementSnapshot {
    #[cfg(test)]
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_attribute(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Collapses runs of whitespace to single spaces and trims
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first occurrence of each value, dropping empties
pub fn dedup_non_empty<I>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| !v.is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
