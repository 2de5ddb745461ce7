//! English Wikipedia title resolution and the en → pl cross-reference.

mod crossref;
mod resolve;
mod types;

pub use crossref::CrossRefLocator;
pub use resolve::TitleResolver;

use serde::Serialize;

use crate::transport::TransportError;

const TARGET_LANG: &str = "pl";
const TARGET_SITE: &str = "plwiki";

/// Why a remote step produced nothing. Never leaves this module: the public
/// operations log it and return their empty value instead.
#[derive(Debug, thiserror::Error)]
enum LookupError {
    #[error("{0}")]
    Transport(#[from] TransportError),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("response missing '{0}'")]
    Missing(&'static str),
}

/// A verified mapping from an English page to its Polish counterpart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrossReference {
    #[serde(rename = "en_title")]
    source_title: String,
    #[serde(rename = "pl_title")]
    target_title: String,
    #[serde(rename = "pl_url")]
    target_url: String,
}

impl CrossReference {
    /// `None` unless both target fields carry text.
    pub fn new(
        source_title: impl Into<String>,
        target_title: impl Into<String>,
        target_url: impl Into<String>,
    ) -> Option<Self> {
        let target_title = target_title.into();
        let target_url = target_url.into();
        if target_title.trim().is_empty() || target_url.trim().is_empty() {
            return None;
        }
        Some(Self {
            source_title: source_title.into(),
            target_title,
            target_url,
        })
    }

    pub fn source_title(&self) -> &str {
        &self.source_title
    }

    pub fn target_title(&self) -> &str {
        &self.target_title
    }

    pub fn target_url(&self) -> &str {
        &self.target_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_reference_requires_target_fields() {
        assert!(CrossReference::new("Cat", "", "https://pl.wikipedia.org/wiki/Kot").is_none());
        assert!(CrossReference::new("Cat", "Kot", "  ").is_none());

        let xref = CrossReference::new("Cat", "Kot", "https://pl.wikipedia.org/wiki/Kot").unwrap();
        assert_eq!(xref.source_title(), "Cat");
        assert_eq!(xref.target_title(), "Kot");
    }

    #[test]
    fn cross_reference_serializes_with_language_keys() {
        let xref = CrossReference::new("Cat", "Kot", "https://pl.wikipedia.org/wiki/Kot").unwrap();
        let json = serde_json::to_value(&xref).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "en_title": "Cat",
                "pl_title": "Kot",
                "pl_url": "https://pl.wikipedia.org/wiki/Kot"
            })
        );
    }
}
