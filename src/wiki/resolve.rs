use std::sync::Arc;

use tracing::{debug, warn};

use super::LookupError;
use super::types::SearchResponse;
use crate::cache::{CacheKey, CachedValue, MemoStore};
use crate::config::Config;
use crate::transport::Transport;

/// Turns a free-form query or an enwiki URL into a page title.
pub struct TitleResolver<T> {
    transport: T,
    store: Arc<MemoStore>,
    api: String,
}

impl<T: Transport> TitleResolver<T> {
    pub fn new(transport: T, store: Arc<MemoStore>, config: &Config) -> Self {
        Self {
            transport,
            store,
            api: config.wikipedia_api.clone(),
        }
    }

    /// `None` when the query is blank, the search has no hits, or the API
    /// cannot be reached. Every outcome is cached under the raw query.
    pub async fn resolve(&self, query: &str) -> Option<String> {
        let key = CacheKey::new("resolve_title", [query]);
        if let Some(CachedValue::Title(title)) = self.store.get(&key) {
            debug!(query, "resolve_title cache hit");
            return title;
        }

        let trimmed = query.trim();
        let title = if let Some(title) = title_from_url(trimmed) {
            Some(title)
        } else if trimmed.is_empty() {
            None
        } else {
            self.search(trimmed).await.unwrap_or_else(|e| {
                warn!(query = trimmed, error = %e, "title search failed");
                None
            })
        };

        self.store.set(key, CachedValue::Title(title.clone()));
        title
    }

    async fn search(&self, query: &str) -> Result<Option<String>, LookupError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("list", "search"),
            ("srsearch", query),
            ("srlimit", "1"),
        ];
        let body = self.transport.get(&self.api, &params).await?;
        let response: SearchResponse = serde_json::from_str(&body)?;
        let hits = response.query.ok_or(LookupError::Missing("query"))?.search;

        let title = hits
            .into_iter()
            .next()
            .map(|hit| hit.title)
            .filter(|t| !t.trim().is_empty());
        debug!(query, title = ?title, "title search complete");
        Ok(title)
    }
}

/// Decodes `http(s)://(en.)wikipedia.org/wiki/<title>`; anything else is `None`.
fn title_from_url(s: &str) -> Option<String> {
    let rest = s
        .strip_prefix("https://")
        .or_else(|| s.strip_prefix("http://"))?;
    let rest = rest.strip_prefix("en.").unwrap_or(rest);
    let raw = rest.strip_prefix("wikipedia.org/wiki/")?;
    let raw = raw.split(['#', '?']).next().unwrap_or_default();
    if raw.is_empty() {
        return None;
    }
    Some(raw.replace('_', " ").replace("%28", "(").replace("%29", ")"))
}
