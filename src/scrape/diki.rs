use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tracing::{debug, warn};

use super::strategy::{EntryStrategy, TermStrategy, locate_entries, node_terms};
use super::{TermCollector, truncate};
use crate::cache::{CacheKey, CachedValue, MemoStore};
use crate::config::Config;
use crate::transport::{Transport, TransportError};

/// Markup present on a real results page; a body without any of these is
/// treated as a transient placeholder and fetched once more.
const STRUCTURE_MARKERS: &[&str] = &["foreignToNativeMeanings", r#"class="hw""#];

const ENTRIES: &[EntryStrategy] = &[
    EntryStrategy::Select(r#"ol[class*="foreignToNativeMeanings"] li"#),
    EntryStrategy::Select(r#"li[class*="meaning"], li[class*="dictionaryEntry"]"#),
];

const TERMS: &[TermStrategy] = &[
    TermStrategy::Select(r#"a[class*="plainLink"]"#),
    TermStrategy::Select(r#"span[class*="hw"]"#),
    TermStrategy::LeadingClause,
];

/// English → Polish lookups against diki.pl.
///
/// Results are cached untruncated, so the limit passed to `extract_terms`
/// never causes a second fetch.
pub struct Diki<T> {
    transport: T,
    store: Arc<MemoStore>,
    base: String,
    retry_delay: Duration,
}

impl<T: Transport> Diki<T> {
    pub fn new(transport: T, store: Arc<MemoStore>, config: &Config) -> Self {
        Self {
            transport,
            store,
            base: config.diki_base.clone(),
            retry_delay: config.retry_delay,
        }
    }

    pub async fn extract_terms(&self, query: &str, max: usize) -> Vec<String> {
        let key = CacheKey::new("diki_terms", [query]);
        if let Some(CachedValue::Terms(terms)) = self.store.get(&key) {
            debug!(query, "diki cache hit");
            return truncate(terms, max);
        }

        let term = query.trim();
        let terms = if term.is_empty() {
            Vec::new()
        } else {
            match self.fetch_page(term).await {
                Ok(html) => parse_terms(&html),
                Err(e) => {
                    warn!(query = term, error = %e, "diki fetch failed");
                    Vec::new()
                }
            }
        };

        debug!(query = term, found = terms.len(), "diki lookup complete");
        self.store.set(key, CachedValue::Terms(terms.clone()));
        truncate(terms, max)
    }

    async fn fetch_page(&self, term: &str) -> Result<String, TransportError> {
        let url = format!("{}/slownik-angielskiego", self.base);
        let params = [("q", term)];

        let first = self.transport.get(&url, &params).await?;
        if has_structure(&first) {
            return Ok(first);
        }

        debug!(
            query = term,
            delay_ms = self.retry_delay.as_millis() as u64,
            "diki page lacks result markup, retrying once"
        );
        tokio::time::sleep(self.retry_delay).await;
        match self.transport.get(&url, &params).await {
            Ok(retry) => Ok(retry),
            Err(e) => {
                warn!(query = term, error = %e, "diki retry failed, using first response");
                Ok(first)
            }
        }
    }
}

fn has_structure(html: &str) -> bool {
    STRUCTURE_MARKERS.iter().any(|m| html.contains(m))
}

fn parse_terms(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut terms = TermCollector::default();
    for entry in locate_entries(doc.root_element(), ENTRIES) {
        terms.extend(node_terms(entry, TERMS));
    }
    terms.into_terms()
}
