use std::sync::Arc;

use scraper::{ElementRef, Html};
use tracing::{debug, warn};

use super::strategy::{
    EntryStrategy, TermStrategy, element_text, locate_entries, node_terms, selector,
};
use super::{TermCollector, TermPair, is_url, truncate};
use crate::cache::{CacheKey, CachedValue, MemoStore};
use crate::config::Config;
use crate::text::clean;
use crate::transport::{Transport, TransportError};

pub const DEFAULT_MAX_RESULTS: usize = 5;

const SOURCE_LANG: &str = "ENG";
const TARGET_LANG: &str = "POL";

const ENTRIES: &[EntryStrategy] = &[
    EntryStrategy::Select(r#"div[class*="term"], a[class*="term"]"#),
    EntryStrategy::ListAfterLabel("Polish"),
];

const TERMS: &[TermStrategy] = &[
    TermStrategy::Select(r#"a[class*="term"]"#),
    TermStrategy::Select(r#"[class*="headword"]"#),
    TermStrategy::LeadingClause,
];

/// Block-level containers that hold one glossary hit each, most specific first.
const REGIONS: &[EntryStrategy] = &[
    EntryStrategy::Select(r#"div[class*="result"]"#),
    EntryStrategy::Select(r#"div[class*="entry"], li[class*="entry"]"#),
    EntryStrategy::Select(r#"div[class*="card"]"#),
    EntryStrategy::Select("tr"),
];

const SOURCE_SIDE: &str = r#"[class*="source"], [lang="en"]"#;
const TARGET_SIDE: &str = r#"[class*="target"], [lang="pl"]"#;
const SOURCE_LABEL: &str = "english";
const TARGET_LABEL: &str = "polish";
const MAX_SOURCE_TERMS: usize = 3;
const MAX_TARGET_TERMS: usize = 5;

/// Glossary lookups against proz.com. Accepts a bare term or a full search URL.
pub struct Proz<T> {
    transport: T,
    store: Arc<MemoStore>,
    base: String,
}

impl<T: Transport> Proz<T> {
    pub fn new(transport: T, store: Arc<MemoStore>, config: &Config) -> Self {
        Self {
            transport,
            store,
            base: config.proz_base.clone(),
        }
    }

    /// Up to `max` Polish terms; zero means unlimited.
    pub async fn extract_terms(&self, query: &str, max: usize) -> Vec<String> {
        let key = terms_key(query, max);
        if let Some(terms) = self.cached_terms(&key) {
            debug!(query, "proz terms cache hit");
            return terms;
        }

        let terms = match self.fetch(query).await {
            Some(html) => parse_terms(&html, max),
            None => Vec::new(),
        };

        debug!(query, found = terms.len(), "proz term lookup complete");
        self.store.set(key, CachedValue::Terms(terms.clone()));
        terms
    }

    /// Aligned (English, Polish) pairs; at most `max_pairs` when positive.
    pub async fn extract_pairs(&self, query: &str, max_pairs: usize) -> Vec<TermPair> {
        let key = pairs_key(query, max_pairs);
        if let Some(pairs) = self.cached_pairs(&key) {
            debug!(query, "proz pairs cache hit");
            return pairs;
        }

        let pairs = match self.fetch(query).await {
            Some(html) => parse_pairs(&html, &query_term(query.trim()), max_pairs),
            None => Vec::new(),
        };

        debug!(query, found = pairs.len(), "proz pair lookup complete");
        self.store.set(key, CachedValue::Pairs(pairs.clone()));
        pairs
    }

    /// `extract_terms` and `extract_pairs` together, sharing one page fetch
    /// when neither is cached. Both results land in their usual cache entries.
    pub async fn extract_terms_and_pairs(
        &self,
        query: &str,
        max: usize,
        max_pairs: usize,
    ) -> (Vec<String>, Vec<TermPair>) {
        let (terms_key, pairs_key) = (terms_key(query, max), pairs_key(query, max_pairs));
        match (self.cached_terms(&terms_key), self.cached_pairs(&pairs_key)) {
            (Some(terms), Some(pairs)) => (terms, pairs),
            (Some(terms), None) => (terms, self.extract_pairs(query, max_pairs).await),
            (None, Some(pairs)) => (self.extract_terms(query, max).await, pairs),
            (None, None) => {
                let html = self.fetch(query).await;
                let terms = html
                    .as_deref()
                    .map(|html| parse_terms(html, max))
                    .unwrap_or_default();
                let pairs = html
                    .as_deref()
                    .map(|html| parse_pairs(html, &query_term(query.trim()), max_pairs))
                    .unwrap_or_default();

                debug!(query, terms = terms.len(), pairs = pairs.len(), "proz lookup complete");
                self.store.set(terms_key, CachedValue::Terms(terms.clone()));
                self.store.set(pairs_key, CachedValue::Pairs(pairs.clone()));
                (terms, pairs)
            }
        }
    }

    fn cached_terms(&self, key: &CacheKey) -> Option<Vec<String>> {
        match self.store.get(key) {
            Some(CachedValue::Terms(terms)) => Some(terms),
            _ => None,
        }
    }

    fn cached_pairs(&self, key: &CacheKey) -> Option<Vec<TermPair>> {
        match self.store.get(key) {
            Some(CachedValue::Pairs(pairs)) => Some(pairs),
            _ => None,
        }
    }

    /// The page body, or `None` for a blank query or a failed request.
    async fn fetch(&self, query: &str) -> Option<String> {
        let query = query.trim();
        if query.is_empty() {
            return None;
        }
        self.fetch_page(query)
            .await
            .inspect_err(|e| warn!(query, error = %e, "proz fetch failed"))
            .ok()
    }

    async fn fetch_page(&self, query: &str) -> Result<String, TransportError> {
        if is_url(query) {
            self.validate_url(query)?;
            return self.transport.get(query, &[]).await;
        }
        let url = format!("{}/search/", self.base);
        let params = [
            ("term", query),
            ("source_lang", SOURCE_LANG),
            ("target_lang", TARGET_LANG),
        ];
        self.transport.get(&url, &params).await
    }

    /// Caller-supplied URLs must point at the configured ProZ host.
    fn validate_url(&self, raw: &str) -> Result<(), TransportError> {
        let parsed = url::Url::parse(raw)?;
        let base = url::Url::parse(&self.base)?;
        let host = parsed.host_str().unwrap_or_default();

        if matches!(parsed.scheme(), "http" | "https")
            && !host.is_empty()
            && Some(host) == base.host_str()
        {
            return Ok(());
        }
        warn!(url = %raw, "blocked fetch to foreign host");
        Err(TransportError::ForeignHost(host.to_string()))
    }
}

fn terms_key(query: &str, max: usize) -> CacheKey {
    CacheKey::new("proz_terms", [query.to_string(), max.to_string()])
}

fn pairs_key(query: &str, max_pairs: usize) -> CacheKey {
    CacheKey::new("proz_pairs", [query.to_string(), max_pairs.to_string()])
}

/// The English term behind a query: the `term` parameter of a search URL,
/// or the query itself.
fn query_term(query: &str) -> String {
    if !is_url(query) {
        return query.to_string();
    }
    url::Url::parse(query)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "term")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or_default()
}

fn parse_terms(html: &str, max: usize) -> Vec<String> {
    let doc = Html::parse_document(html);
    collect_terms(doc.root_element(), max)
}

fn collect_terms(root: ElementRef<'_>, max: usize) -> Vec<String> {
    let mut terms = TermCollector::with_limit(max);
    for entry in locate_entries(root, ENTRIES) {
        if terms.is_full() {
            break;
        }
        terms.extend(node_terms(entry, TERMS));
    }
    terms.into_terms()
}

fn parse_pairs(html: &str, term: &str, max_pairs: usize) -> Vec<TermPair> {
    let doc = Html::parse_document(html);
    let root = doc.root_element();

    let mut regions = innermost(locate_entries(root, REGIONS));
    if regions.is_empty() {
        regions.push(root);
    }

    let mut pairs: Vec<TermPair> = Vec::new();
    for region in regions {
        for pair in region_pairs(region) {
            if !pairs.contains(&pair) {
                pairs.push(pair);
            }
        }
    }

    if pairs.is_empty() {
        let source = clean(term);
        if !source.is_empty() {
            debug!(term = %source, "no aligned regions, pairing query with page terms");
            pairs = collect_terms(root, 0)
                .into_iter()
                .map(|target| TermPair {
                    source: source.clone(),
                    target,
                })
                .collect();
        }
    }

    truncate(pairs, max_pairs)
}

/// Drops every region that contains another matched region, so a wrapper
/// such as `div.search-results` never stands in for the cards inside it.
fn innermost(regions: Vec<ElementRef<'_>>) -> Vec<ElementRef<'_>> {
    let nested: Vec<bool> = regions
        .iter()
        .map(|outer| {
            regions.iter().any(|inner| {
                inner.id() != outer.id() && inner.ancestors().any(|a| a.id() == outer.id())
            })
        })
        .collect();
    regions
        .into_iter()
        .zip(nested)
        .filter_map(|(region, nested)| (!nested).then_some(region))
        .collect()
}

/// Cartesian product of both sides, or nothing unless the region names both languages.
fn region_pairs(region: ElementRef<'_>) -> Vec<TermPair> {
    let text = element_text(region).to_lowercase();
    if !(text.contains(SOURCE_LABEL) && text.contains(TARGET_LABEL)) {
        return Vec::new();
    }

    let sources = side_terms(region, SOURCE_SIDE, SOURCE_LABEL, MAX_SOURCE_TERMS);
    let targets = side_terms(region, TARGET_SIDE, TARGET_LABEL, MAX_TARGET_TERMS);
    sources
        .iter()
        .flat_map(|source| {
            targets.iter().map(move |target| TermPair {
                source: source.clone(),
                target: target.clone(),
            })
        })
        .collect()
}

fn side_terms(region: ElementRef<'_>, css: &str, label: &str, limit: usize) -> Vec<String> {
    let Some(sel) = selector(css) else {
        return Vec::new();
    };
    let mut terms = TermCollector::with_limit(limit);
    for node in region.select(&sel) {
        if terms.is_full() {
            break;
        }
        terms.extend(node_terms(node, TERMS).iter().map(|t| strip_label(t, label)));
    }
    terms.into_terms()
}

/// Drops a leading language label such as `English:`.
fn strip_label<'a>(term: &'a str, label: &str) -> &'a str {
    let trimmed = term.trim_start();
    match trimmed.get(..label.len()) {
        Some(head) if head.eq_ignore_ascii_case(label) => &trimmed[label.len()..],
        _ => term,
    }
}
