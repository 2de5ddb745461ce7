use std::sync::Arc;

use tracing::{debug, warn};

use super::types::{EntitiesResponse, PagesResponse};
use super::{CrossReference, LookupError, TARGET_LANG, TARGET_SITE};
use crate::cache::{CacheKey, CachedValue, MemoStore};
use crate::config::Config;
use crate::transport::Transport;

/// Finds the Polish counterpart of an English page.
///
/// Tries the page's interlanguage links first, then its Wikidata sitelink.
/// A failed step falls through to the next one.
pub struct CrossRefLocator<T> {
    transport: T,
    store: Arc<MemoStore>,
    wikipedia_api: String,
    wikidata_api: String,
}

impl<T: Transport> CrossRefLocator<T> {
    pub fn new(transport: T, store: Arc<MemoStore>, config: &Config) -> Self {
        Self {
            transport,
            store,
            wikipedia_api: config.wikipedia_api.clone(),
            wikidata_api: config.wikidata_api.clone(),
        }
    }

    pub async fn map_title(&self, title: Option<&str>) -> Option<CrossReference> {
        let title = title.unwrap_or_default();
        let key = CacheKey::new("map_title", [title]);
        if let Some(CachedValue::CrossReference(found)) = self.store.get(&key) {
            debug!(title, "map_title cache hit");
            return found;
        }

        let found = if title.trim().is_empty() {
            None
        } else {
            self.locate(title).await
        };

        self.store.set(key, CachedValue::CrossReference(found.clone()));
        found
    }

    async fn locate(&self, title: &str) -> Option<CrossReference> {
        match self.via_langlinks(title).await {
            Ok(Some(found)) => return Some(found),
            Ok(None) => debug!(title, "no direct langlink"),
            Err(e) => warn!(title, error = %e, "langlink lookup failed"),
        }

        match self.via_wikidata(title).await {
            Ok(found) => {
                if found.is_none() {
                    debug!(title, "no wikidata sitelink");
                }
                found
            }
            Err(e) => {
                warn!(title, error = %e, "wikidata lookup failed");
                None
            }
        }
    }

    async fn via_langlinks(&self, title: &str) -> Result<Option<CrossReference>, LookupError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "langlinks"),
            ("titles", title),
            ("lllang", TARGET_LANG),
            ("llprop", "url"),
        ];
        let body = self.transport.get(&self.wikipedia_api, &params).await?;
        let response: PagesResponse = serde_json::from_str(&body)?;
        let page = response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .ok_or(LookupError::Missing("query.pages"))?;

        Ok(page
            .langlinks
            .into_iter()
            .next()
            .and_then(|link| CrossReference::new(title, link.title, link.url.unwrap_or_default())))
    }

    async fn via_wikidata(&self, title: &str) -> Result<Option<CrossReference>, LookupError> {
        let qid = self.wikibase_item(title).await?;

        let params = [
            ("action", "wbgetentities"),
            ("format", "json"),
            ("ids", qid.as_str()),
            ("props", "sitelinks/urls"),
            ("sitefilter", TARGET_SITE),
        ];
        let body = self.transport.get(&self.wikidata_api, &params).await?;
        let mut response: EntitiesResponse = serde_json::from_str(&body)?;
        let mut entity = response
            .entities
            .remove(&qid)
            .ok_or(LookupError::Missing("entities"))?;

        Ok(entity
            .sitelinks
            .remove(TARGET_SITE)
            .and_then(|link| CrossReference::new(title, link.title, link.url.unwrap_or_default())))
    }

    async fn wikibase_item(&self, title: &str) -> Result<String, LookupError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("formatversion", "2"),
            ("prop", "pageprops"),
            ("titles", title),
        ];
        let body = self.transport.get(&self.wikipedia_api, &params).await?;
        let response: PagesResponse = serde_json::from_str(&body)?;
        response
            .query
            .and_then(|q| q.pages.into_iter().next())
            .and_then(|page| page.pageprops)
            .and_then(|props| props.wikibase_item)
            .filter(|qid| !qid.is_empty())
            .ok_or(LookupError::Missing("pageprops.wikibase_item"))
    }
}
