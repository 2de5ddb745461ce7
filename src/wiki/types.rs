use std::collections::HashMap;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
pub struct SearchHit {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct PagesResponse {
    pub query: Option<PagesQuery>,
}

#[derive(Debug, Deserialize)]
pub struct PagesQuery {
    #[serde(default)]
    pub pages: Vec<Page>,
}

#[derive(Debug, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub langlinks: Vec<LangLink>,
    pub pageprops: Option<PageProps>,
}

#[derive(Debug, Deserialize)]
pub struct LangLink {
    pub title: String,
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PageProps {
    pub wikibase_item: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EntitiesResponse {
    #[serde(default)]
    pub entities: HashMap<String, Entity>,
}

#[derive(Debug, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub sitelinks: HashMap<String, SiteLink>,
}

#[derive(Debug, Deserialize)]
pub struct SiteLink {
    pub title: String,
    pub url: Option<String>,
}
