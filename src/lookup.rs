//! Runs every source for one query and merges the results.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::cache::MemoStore;
use crate::config::Config;
use crate::scrape::{Diki, Proz, TermPair};
use crate::transport::Transport;
use crate::wiki::{CrossRefLocator, CrossReference, TitleResolver};

#[derive(Debug, Clone, Copy)]
pub struct Limits {
    pub diki: usize,
    pub proz: usize,
    /// Zero skips pair extraction entirely.
    pub pairs: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            diki: 5,
            proz: crate::scrape::proz::DEFAULT_MAX_RESULTS,
            pairs: 0,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LookupReport {
    pub query: String,
    pub resolved_en_title: Option<String>,
    pub wikipedia: Option<CrossReference>,
    pub diki: Vec<String>,
    pub proz: Vec<String>,
    pub pairs: Vec<TermPair>,
}

pub struct Lookup<T> {
    resolver: TitleResolver<T>,
    crossref: CrossRefLocator<T>,
    diki: Diki<T>,
    proz: Proz<T>,
}

impl<T: Transport + Clone> Lookup<T> {
    /// All sources share `transport` and `store`.
    pub fn new(transport: T, store: Arc<MemoStore>, config: &Config) -> Self {
        Self {
            resolver: TitleResolver::new(transport.clone(), store.clone(), config),
            crossref: CrossRefLocator::new(transport.clone(), store.clone(), config),
            diki: Diki::new(transport.clone(), store.clone(), config),
            proz: Proz::new(transport, store, config),
        }
    }

    /// Resolves the title first, then queries every source concurrently and
    /// waits for all of them. Scrapers fall back to the raw query when no
    /// title is found.
    pub async fn run(&self, query: &str, limits: Limits) -> LookupReport {
        let title = self.resolver.resolve(query).await;
        let term = title.as_deref().unwrap_or(query);

        let (wikipedia, diki, (proz, pairs)) = tokio::join!(
            self.crossref.map_title(title.as_deref()),
            self.diki.extract_terms(term, limits.diki),
            async {
                if limits.pairs > 0 {
                    self.proz
                        .extract_terms_and_pairs(term, limits.proz, limits.pairs)
                        .await
                } else {
                    (self.proz.extract_terms(term, limits.proz).await, Vec::new())
                }
            },
        );

        info!(
            query,
            title = ?title,
            wikipedia = wikipedia.is_some(),
            diki = diki.len(),
            proz = proz.len(),
            pairs = pairs.len(),
            "lookup complete"
        );

        LookupReport {
            query: query.to_string(),
            resolved_en_title: title,
            wikipedia,
            diki,
            proz,
            pairs,
        }
    }
}

pub fn format_report(report: &LookupReport) -> String {
    let mut output = format!("# {}\n\n", sanitize_heading(&report.query));

    match &report.resolved_en_title {
        Some(title) => output.push_str(&format!("English title: {title}\n\n")),
        None => output.push_str("English title: (not found)\n\n"),
    }

    output.push_str("## Wikipedia\n\n");
    match &report.wikipedia {
        Some(xref) => output.push_str(&format!(
            "- [{}]({})\n\n",
            escape_md_link(xref.target_title()),
            escape_md_link(xref.target_url())
        )),
        None => output.push_str("(no Polish article)\n\n"),
    }

    push_list(&mut output, "Diki", &report.diki);
    push_list(&mut output, "ProZ", &report.proz);

    if !report.pairs.is_empty() {
        output.push_str("## ProZ pairs\n\n");
        for pair in &report.pairs {
            output.push_str(&format!("- {} → {}\n", pair.source, pair.target));
        }
        output.push('\n');
    }

    output
}

fn push_list(output: &mut String, heading: &str, terms: &[String]) {
    output.push_str(&format!("## {heading}\n\n"));
    if terms.is_empty() {
        output.push_str("(no results)\n\n");
        return;
    }
    for term in terms {
        output.push_str(&format!("- {term}\n"));
    }
    output.push('\n');
}

fn escape_md_link(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '[' | ']' | '(' | ')') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn sanitize_heading(s: &str) -> String {
    s.replace(['\n', '\r'], " ")
}
