//! Scrapers for the two dictionary sites.
//!
//! Both follow the same posture: fetch, locate entry nodes through an ordered
//! list of strategies, pull one or more terms out of each node, normalize and
//! dedup. Every failure degrades to an empty, cached result.

pub mod diki;
pub mod proz;
mod strategy;

pub use diki::Diki;
pub use proz::Proz;

use serde::Serialize;

use crate::text::{clean, is_stopword};

/// An aligned (English, Polish) candidate translation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TermPair {
    pub source: String,
    pub target: String,
}

/// Accumulates cleaned, distinct terms in discovery order.
#[derive(Debug, Default)]
struct TermCollector {
    terms: Vec<String>,
    limit: usize,
}

impl TermCollector {
    /// `limit == 0` means unlimited.
    fn with_limit(limit: usize) -> Self {
        Self {
            terms: Vec::new(),
            limit,
        }
    }

    fn is_full(&self) -> bool {
        self.limit > 0 && self.terms.len() >= self.limit
    }

    /// Returns false once the collector is full.
    fn push(&mut self, raw: &str) -> bool {
        if self.is_full() {
            return false;
        }
        let term = clean(raw);
        if !term.is_empty() && !is_stopword(&term) && !self.terms.contains(&term) {
            self.terms.push(term);
        }
        !self.is_full()
    }

    fn extend<I, S>(&mut self, raw: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in raw {
            if !self.push(term.as_ref()) {
                break;
            }
        }
    }

    fn into_terms(self) -> Vec<String> {
        self.terms
    }
}

/// Cut `items` to `max` entries; zero keeps everything.
fn truncate<T>(mut items: Vec<T>, max: usize) -> Vec<T> {
    if max > 0 {
        items.truncate(max);
    }
    items
}

fn is_url(query: &str) -> bool {
    query.starts_with("http://") || query.starts_with("https://")
}
