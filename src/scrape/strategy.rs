//! Structural heuristics over a parsed page, each usable on its own.

use scraper::{ElementRef, Selector};
use tracing::warn;

use crate::text::{clean, first_clause, is_stopword, strip_parentheticals};

/// How to find candidate entry nodes.
#[derive(Debug, Clone, Copy)]
pub(super) enum EntryStrategy {
    /// Every element matched by a CSS selector.
    Select(&'static str),
    /// The first `<li>` following each element whose own text contains the label.
    ListAfterLabel(&'static str),
}

/// How to pull terms out of one entry node.
#[derive(Debug, Clone, Copy)]
pub(super) enum TermStrategy {
    /// Text of every descendant matched by a CSS selector.
    Select(&'static str),
    /// Node text without parentheticals, cut at the first clause separator.
    LeadingClause,
}

pub(super) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css)
        .inspect_err(|e| warn!(css, error = ?e, "invalid selector"))
        .ok()
}

/// Nodes from the first strategy that finds any.
pub(super) fn locate_entries<'a>(
    root: ElementRef<'a>,
    strategies: &[EntryStrategy],
) -> Vec<ElementRef<'a>> {
    for strategy in strategies {
        let nodes = match *strategy {
            EntryStrategy::Select(css) => select_all(root, css),
            EntryStrategy::ListAfterLabel(label) => lists_after_label(root, label),
        };
        if !nodes.is_empty() {
            return nodes;
        }
    }
    Vec::new()
}

/// Raw terms from the first strategy that yields a usable one.
pub(super) fn node_terms(node: ElementRef<'_>, strategies: &[TermStrategy]) -> Vec<String> {
    for strategy in strategies {
        let raw: Vec<String> = match *strategy {
            TermStrategy::Select(css) => select_all(node, css)
                .into_iter()
                .map(element_text)
                .collect(),
            TermStrategy::LeadingClause => vec![leading_clause(node)],
        };
        let usable: Vec<String> = raw
            .into_iter()
            .filter(|t| {
                let t = clean(t);
                !t.is_empty() && !is_stopword(&t)
            })
            .collect();
        if !usable.is_empty() {
            return usable;
        }
    }
    Vec::new()
}

pub(super) fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn select_all<'a>(root: ElementRef<'a>, css: &str) -> Vec<ElementRef<'a>> {
    selector(css)
        .map(|sel| root.select(&sel).collect())
        .unwrap_or_default()
}

fn leading_clause(node: ElementRef<'_>) -> String {
    let text = strip_parentheticals(&element_text(node));
    first_clause(&text).to_string()
}

fn lists_after_label<'a>(root: ElementRef<'a>, label: &str) -> Vec<ElementRef<'a>> {
    let Some(li) = selector("li") else {
        return Vec::new();
    };
    let mut found: Vec<ElementRef<'a>> = Vec::new();
    for el in root.descendants().filter_map(ElementRef::wrap) {
        if own_text_contains(el, label)
            && let Some(item) = first_following(el, &li)
            && !found.iter().any(|f| f.id() == item.id())
        {
            found.push(item);
        }
    }
    found
}

fn own_text_contains(el: ElementRef<'_>, label: &str) -> bool {
    if matches!(el.value().name(), "script" | "style") {
        return false;
    }
    el.children()
        .any(|child| child.value().as_text().is_some_and(|t| t.contains(label)))
}

/// First match in document order after `el`, excluding `el`'s own subtree.
fn first_following<'a>(el: ElementRef<'a>, sel: &Selector) -> Option<ElementRef<'a>> {
    let mut node = Some(*el);
    while let Some(current) = node {
        for sibling in current.next_siblings().filter_map(ElementRef::wrap) {
            if sel.matches(&sibling) {
                return Some(sibling);
            }
            if let Some(found) = sibling.select(sel).next() {
                return Some(found);
            }
        }
        node = current.parent();
    }
    None
}
