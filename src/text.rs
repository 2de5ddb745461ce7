//! Text cleanup shared by every extractor.

/// Characters trimmed from both ends of a candidate term.
const EDGE_PUNCTUATION: &[char] = &[',', ';', ':', '-', '–', '—'];

/// Characters that end the leading clause of a free-text entry.
const CLAUSE_SEPARATORS: &[char] = &[';', ',', '-', '–', '—'];

/// Abbreviation markers that show up as standalone "terms" on dictionary pages.
const STOPWORDS: &[&str] = &["np.", "np", "itp.", "itd."];

/// Collapse whitespace runs and trim whitespace plus edge punctuation.
pub fn clean(s: &str) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || EDGE_PUNCTUATION.contains(&c))
        .to_string()
}

/// Remove every `(...)` span. Nesting is not tracked: a span ends at the first `)`.
pub fn strip_parentheticals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        let Some(close) = rest[open..].find(')') else {
            break;
        };
        out.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    out.push_str(rest);
    out.trim().to_string()
}

/// Text before the first clause separator.
pub fn first_clause(s: &str) -> &str {
    match s.find(CLAUSE_SEPARATORS) {
        Some(idx) => &s[..idx],
        None => s,
    }
}

pub fn is_stopword(s: &str) -> bool {
    let lower = s.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}
