use feedsearch_core::day::format_day;
use feedsearch_core::{DocId, InvertedIndex, Query};
use std::collections::BTreeSet;
use std::fmt::Write;

fn list(terms: &BTreeSet<String>) -> String {
    format!("[{}]", terms.iter().map(String::as_str).collect::<Vec<_>>().join(", "))
}

/// One-line summary of the present query components, e.g. `Search (in title: [kim, korea]):`.
pub fn describe_query(q: &Query) -> String {
    let mut parts = Vec::new();
    if !q.title_must_include.is_empty() {
        parts.push(format!("in title: {}", list(&q.title_must_include)));
    }
    if !q.title_must_exclude.is_empty() {
        parts.push(format!("not in title: {}", list(&q.title_must_exclude)));
    }
    if !q.description_must_include.is_empty() {
        parts.push(format!("in description: {}", list(&q.description_must_include)));
    }
    if !q.description_must_exclude.is_empty() {
        parts.push(format!("not in description: {}", list(&q.description_must_exclude)));
    }
    if let Some(start) = q.start {
        parts.push(format!("startDate: {}", format_day(start)));
    }
    if let Some(end) = q.end {
        parts.push(format!("endDate: {}", format_day(end)));
    }
    format!("Search ({}):", parts.join("; "))
}

/// Numbered titles sorted alphabetically, or ` no results`.
pub fn format_results(index: &InvertedIndex, ids: &[DocId]) -> String {
    let hits = index.resolve_sorted_by_title(ids);
    if hits.is_empty() {
        return " no results\n".to_string();
    }
    let mut out = String::new();
    for (i, (_, doc)) in hits.iter().enumerate() {
        let _ = writeln!(out, " {}. {}", i + 1, doc.title);
    }
    out
}
