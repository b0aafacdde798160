//! Boolean evaluation of a [`Query`] against an [`InvertedIndex`].
//!
//! The running match set is a sorted `Vec<DocId>`; required terms intersect it
//! and forbidden terms subtract from it with linear merges over postings.

use crate::tokenizer::tokenize;
use crate::{DocId, Field, InvertedIndex, Query, TermMatching};
use std::borrow::Cow;
use std::cmp::Ordering;
use time::{OffsetDateTime, Time};

/// Ids of every document matching `query`, ascending, using the index's term matching policy.
pub fn evaluate(index: &InvertedIndex, query: &Query) -> Vec<DocId> {
    evaluate_with(index, query, index.config().term_matching)
}

pub fn evaluate_with(index: &InvertedIndex, query: &Query, matching: TermMatching) -> Vec<DocId> {
    let mut required: Vec<&[DocId]> = Vec::new();
    let mut unsatisfiable = false;
    for (field, terms) in [(Field::Title, &query.title_must_include), (Field::Description, &query.description_must_include)] {
        for term in terms {
            let keys = lookup_keys(term, matching);
            if keys.is_empty() {
                unsatisfiable = true;
            }
            required.extend(keys.iter().map(|k| index.postings(field, k)));
        }
    }
    if unsatisfiable {
        tracing::debug!("include term without searchable tokens");
        return Vec::new();
    }
    required.sort_by_key(|p| p.len());

    let mut matches: Vec<DocId> = (0..index.num_docs()).collect();
    for postings in required {
        if matches.is_empty() {
            break;
        }
        matches = intersect(&matches, postings);
    }

    for (field, terms) in [(Field::Title, &query.title_must_exclude), (Field::Description, &query.description_must_exclude)] {
        for term in terms {
            for key in lookup_keys(term, matching) {
                if matches.is_empty() {
                    break;
                }
                matches = subtract(&matches, index.postings(field, &key));
            }
        }
    }

    let upper = query.end.and_then(day_after);
    if query.start.is_some() || upper.is_some() {
        matches.retain(|&id| {
            let Some(doc) = index.document(id) else { return false };
            query.start.map_or(true, |start| doc.published >= start)
                && upper.map_or(true, |bound| doc.published < bound)
        });
    }

    tracing::debug!(hits = matches.len(), "query evaluated");
    matches
}

fn lookup_keys(term: &str, matching: TermMatching) -> Vec<Cow<'_, str>> {
    match matching {
        TermMatching::Literal => vec![Cow::Borrowed(term)],
        TermMatching::Normalized => tokenize(term).into_iter().map(Cow::Owned).collect(),
    }
}

/// Midnight starting the day after `end`'s calendar day, in `end`'s offset.
/// `None` when that day is out of range, in which case no upper bound applies.
pub fn day_after(end: OffsetDateTime) -> Option<OffsetDateTime> {
    end.date().next_day().map(|d| d.with_time(Time::MIDNIGHT).assume_offset(end.offset()))
}

pub(crate) fn intersect(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

pub(crate) fn subtract(a: &[DocId], b: &[DocId]) -> Vec<DocId> {
    let mut out = Vec::with_capacity(a.len());
    let mut j = 0;
    for &id in a {
        while j < b.len() && b[j] < id {
            j += 1;
        }
        if j < b.len() && b[j] == id {
            continue;
        }
        out.push(id);
    }
    out
}
