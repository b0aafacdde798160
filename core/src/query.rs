use std::collections::BTreeSet;
use time::OffsetDateTime;

/// Boolean filter over an index. Every component is optional: an empty set or `None` adds no constraint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub title_must_include: BTreeSet<String>,
    pub title_must_exclude: BTreeSet<String>,
    pub description_must_include: BTreeSet<String>,
    pub description_must_exclude: BTreeSet<String>,
    /// Inclusive lower bound on the publication instant.
    pub start: Option<OffsetDateTime>,
    /// Inclusive upper bound covering the whole calendar day of this instant.
    pub end: Option<OffsetDateTime>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.title_must_include.is_empty()
            && self.title_must_exclude.is_empty()
            && self.description_must_include.is_empty()
            && self.description_must_exclude.is_empty()
            && self.start.is_none()
            && self.end.is_none()
    }
}

/// Collect terms into the set type used by [`Query`].
pub fn terms<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}
