use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use time::OffsetDateTime;

pub type DocId = u32;

/// A feed entry as stored by the index. Its id is its position in the build input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub description: String,
    pub published: OffsetDateTime,
}

impl Document {
    pub fn new(title: impl Into<String>, description: impl Into<String>, published: OffsetDateTime) -> Self {
        Self { title: title.into(), description: description.into(), published }
    }

    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    Title,
    Description,
}

impl Field {
    pub const ALL: [Field; 2] = [Field::Title, Field::Description];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How query terms are compared against indexed terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermMatching {
    /// Query terms go through the same tokenizer as indexed text.
    #[default]
    Normalized,
    /// Query terms are looked up exactly as given.
    Literal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    pub term_matching: TermMatching,
}

/// term -> postings, sorted ascending by doc_id and free of duplicates
pub type FieldPostings = HashMap<String, Vec<DocId>>;

#[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    pub(crate) title: FieldPostings,
    pub(crate) description: FieldPostings,
    pub(crate) docs: Vec<Document>,
    pub(crate) config: IndexConfig,
}

impl InvertedIndex {
    pub(crate) fn from_parts(title: FieldPostings, description: FieldPostings, docs: Vec<Document>, config: IndexConfig) -> Self {
        Self { title, description, docs, config }
    }

    pub(crate) fn field_postings(&self, field: Field) -> &FieldPostings {
        match field {
            Field::Title => &self.title,
            Field::Description => &self.description,
        }
    }

    /// Ids of the documents whose `field` contains `term`. Empty when the term was never indexed.
    pub fn postings(&self, field: Field, term: &str) -> &[DocId] {
        self.field_postings(field).get(term).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn num_docs(&self) -> u32 {
        self.docs.len() as u32
    }

    pub fn num_terms(&self, field: Field) -> usize {
        self.field_postings(field).len()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &Document)> + '_ {
        self.docs.iter().enumerate().map(|(i, d)| (i as DocId, d))
    }

    /// Resolve ids to documents ordered by title, then id. Unknown ids are skipped.
    pub fn resolve_sorted_by_title(&self, ids: &[DocId]) -> Vec<(DocId, &Document)> {
        let mut hits: Vec<(DocId, &Document)> = ids
            .iter()
            .filter_map(|&id| self.document(id).map(|d| (id, d)))
            .collect();
        hits.sort_by(|a, b| a.1.title.cmp(&b.1.title).then(a.0.cmp(&b.0)));
        hits
    }
}
