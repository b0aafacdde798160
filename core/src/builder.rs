use crate::error::BuildError;
use crate::tokenizer::tokenize;
use crate::{DocId, Document, Field, FieldPostings, IndexConfig, InvertedIndex};

/// Accumulates documents into postings. Only [`IndexBuilder::finish`] hands out a queryable index.
pub struct IndexBuilder {
    config: IndexConfig,
    title: FieldPostings,
    description: FieldPostings,
    docs: Vec<Document>,
}

impl IndexBuilder {
    pub fn new(config: IndexConfig) -> Self {
        Self { config, title: FieldPostings::new(), description: FieldPostings::new(), docs: Vec::new() }
    }

    /// Index one document and return the id it was assigned.
    pub fn add(&mut self, doc: Document) -> DocId {
        let doc_id = self.docs.len() as DocId;
        for field in Field::ALL {
            let postings = match field {
                Field::Title => &mut self.title,
                Field::Description => &mut self.description,
            };
            for term in tokenize(doc.field(field)) {
                let plist = postings.entry(term).or_default();
                // ids are handed out in increasing order, so a repeat can only be the tail
                if plist.last() != Some(&doc_id) {
                    plist.push(doc_id);
                }
            }
        }
        self.docs.push(doc);
        doc_id
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    pub fn finish(self) -> InvertedIndex {
        tracing::info!(
            num_docs = self.docs.len(),
            title_terms = self.title.len(),
            description_terms = self.description.len(),
            "index built"
        );
        InvertedIndex::from_parts(self.title, self.description, self.docs, self.config)
    }
}

/// Build an index from a document sequence. Ids are positions in `documents`.
///
/// The first failing item aborts the build and nothing built so far escapes.
pub fn build<I, E>(documents: I, config: &IndexConfig) -> Result<InvertedIndex, BuildError>
where
    I: IntoIterator<Item = Result<Document, E>>,
    E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
{
    let mut builder = IndexBuilder::new(config.clone());
    for (position, item) in documents.into_iter().enumerate() {
        let doc = item.map_err(|e| BuildError::Ingest { position, source: e.into() })?;
        builder.add(doc);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use time::macros::datetime;

    #[test]
    fn repeated_term_posted_once() {
        let mut b = IndexBuilder::new(IndexConfig::default());
        b.add(Document::new("war war WAR", "", datetime!(2011-12-18 0:00 UTC)));
        let index = b.finish();
        assert_eq!(index.postings(Field::Title, "war"), &[0]);
    }

    #[test]
    fn upstream_failure_aborts() {
        let at = datetime!(2011-12-18 0:00 UTC);
        let items: Vec<Result<Document, io::Error>> = vec![
            Ok(Document::new("one", "", at)),
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "truncated feed")),
            Ok(Document::new("three", "", at)),
        ];
        match build(items, &IndexConfig::default()) {
            Err(BuildError::Ingest { position, source }) => {
                assert_eq!(position, 1);
                assert!(source.to_string().contains("truncated"));
            }
            Ok(_) => panic!("build should fail"),
        }
    }
}
