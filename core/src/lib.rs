//! In-memory boolean search over feed documents: tokenizer, per-field
//! inverted index, query model and evaluator, plus on-disk snapshots.

pub mod builder;
pub mod day;
pub mod error;
pub mod eval;
pub mod index;
pub mod persist;
pub mod query;
pub mod tokenizer;

pub use builder::{build, IndexBuilder};
pub use error::BuildError;
pub use eval::{evaluate, evaluate_with};
pub use index::{DocId, Document, Field, FieldPostings, IndexConfig, InvertedIndex, TermMatching};
pub use query::{terms, Query};
