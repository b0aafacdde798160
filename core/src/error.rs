use thiserror::Error;

/// Error raised while consuming the document sequence given to [`build`](crate::build).
#[derive(Error, Debug)]
pub enum BuildError {
    /// The upstream source failed to produce the document at `position`.
    #[error("failed to read document {position}: {source}")]
    Ingest {
        position: usize,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}
