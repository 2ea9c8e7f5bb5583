use thiserror::Error;

/// Failure modes of a search engine call.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not be reached or answered with a server-side fault.
    #[error("search engine unavailable: {0}")]
    Unavailable(String),
    /// The engine rejected the query itself.
    #[error("search engine rejected query: {0}")]
    Query(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Both the engine and the relational store failed to answer a search.
#[derive(Debug, Error)]
#[error("search temporarily unavailable: {cause}")]
pub struct SearchUnavailable {
    #[source]
    pub cause: StoreError,
}

#[derive(Debug, Error)]
pub enum ProductError {
    #[error("product with id '{0}' not found")]
    NotFound(String),
    #[error(transparent)]
    Unavailable(#[from] StoreError),
}
