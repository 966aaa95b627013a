//! Document store seam: types and the adapter trait.

use std::future::Future;

use bytes::Bytes;

/// Error talking to the document store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The named database does not exist.
    #[error("database {0:?} does not exist")]
    MissingDatabase(String),

    /// The named attachment does not exist on the document.
    #[error("attachment {name:?} missing on document {doc_id:?}")]
    MissingAttachment { doc_id: String, name: String },

    /// Transport-level failure reaching the store.
    #[error("store request failed: {0}")]
    Request(String),

    /// The store answered with something this adapter cannot decode.
    #[error("store response invalid: {0}")]
    InvalidResponse(String),
}

/// A document returned from a range read, body included.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub body: serde_json::Value,
}

/// Half-open key range `[start, end)` over document ids.
#[derive(Debug, Clone)]
pub struct KeyRange {
    pub start: String,
    pub end: String,
}

impl KeyRange {
    /// Range covering every id beginning with `prefix`.
    pub fn prefix(prefix: &str) -> Self {
        Self {
            start: prefix.to_string(),
            end: format!("{prefix}\u{ffff}"),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        *id >= *self.start && *id < *self.end
    }
}

/// Read access to the document database backing the gateway.
///
/// Implementations must be cheap to share across tasks.
pub trait DocumentStore: Send + Sync + 'static {
    /// All documents of `database` whose id falls in `range`, bodies
    /// included, ordered by id.
    fn all_docs(
        &self,
        database: &str,
        range: &KeyRange,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Raw bytes of one attachment.
    fn get_attachment(
        &self,
        database: &str,
        doc_id: &str,
        name: &str,
    ) -> impl Future<Output = Result<Bytes, StoreError>> + Send;
}
