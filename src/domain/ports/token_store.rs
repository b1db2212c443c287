use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{errors::DomainError, DocumentRecord, StoredDocument, TokenEmbeddings};

/// Insertion-ordered store of per-document token embeddings.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Inserts the document unless its identifier is already present.
    ///
    /// A duplicate identifier is not an error: the first write wins and the
    /// call returns `Ok(false)`.
    async fn add(
        &self,
        record: DocumentRecord,
        embeddings: TokenEmbeddings,
    ) -> Result<bool, DomainError>;

    async fn get(&self, id: &str) -> Result<Arc<TokenEmbeddings>, DomainError>;

    async fn get_record(&self, id: &str) -> Result<Arc<DocumentRecord>, DomainError>;

    async fn all(&self) -> Result<Vec<Arc<DocumentRecord>>, DomainError>;

    /// Every entry in insertion order, as seen at one instant.
    async fn snapshot(&self) -> Result<Vec<StoredDocument>, DomainError>;

    async fn len(&self) -> Result<usize, DomainError>;
}
