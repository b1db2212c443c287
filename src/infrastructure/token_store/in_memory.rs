use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

use crate::domain::{
    ports::TokenStore, DocumentRecord, DomainError, StoredDocument, TokenEmbeddings,
};

#[derive(Default)]
struct Entries {
    documents: Vec<StoredDocument>,
    positions: HashMap<String, usize>,
}

/// Append-only token store held in process memory.
///
/// Writers take the write lock, readers the read lock; a snapshot therefore
/// never interleaves with an insertion.
pub struct InMemoryTokenStore {
    entries: RwLock<Entries>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
        }
    }
}

impl Default for InMemoryTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn add(
        &self,
        record: DocumentRecord,
        embeddings: TokenEmbeddings,
    ) -> Result<bool, DomainError> {
        let mut store = self
            .entries
            .write()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        if store.positions.contains_key(&record.id) {
            debug!(document_id = %record.id, "document already stored, keeping first write");
            return Ok(false);
        }

        let position = store.documents.len();
        store.positions.insert(record.id.clone(), position);
        store.documents.push(StoredDocument::new(record, embeddings));
        Ok(true)
    }

    async fn get(&self, id: &str) -> Result<Arc<TokenEmbeddings>, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store
            .positions
            .get(id)
            .map(|&position| store.documents[position].embeddings.clone())
            .ok_or_else(|| DomainError::not_found(id))
    }

    async fn get_record(&self, id: &str) -> Result<Arc<DocumentRecord>, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        store
            .positions
            .get(id)
            .map(|&position| store.documents[position].record.clone())
            .ok_or_else(|| DomainError::not_found(id))
    }

    async fn all(&self) -> Result<Vec<Arc<DocumentRecord>>, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.documents.iter().map(|d| d.record.clone()).collect())
    }

    async fn snapshot(&self) -> Result<Vec<StoredDocument>, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.documents.clone())
    }

    async fn len(&self) -> Result<usize, DomainError> {
        let store = self
            .entries
            .read()
            .map_err(|e| DomainError::internal(e.to_string()))?;

        Ok(store.documents.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn embeddings(rows: Vec<Vec<f32>>) -> TokenEmbeddings {
        TokenEmbeddings::from_rows(rows).unwrap()
    }

    #[tokio::test]
    async fn test_add_and_get() {
        let store = InMemoryTokenStore::new();

        let inserted = store
            .add(DocumentRecord::new("0"), embeddings(vec![vec![1.0, 0.0]]))
            .await
            .unwrap();
        assert!(inserted);

        let stored = store.get("0").await.unwrap();
        assert_eq!(stored.num_tokens(), 1);
        assert_eq!(stored.dimension(), 2);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = InMemoryTokenStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound(ref id) if id == "nope"));
        assert!(store.get_record("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_add_keeps_first_write() {
        let store = InMemoryTokenStore::new();

        store
            .add(
                DocumentRecord::new("a").with_field("version", 1),
                embeddings(vec![vec![1.0, 0.0]]),
            )
            .await
            .unwrap();
        let inserted = store
            .add(
                DocumentRecord::new("a").with_field("version", 2),
                embeddings(vec![vec![0.0, 1.0], vec![1.0, 1.0]]),
            )
            .await
            .unwrap();

        assert!(!inserted);
        assert_eq!(store.len().await.unwrap(), 1);
        assert_eq!(store.get("a").await.unwrap().as_slice(), &[1.0, 0.0]);
        assert_eq!(store.get_record("a").await.unwrap().fields["version"], 1);
    }

    #[tokio::test]
    async fn test_all_in_insertion_order() {
        let store = InMemoryTokenStore::new();
        for id in ["c", "a", "b"] {
            store
                .add(DocumentRecord::new(id), embeddings(vec![vec![1.0]]))
                .await
                .unwrap();
        }

        let ids: Vec<String> = store
            .all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);

        let snapshot = store.snapshot().await.unwrap();
        let snapshot_ids: Vec<&str> = snapshot.iter().map(|d| d.id()).collect();
        assert_eq!(snapshot_ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_snapshot_unaffected_by_later_adds() {
        let store = InMemoryTokenStore::new();
        store
            .add(DocumentRecord::new("first"), embeddings(vec![vec![1.0]]))
            .await
            .unwrap();

        let snapshot = store.snapshot().await.unwrap();
        store
            .add(DocumentRecord::new("second"), embeddings(vec![vec![1.0]]))
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(store.len().await.unwrap(), 2);
    }
}
