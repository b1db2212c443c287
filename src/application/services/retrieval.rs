use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::domain::{
    ports::TokenStore, ranking, scoring, DocumentRecord, DomainError, QueryEmbedding,
    RankedDocument, StoredDocument, TokenEmbeddings,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddSummary {
    pub inserted: usize,
    pub skipped: usize,
}

/// Scores every stored document against each query and ranks the results.
pub struct RetrievalService {
    store: Arc<dyn TokenStore>,
    batch_size: usize,
}

impl RetrievalService {
    pub fn new(store: Arc<dyn TokenStore>, batch_size: usize) -> Self {
        Self { store, batch_size }
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Adds documents in order. Identifiers already present are skipped.
    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn add_documents(
        &self,
        documents: Vec<(DocumentRecord, TokenEmbeddings)>,
    ) -> Result<AddSummary, DomainError> {
        let mut summary = AddSummary::default();
        for (record, embeddings) in documents {
            if self.store.add(record, embeddings).await? {
                summary.inserted += 1;
            } else {
                summary.skipped += 1;
            }
        }

        debug!(inserted = summary.inserted, skipped = summary.skipped, "documents added");
        Ok(summary)
    }

    pub async fn retrieve(
        &self,
        queries: Vec<QueryEmbedding>,
        k: Option<i64>,
    ) -> Result<Vec<Vec<RankedDocument>>, DomainError> {
        self.retrieve_with_batch_size(queries, k, self.batch_size)
            .await
    }

    /// Returns one ranked list per query, in query order.
    #[instrument(skip(self, queries), fields(queries = queries.len()))]
    pub async fn retrieve_with_batch_size(
        &self,
        queries: Vec<QueryEmbedding>,
        k: Option<i64>,
        batch_size: usize,
    ) -> Result<Vec<Vec<RankedDocument>>, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::validation("batch size must be positive"));
        }
        if let Some(k) = k.filter(|k| *k < 0) {
            return Err(DomainError::InvalidK(k));
        }

        let documents = self.store.snapshot().await?;
        info!(documents = documents.len(), batch_size, "scoring queries");

        tokio::task::spawn_blocking(move || rank_all(&queries, &documents, k, batch_size))
            .await
            .map_err(|e| DomainError::internal(e.to_string()))?
    }

    /// Scores query `i` against document `i` without touching the store.
    #[instrument(skip(self, queries, documents), fields(pairs = queries.len()))]
    pub async fn score_pairs(
        &self,
        queries: Vec<QueryEmbedding>,
        documents: Vec<TokenEmbeddings>,
        batch_size: usize,
    ) -> Result<Vec<f32>, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::validation("batch size must be positive"));
        }

        tokio::task::spawn_blocking(move || -> Result<Vec<f32>, DomainError> {
            scoring::check_pairs(&queries, &documents)?;

            let batches: Vec<Vec<f32>> = queries
                .par_chunks(batch_size)
                .zip(documents.par_chunks(batch_size))
                .map(|(queries, documents)| scoring::score_pairs(queries, documents))
                .collect::<Result<_, _>>()?;
            Ok(batches.concat())
        })
        .await
        .map_err(|e| DomainError::internal(e.to_string()))?
    }
}

fn rank_all(
    queries: &[QueryEmbedding],
    documents: &[StoredDocument],
    k: Option<i64>,
    batch_size: usize,
) -> Result<Vec<Vec<RankedDocument>>, DomainError> {
    queries
        .par_iter()
        .map(|query| {
            let scores = score_query(query, documents, batch_size)?;
            ranking::rank(&scores, documents, k)
        })
        .collect()
}

/// Full score vector for one query, aligned with `documents`.
///
/// Batches may finish in any order; the indexed collect puts them back in
/// store order before concatenation.
fn score_query(
    query: &QueryEmbedding,
    documents: &[StoredDocument],
    batch_size: usize,
) -> Result<Vec<f32>, DomainError> {
    if query.embeddings.is_empty() {
        return Err(DomainError::empty_query(&query.id));
    }

    let batches: Vec<Vec<f32>> = documents
        .par_chunks(batch_size)
        .map(|batch| scoring::score_batch(query, batch))
        .collect::<Result<_, _>>()?;

    debug!(query_id = %query.id, batches = batches.len(), "query scored");
    Ok(batches.concat())
}
