//! Late-interaction (MaxSim) scoring.
//!
//! ```text
//! score(Q, D) = Σ_s max_t dot(Q[s], D[t])
//! ```
//!
//! The contraction is written as a similarity matrix followed by two
//! reduction passes: max over document tokens, then sum over query tokens.
//! Every document is scored on its own, so a score never depends on the
//! batch it was placed in.
//!
//! NaN similarities propagate: a NaN entry makes its row maximum NaN, and the
//! sum carries it through to the document score.

use crate::domain::{
    errors::{DomainError, Result},
    QueryEmbedding, StoredDocument, TokenEmbeddings,
};

#[inline]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Dense `[query_tokens, document_tokens]` inner-product matrix, row-major.
///
/// Callers are expected to have checked that both sides share a dimension.
pub fn similarity_matrix(query: &TokenEmbeddings, document: &TokenEmbeddings) -> Vec<f32> {
    let mut sim = Vec::with_capacity(query.num_tokens() * document.num_tokens());
    for q in query.tokens() {
        sim.extend(document.tokens().map(|d| dot(q, d)));
    }
    sim
}

/// Row-wise maximum of a row-major matrix with `columns` columns.
///
/// Unlike `f32::max`, a NaN entry wins.
pub fn max_per_row(matrix: &[f32], columns: usize) -> Vec<f32> {
    matrix
        .chunks_exact(columns.max(1))
        .map(|row| {
            row.iter().copied().fold(f32::NEG_INFINITY, |best, value| {
                if value.is_nan() || value > best {
                    value
                } else {
                    best
                }
            })
        })
        .collect()
}

/// MaxSim of two non-empty, same-dimension token matrices.
pub fn maxsim(query: &TokenEmbeddings, document: &TokenEmbeddings) -> f32 {
    let sim = similarity_matrix(query, document);
    max_per_row(&sim, document.num_tokens()).iter().sum()
}

fn check_query(query: &QueryEmbedding) -> Result<()> {
    if query.embeddings.is_empty() {
        return Err(DomainError::empty_query(&query.id));
    }
    Ok(())
}

fn check_tokens(
    query: &QueryEmbedding,
    document_id: &str,
    document: &TokenEmbeddings,
) -> Result<()> {
    if document.is_empty() {
        return Err(DomainError::empty_document(document_id));
    }
    if document.dimension() != query.embeddings.dimension() {
        return Err(DomainError::DimensionMismatch {
            query_id: query.id.clone(),
            document_id: document_id.to_string(),
            query_dim: query.embeddings.dimension(),
            document_dim: document.dimension(),
        });
    }
    Ok(())
}

fn check_document(query: &QueryEmbedding, document: &StoredDocument) -> Result<()> {
    check_tokens(query, document.id(), &document.embeddings)
}

/// Scores a single document against a query.
pub fn score_document(query: &QueryEmbedding, document: &StoredDocument) -> Result<f32> {
    check_query(query)?;
    check_document(query, document)?;
    Ok(maxsim(&query.embeddings, &document.embeddings))
}

/// Scores a batch of documents, returning one score per document in batch
/// order.
///
/// The whole batch is validated before any scoring, so one malformed
/// document fails the batch instead of being dropped from it.
pub fn score_batch(query: &QueryEmbedding, batch: &[StoredDocument]) -> Result<Vec<f32>> {
    check_query(query)?;
    for document in batch {
        check_document(query, document)?;
    }

    Ok(batch
        .iter()
        .map(|document| maxsim(&query.embeddings, &document.embeddings))
        .collect())
}

/// Validates aligned `(queries[i], documents[i])` pairs. Documents have no
/// identifier of their own and are reported by position.
pub fn check_pairs(queries: &[QueryEmbedding], documents: &[TokenEmbeddings]) -> Result<()> {
    if queries.len() != documents.len() {
        return Err(DomainError::validation(format!(
            "{} queries for {} documents, pairs must align",
            queries.len(),
            documents.len()
        )));
    }
    for (position, (query, document)) in queries.iter().zip(documents).enumerate() {
        check_query(query)?;
        check_tokens(query, &position.to_string(), document)?;
    }
    Ok(())
}

/// Scores query `i` against document `i`, one score per pair in input order.
pub fn score_pairs(
    queries: &[QueryEmbedding],
    documents: &[TokenEmbeddings],
) -> Result<Vec<f32>> {
    check_pairs(queries, documents)?;

    Ok(queries
        .iter()
        .zip(documents)
        .map(|(query, document)| maxsim(&query.embeddings, document))
        .collect())
}
