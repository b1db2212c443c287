use std::fmt;

use thiserror::Error;

/// Which side of a (query, document) pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceKind {
    Query,
    Document,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => f.write_str("query"),
            Self::Document => f.write_str("document"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error(
        "Dimension mismatch: query {query_id} has dimension {query_dim}, \
         document {document_id} has dimension {document_dim}"
    )]
    DimensionMismatch {
        query_id: String,
        document_id: String,
        query_dim: usize,
        document_dim: usize,
    },

    #[error("Empty token sequence for {kind} {id}")]
    EmptySequence { kind: SequenceKind, id: String },

    #[error("Invalid k: {0} (must be zero or positive)")]
    InvalidK(i64),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn empty_query(id: impl Into<String>) -> Self {
        Self::EmptySequence {
            kind: SequenceKind::Query,
            id: id.into(),
        }
    }

    pub fn empty_document(id: impl Into<String>) -> Self {
        Self::EmptySequence {
            kind: SequenceKind::Document,
            id: id.into(),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
