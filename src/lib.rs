//! Late-interaction (MaxSim) retrieval over pre-computed token embeddings.
//!
//! Documents are stored as per-token embedding matrices. A query is scored
//! against every document as the sum, over query tokens, of the best dot
//! product with any document token; the top-k documents are returned per
//! query.

pub mod api;
pub mod application;
pub mod domain;
pub mod infrastructure;
