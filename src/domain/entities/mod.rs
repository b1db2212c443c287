mod document;
mod embedding;

pub use document::{DocumentRecord, RankedDocument, StoredDocument, SIMILARITY_FIELD};
pub use embedding::{QueryEmbedding, TokenEmbeddings};
