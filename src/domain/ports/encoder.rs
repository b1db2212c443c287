use async_trait::async_trait;

use crate::domain::{errors::DomainError, TokenEmbeddings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    Query,
    Document,
}

/// Produces per-token embeddings for raw texts.
#[async_trait]
pub trait TokenEncoder: Send + Sync {
    async fn encode(
        &self,
        texts: &[&str],
        mode: EncodeMode,
    ) -> Result<Vec<TokenEmbeddings>, DomainError>;
    fn dimension(&self) -> usize;
}
