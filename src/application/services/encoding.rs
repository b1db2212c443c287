use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::instrument;

use crate::domain::{
    ports::{EncodeMode, TokenEncoder},
    DocumentRecord, DomainError, QueryEmbedding, TokenEmbeddings,
};

/// Turns raw documents and query texts into token embeddings through a
/// [`TokenEncoder`].
pub struct EncodingService {
    encoder: Arc<dyn TokenEncoder>,
    key: String,
    on: Vec<String>,
}

impl EncodingService {
    /// `key` names the identifier field of each document; `on` lists the text
    /// fields joined (with a single space) into the encoder input.
    pub fn new(encoder: Arc<dyn TokenEncoder>, key: impl Into<String>, on: Vec<String>) -> Self {
        Self {
            encoder,
            key: key.into(),
            on,
        }
    }

    #[instrument(skip(self, documents), fields(count = documents.len()))]
    pub async fn encode_documents(
        &self,
        documents: &[Map<String, Value>],
        batch_size: usize,
    ) -> Result<Vec<(DocumentRecord, TokenEmbeddings)>, DomainError> {
        let records = documents
            .iter()
            .map(|document| self.record(document))
            .collect::<Result<Vec<_>, _>>()?;
        let texts = documents
            .iter()
            .map(|document| self.text(document))
            .collect::<Result<Vec<_>, _>>()?;

        let embeddings = self
            .encode_batched(&texts, EncodeMode::Document, batch_size)
            .await?;
        Ok(records.into_iter().zip(embeddings).collect())
    }

    /// Each query is identified by its own text.
    #[instrument(skip(self, queries), fields(count = queries.len()))]
    pub async fn encode_queries(
        &self,
        queries: &[String],
        batch_size: usize,
    ) -> Result<Vec<QueryEmbedding>, DomainError> {
        let embeddings = self
            .encode_batched(queries, EncodeMode::Query, batch_size)
            .await?;
        Ok(queries
            .iter()
            .zip(embeddings)
            .map(|(query, embeddings)| QueryEmbedding::new(query.clone(), embeddings))
            .collect())
    }

    async fn encode_batched(
        &self,
        texts: &[String],
        mode: EncodeMode,
        batch_size: usize,
    ) -> Result<Vec<TokenEmbeddings>, DomainError> {
        if batch_size == 0 {
            return Err(DomainError::validation("batch size must be positive"));
        }

        let mut embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(batch_size) {
            let batch: Vec<&str> = batch.iter().map(String::as_str).collect();
            let encoded = self.encoder.encode(&batch, mode).await?;
            if encoded.len() != batch.len() {
                return Err(DomainError::internal(format!(
                    "encoder returned {} embeddings for {} texts",
                    encoded.len(),
                    batch.len()
                )));
            }
            let expected = self.encoder.dimension();
            if let Some(wrong) = encoded
                .iter()
                .find(|e| !e.is_empty() && e.dimension() != expected)
            {
                return Err(DomainError::internal(format!(
                    "encoder produced dimension {}, declared {}",
                    wrong.dimension(),
                    expected
                )));
            }
            embeddings.extend(encoded);
        }
        Ok(embeddings)
    }

    fn record(&self, document: &Map<String, Value>) -> Result<DocumentRecord, DomainError> {
        let id = match document.get(&self.key) {
            Some(Value::String(id)) => id.clone(),
            Some(Value::Number(id)) => id.to_string(),
            Some(other) => {
                return Err(DomainError::validation(format!(
                    "field {} must be a string or number, got {}",
                    self.key, other
                )))
            }
            None => {
                return Err(DomainError::validation(format!(
                    "document is missing key field {}",
                    self.key
                )))
            }
        };

        let mut fields = document.clone();
        fields.remove(&self.key);
        Ok(DocumentRecord::new(id).with_fields(fields))
    }

    fn text(&self, document: &Map<String, Value>) -> Result<String, DomainError> {
        let parts = self
            .on
            .iter()
            .map(|field| match document.get(field) {
                Some(Value::String(text)) => Ok(text.clone()),
                Some(Value::Null) | None => Err(DomainError::validation(format!(
                    "document is missing text field {field}"
                ))),
                Some(other) => Ok(other.to_string()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" "))
    }
}
