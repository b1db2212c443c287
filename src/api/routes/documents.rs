use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{error::ApiError, extract::ApiJson, state::AppState};
use crate::domain::{DocumentRecord, TokenEmbeddings};

#[derive(Debug, Deserialize)]
pub struct DocumentInput {
    pub id: String,
    pub embeddings: TokenEmbeddings,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct AddDocumentsRequest {
    pub documents: Vec<DocumentInput>,
}

#[derive(Debug, Serialize)]
pub struct AddDocumentsResponse {
    pub inserted: usize,
    pub skipped: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct DocumentResponse {
    pub id: String,
    pub tokens: usize,
    pub dimension: usize,
    pub fields: Map<String, Value>,
}

pub async fn add_documents(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddDocumentsRequest>,
) -> Result<Json<AddDocumentsResponse>, ApiError> {
    let documents = request
        .documents
        .into_iter()
        .map(|doc| (DocumentRecord::new(doc.id).with_fields(doc.fields), doc.embeddings))
        .collect();

    let summary = state.retrieval.add_documents(documents).await?;
    let total = state.retrieval.store().len().await?;

    Ok(Json(AddDocumentsResponse {
        inserted: summary.inserted,
        skipped: summary.skipped,
        total,
    }))
}

/// Records in insertion order, identifier under the configured key field.
pub async fn list_documents(
    State(state): State<AppState>,
) -> Result<Json<Vec<Map<String, Value>>>, ApiError> {
    let records = state.retrieval.store().all().await?;
    let key_field = state.key_field();

    Ok(Json(
        records
            .iter()
            .map(|record| {
                let mut attributes = record.fields.clone();
                attributes.insert(key_field.to_string(), Value::String(record.id.clone()));
                attributes
            })
            .collect(),
    ))
}

pub async fn get_document(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DocumentResponse>, ApiError> {
    let store = state.retrieval.store();
    let embeddings = store.get(&id).await?;
    let record = store.get_record(&id).await?;

    Ok(Json(DocumentResponse {
        id,
        tokens: embeddings.num_tokens(),
        dimension: embeddings.dimension(),
        fields: record.fields.clone(),
    }))
}
