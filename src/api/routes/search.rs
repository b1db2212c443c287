use std::collections::BTreeMap;

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::api::{error::ApiError, extract::ApiJson, state::AppState};
use crate::domain::{
    evaluation::{self, Metric, Qrels},
    DomainError, QueryEmbedding, RankedDocument, TokenEmbeddings,
};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub queries: Vec<QueryEmbedding>,
    pub k: Option<i64>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub queries: Vec<QueryEmbedding>,
    pub qrels: Qrels,
    #[serde(default = "default_evaluation_k")]
    pub k: usize,
    #[serde(default)]
    pub metrics: Vec<String>,
    pub batch_size: Option<usize>,
}

fn default_evaluation_k() -> usize {
    30
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub queries: Vec<QueryEmbedding>,
    pub documents: Vec<TokenEmbeddings>,
    pub batch_size: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub scores: Vec<f32>,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub metrics: BTreeMap<String, f64>,
}

async fn run_queries(
    state: &AppState,
    queries: Vec<QueryEmbedding>,
    k: Option<i64>,
    batch_size: Option<usize>,
) -> Result<Vec<Vec<RankedDocument>>, DomainError> {
    let batch_size = batch_size.unwrap_or_else(|| state.retrieval.batch_size());
    state
        .retrieval
        .retrieve_with_batch_size(queries, k, batch_size)
        .await
}

/// One ranked list per query, each entry carrying the record attributes, the
/// identifier and `similarity`.
pub async fn search(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> Result<Json<Vec<Vec<Map<String, Value>>>>, ApiError> {
    let k = request.k.or(state.config.retrieval.default_k);
    let results = run_queries(&state, request.queries, k, request.batch_size).await?;

    let key_field = state.key_field();
    Ok(Json(
        results
            .iter()
            .map(|ranked| ranked.iter().map(|r| r.to_attributes(key_field)).collect())
            .collect(),
    ))
}

pub async fn evaluate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, ApiError> {
    let metrics = request
        .metrics
        .iter()
        .map(|m| m.parse::<Metric>())
        .collect::<Result<Vec<_>, _>>()?;

    let query_ids: Vec<String> = request.queries.iter().map(|q| q.id.clone()).collect();
    let k = i64::try_from(request.k).unwrap_or(i64::MAX);
    let results = run_queries(&state, request.queries, Some(k), request.batch_size).await?;

    let run = evaluation::build_run(&query_ids, &results, request.k);
    Ok(Json(EvaluateResponse {
        metrics: evaluation::evaluate(&request.qrels, &run, &metrics),
    }))
}

/// MaxSim of `queries[i]` against `documents[i]`; the store is not consulted.
pub async fn score(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ScoreRequest>,
) -> Result<Json<ScoreResponse>, ApiError> {
    let batch_size = request
        .batch_size
        .unwrap_or_else(|| state.retrieval.batch_size());
    let scores = state
        .retrieval
        .score_pairs(request.queries, request.documents, batch_size)
        .await?;

    Ok(Json(ScoreResponse { scores }))
}
