use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::api::error::ApiError;
use crate::domain::DomainError;

/// `axum::Json` whose rejections answer with the API's JSON error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(DomainError::validation(rejection.body_text()))
    }
}
