use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use tracing::warn;

use crate::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Guard for endpoints that require the `x-api-key` header. Always passes
/// when the service runs without an API key.
pub struct ApiKey;

impl FromRequestParts<Arc<AppState>> for ApiKey {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config.api_key.as_deref() else {
            return Ok(ApiKey);
        };

        let provided = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        if constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
            return Ok(ApiKey);
        }

        warn!(path = %parts.uri.path(), "Rejected request with invalid API key");
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": "unauthorized", "message": "Invalid API Key"})),
        )
            .into_response())
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
