// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! POST /embed HTTP handler

use axum::{extract::State, Json};
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::api::embed::{EmbedRequest, EmbedResponse};
use crate::api::http_server::AppState;
use crate::api::{ApiError, ApiJson};

/// POST /embed handler
///
/// Encodes the whole batch with one call into the shared model and returns
/// one unit-length vector per input text, in input order.
///
/// # Request Body
/// ```json
/// { "texts": ["text1", "text2"] }
/// ```
///
/// # Response Body
/// ```json
/// { "vectors": [[0.1, 0.2, ...], [0.3, 0.4, ...]] }
/// ```
///
/// # Errors
/// - 422 Unprocessable Entity: body missing, not JSON, or `texts` is not a list of strings
/// - 500 Internal Server Error: inference failed
pub async fn embed_handler(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<EmbedRequest>,
) -> Result<Json<EmbedResponse>, ApiError> {
    let text_count = request.texts.len();
    debug!("Embed request received: {} texts", text_count);

    let started = Instant::now();
    let embedder = state.embedder.clone();
    let texts = request.texts;

    // Inference is blocking; keep it off the async workers
    let vectors = tokio::task::spawn_blocking(move || embedder.encode(&texts))
        .await
        .map_err(|e| {
            error!("Embedding task failed to complete: {}", e);
            ApiError::InternalError(format!("Embedding task failed: {}", e))
        })?
        .map_err(|e| {
            warn!("Embedding generation failed: {:#}", e);
            ApiError::InternalError(format!("Embedding generation failed: {}", e))
        })?;

    let response = EmbedResponse::new(vectors);
    if let Err(e) = response.validate(text_count, state.embedder.dimension()) {
        warn!("Embedding output rejected: {}", e);
        return Err(e);
    }

    info!(
        "Generated {} embeddings in {}ms",
        text_count,
        started.elapsed().as_millis()
    );

    Ok(Json(response))
}
