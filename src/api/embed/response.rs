// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedResponse type for POST /embed

use crate::api::ApiError;
use serde::{Deserialize, Serialize};

/// Response body for POST /embed
///
/// One vector per input text, in input order.
///
/// # Example
/// ```json
/// {
///   "vectors": [[0.0123, -0.0456, ...]]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedResponse {
    pub vectors: Vec<Vec<f32>>,
}

impl EmbedResponse {
    pub fn new(vectors: Vec<Vec<f32>>) -> Self {
        Self { vectors }
    }

    /// Checks the model output against the request before it is returned
    ///
    /// A mismatch is a server fault, so it maps to `InternalError`.
    pub fn validate(&self, expected_count: usize, dimension: usize) -> Result<(), ApiError> {
        if self.vectors.len() != expected_count {
            return Err(ApiError::InternalError(format!(
                "model returned {} vectors for {} texts",
                self.vectors.len(),
                expected_count
            )));
        }

        for (index, vector) in self.vectors.iter().enumerate() {
            if vector.len() != dimension {
                return Err(ApiError::InternalError(format!(
                    "vectors[{}] has {} dimensions (expected {})",
                    index,
                    vector.len(),
                    dimension
                )));
            }
        }

        Ok(())
    }
}
