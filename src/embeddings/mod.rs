// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding models
//!
//! The HTTP layer only sees [`TextEmbedder`]. The model behind it is loaded
//! once at startup by [`load_embedder`] and shared read-only afterwards.

pub mod hash_embedder;
pub mod model_source;
pub mod onnx_model;
pub mod pooling;

pub use hash_embedder::HashEmbedder;
pub use model_source::{ModelFiles, ModelSource};
pub use onnx_model::OnnxEmbeddingModel;
pub use pooling::{l2_normalize, mean_pool};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::{Backend, ServiceConfig};

pub const DEFAULT_MODEL_NAME: &str = "all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_MODEL_FILE: &str = "onnx/model.onnx";
pub const DEFAULT_TOKENIZER_FILE: &str = "tokenizer.json";
pub const DEFAULT_DIMENSION: usize = 384;
/// all-MiniLM-L6-v2 `max_seq_length`
pub const DEFAULT_MAX_LENGTH: usize = 256;

/// A model that turns a batch of texts into unit-length vectors
///
/// `encode` is blocking; async callers run it on the blocking pool.
pub trait TextEmbedder: Send + Sync + 'static {
    /// Output dimension of every vector
    fn dimension(&self) -> usize;

    /// Encodes the whole batch in one call.
    ///
    /// Returns one L2-normalized vector per input, in input order.
    /// An empty batch yields an empty result.
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Encodes a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.encode(&[text.to_string()])?
            .pop()
            .context("Embedder returned no vector")
    }
}

/// Builds the process-wide embedder described by `config`
///
/// Model file resolution and session creation are blocking, so they run on
/// the blocking pool.
pub async fn load_embedder(config: &ServiceConfig) -> Result<Arc<dyn TextEmbedder>> {
    match config.backend {
        Backend::Hash => {
            info!(
                "Using hash embedding backend ({} dimensions)",
                config.dimension
            );
            Ok(Arc::new(HashEmbedder::new(config.dimension)?))
        }
        Backend::Onnx => {
            let source = config.model_source();
            let model_name = config.model_name.clone();
            let dimension = config.dimension;
            let max_length = config.max_length;
            let intra_threads = config.intra_threads;

            let model = tokio::task::spawn_blocking(move || -> Result<OnnxEmbeddingModel> {
                let files = source.resolve()?;
                OnnxEmbeddingModel::load(
                    model_name,
                    &files.model_path,
                    &files.tokenizer_path,
                    dimension,
                    max_length,
                    intra_threads,
                )
            })
            .await
            .context("Model loading task failed")??;

            info!(
                "Loaded embedding model: {} ({} dimensions)",
                model.model_name(),
                model.dimension()
            );
            Ok(Arc::new(model))
        }
    }
}
