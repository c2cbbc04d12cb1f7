// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ONNX Embedding Model Wrapper
//!
//! This module provides a wrapper around ONNX Runtime for running
//! the all-MiniLM-L6-v2 sentence transformer model.
//!
//! Features:
//! - ONNX model loading from disk
//! - GPU acceleration via CUDA (with automatic CPU fallback)
//! - BERT tokenization with truncation and batch padding
//! - Batch embedding generation in a single session run
//! - Attention-masked mean pooling followed by L2 normalization

use anyhow::{anyhow, bail, Context, Result};
use ndarray::{Array2, Axis};
use ort::execution_providers::{
    CPUExecutionProvider, CUDAExecutionProvider, ExecutionProviderDispatch,
};
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tokenizers::{Encoding, Tokenizer, TruncationParams};
use tracing::{debug, info, warn};

use super::pooling::{l2_normalize, mean_pool};
use super::TextEmbedder;

/// ONNX-based sentence embedding model (all-MiniLM-L6-v2)
///
/// The ONNX graph outputs token-level embeddings `[batch, seq_len, hidden]`;
/// sentence vectors are produced here by mean pooling and L2 normalization.
///
/// # Thread Safety
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex. Concurrent callers serialize at the session.
#[derive(Clone)]
pub struct OnnxEmbeddingModel {
    session: Arc<Mutex<Session>>,
    tokenizer: Arc<Tokenizer>,
    model_name: String,
    dimension: usize,
    max_length: usize,
}

impl std::fmt::Debug for OnnxEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEmbeddingModel")
            .field("model_name", &self.model_name)
            .field("dimension", &self.dimension)
            .field("max_length", &self.max_length)
            .finish_non_exhaustive()
    }
}

/// Padded `[batch, max_len]` model inputs
struct BatchInputs {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

/// A poisoned lock is reported as an inference error instead of a panic
fn lock_session<T>(session: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    session
        .lock()
        .map_err(|_| anyhow!("ONNX session lock poisoned"))
}

fn build_session(
    model_path: &Path,
    provider: ExecutionProviderDispatch,
    intra_threads: usize,
) -> Result<Session> {
    Session::builder()
        .context("Failed to create session builder")?
        .with_execution_providers([provider])
        .context("Failed to set execution provider")?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(intra_threads)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .with_context(|| format!("Failed to load ONNX model from {}", model_path.display()))
}

impl OnnxEmbeddingModel {
    /// Loads the model and tokenizer from disk. Blocking.
    ///
    /// # Errors
    /// Returns error if:
    /// - Model file or tokenizer file not found or invalid
    /// - ONNX Runtime initialization fails
    /// - A validation inference does not produce `[batch, seq_len, dimension]`
    ///
    /// # Example
    /// ```ignore
    /// let model = OnnxEmbeddingModel::load(
    ///     "all-MiniLM-L6-v2",
    ///     Path::new("./models/all-MiniLM-L6-v2-onnx/model.onnx"),
    ///     Path::new("./models/all-MiniLM-L6-v2-onnx/tokenizer.json"),
    ///     384,
    ///     256,
    ///     4,
    /// )?;
    /// ```
    pub fn load(
        model_name: impl Into<String>,
        model_path: &Path,
        tokenizer_path: &Path,
        dimension: usize,
        max_length: usize,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_name = model_name.into();

        if !model_path.exists() {
            bail!("ONNX model file not found: {}", model_path.display());
        }
        if !tokenizer_path.exists() {
            bail!("Tokenizer file not found: {}", tokenizer_path.display());
        }

        // Try CUDA first, fall back to CPU if unavailable
        info!("Initializing ONNX embedding model {}", model_name);
        let session = match build_session(
            model_path,
            CUDAExecutionProvider::default().build(),
            intra_threads,
        ) {
            Ok(session) => {
                info!("CUDA execution provider initialized");
                session
            }
            Err(e) => {
                warn!("CUDA execution provider failed: {:#}", e);
                warn!("Falling back to CPU execution provider");
                build_session(
                    model_path,
                    CPUExecutionProvider::default().build(),
                    intra_threads,
                )?
            }
        };

        let mut tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow!("Failed to load tokenizer: {}", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Failed to configure tokenizer truncation: {}", e))?;
        // Padding is applied per batch in `batch_inputs`
        tokenizer.with_padding(None);

        let model = Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            model_name,
            dimension,
            max_length,
        };

        let probe = model
            .encode(&["validation test".to_string()])
            .context("Validation inference failed")?;
        if probe.len() != 1 || probe[0].len() != dimension {
            bail!(
                "Model produced {} vector(s) of {} dimensions during validation (expected 1 of {})",
                probe.len(),
                probe.first().map(Vec::len).unwrap_or(0),
                dimension
            );
        }

        info!(
            "ONNX embedding model loaded successfully (max {} tokens per text)",
            model.max_length()
        );
        Ok(model)
    }

    fn tokenize(&self, texts: &[String]) -> Result<Vec<Encoding>> {
        self.tokenizer
            .encode_batch(texts.iter().map(String::as_str).collect::<Vec<_>>(), true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))
    }

    /// Right-pads every encoding to the longest one in the batch
    fn batch_inputs(encodings: &[Encoding]) -> Result<BatchInputs> {
        let batch = encodings.len();
        let max_len = encodings
            .iter()
            .map(|enc| enc.get_ids().len())
            .max()
            .unwrap_or(0);

        let mut input_ids = Vec::with_capacity(batch * max_len);
        let mut attention_mask = Vec::with_capacity(batch * max_len);
        let mut token_type_ids = Vec::with_capacity(batch * max_len);

        for encoding in encodings {
            let ids = encoding.get_ids();
            let padding_needed = max_len - ids.len();

            input_ids.extend(ids.iter().map(|&id| id as i64));
            attention_mask.extend(encoding.get_attention_mask().iter().map(|&m| m as i64));
            token_type_ids.extend(encoding.get_type_ids().iter().map(|&t| t as i64));

            input_ids.extend(std::iter::repeat(0i64).take(padding_needed));
            attention_mask.extend(std::iter::repeat(0i64).take(padding_needed));
            token_type_ids.extend(std::iter::repeat(0i64).take(padding_needed));
        }

        Ok(BatchInputs {
            input_ids: Array2::from_shape_vec((batch, max_len), input_ids)
                .context("Failed to create batch input_ids array")?,
            attention_mask: Array2::from_shape_vec((batch, max_len), attention_mask)
                .context("Failed to create batch attention_mask array")?,
            token_type_ids: Array2::from_shape_vec((batch, max_len), token_type_ids)
                .context("Failed to create batch token_type_ids array")?,
        })
    }

    /// Counts tokens in a text string (including special tokens, after truncation)
    pub fn count_tokens(&self, text: &str) -> Result<usize> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        Ok(encoding.get_attention_mask().iter().map(|&m| m as usize).sum())
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl TextEmbedder for OnnxEmbeddingModel {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self.tokenize(texts)?;
        let inputs = Self::batch_inputs(&encodings)?;
        let attention_mask = inputs.attention_mask.clone();

        let mut session = lock_session(&self.session)?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Value::from_array(inputs.input_ids)?,
            "attention_mask" => Value::from_array(inputs.attention_mask)?,
            "token_type_ids" => Value::from_array(inputs.token_type_ids)?
        ])?;

        // Different exports name the output differently; take the first
        let output_array = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let shape = output_array.shape();
        if shape.len() != 3 || shape[0] != texts.len() || shape[2] != self.dimension {
            bail!(
                "Model outputs unexpected dimensions: {:?} (expected [{}, seq_len, {}])",
                shape,
                texts.len(),
                self.dimension
            );
        }

        let token_embeddings = output_array
            .into_dimensionality::<ndarray::Ix3>()
            .context("Output tensor is not 3-dimensional")?;

        let embeddings: Vec<Vec<f32>> = token_embeddings
            .axis_iter(Axis(0))
            .zip(attention_mask.axis_iter(Axis(0)))
            .map(|(item, mask)| {
                let mask: Vec<i64> = mask.to_vec();
                let mut pooled = mean_pool(item, &mask);
                l2_normalize(&mut pooled);
                pooled
            })
            .collect();

        debug!(
            "Encoded {} texts into {}-dimensional vectors",
            embeddings.len(),
            self.dimension
        );

        Ok(embeddings)
    }
}
