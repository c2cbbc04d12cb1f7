// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration
//!
//! Every setting can be given as a command-line flag or an `EMBED_*`
//! environment variable (a `.env` file is loaded first by `main`).

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::embeddings::{
    ModelSource, DEFAULT_DIMENSION, DEFAULT_MAX_LENGTH, DEFAULT_MODEL_FILE, DEFAULT_MODEL_NAME,
    DEFAULT_MODEL_REPO, DEFAULT_TOKENIZER_FILE,
};

/// Which embedding implementation backs the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// ONNX Runtime sentence transformer
    Onnx,
    /// Deterministic hash-based vectors, no model files needed
    Hash,
}

/// Embeddings service configuration
#[derive(Parser, Debug, Clone)]
#[command(name = "embeddings-service")]
#[command(about = "HTTP endpoint returning normalized sentence embeddings", long_about = None)]
pub struct ServiceConfig {
    /// Address the HTTP listener binds to
    #[arg(long, env = "EMBED_LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: String,

    /// Embedding backend
    #[arg(long, env = "EMBED_BACKEND", value_enum, default_value_t = Backend::Onnx)]
    pub backend: Backend,

    /// Model name reported in logs
    #[arg(long, env = "EMBED_MODEL_NAME", default_value = DEFAULT_MODEL_NAME)]
    pub model_name: String,

    /// Hugging Face Hub repository to fetch the model from
    #[arg(long, env = "EMBED_MODEL_REPO", default_value = DEFAULT_MODEL_REPO)]
    pub model_repo: String,

    /// Hub revision (branch, tag or commit)
    #[arg(long, env = "EMBED_MODEL_REVISION", default_value = "main")]
    pub model_revision: String,

    /// Local ONNX model file (skips the hub when set together with --tokenizer-path)
    #[arg(long, env = "EMBED_MODEL_PATH")]
    pub model_path: Option<PathBuf>,

    /// Local tokenizer.json
    #[arg(long, env = "EMBED_TOKENIZER_PATH")]
    pub tokenizer_path: Option<PathBuf>,

    /// Expected embedding dimension
    #[arg(long, env = "EMBED_DIMENSION", default_value_t = DEFAULT_DIMENSION)]
    pub dimension: usize,

    /// Tokenizer truncation length in tokens
    #[arg(long, env = "EMBED_MAX_LENGTH", default_value_t = DEFAULT_MAX_LENGTH)]
    pub max_length: usize,

    /// ONNX Runtime intra-op thread count
    #[arg(long, env = "EMBED_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,
}

impl ServiceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;

        if self.dimension == 0 {
            bail!("Embedding dimension must be greater than 0");
        }
        if self.max_length == 0 {
            bail!("Max length must be greater than 0");
        }
        if self.intra_threads == 0 {
            bail!("Intra-op thread count must be greater than 0");
        }
        if self.model_path.is_some() != self.tokenizer_path.is_some() {
            bail!("--model-path and --tokenizer-path must be given together");
        }
        if self.model_path.is_none() && self.model_repo.trim().is_empty() {
            bail!("Model repository cannot be empty");
        }

        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address: {}", self.listen_addr))
    }

    /// Where the ONNX model and tokenizer come from
    pub fn model_source(&self) -> ModelSource {
        match (&self.model_path, &self.tokenizer_path) {
            (Some(model_path), Some(tokenizer_path)) => ModelSource::Local {
                model_path: model_path.clone(),
                tokenizer_path: tokenizer_path.clone(),
            },
            _ => ModelSource::Hub {
                repo_id: self.model_repo.clone(),
                revision: self.model_revision.clone(),
                model_file: DEFAULT_MODEL_FILE.to_string(),
                tokenizer_file: DEFAULT_TOKENIZER_FILE.to_string(),
            },
        }
    }
}
