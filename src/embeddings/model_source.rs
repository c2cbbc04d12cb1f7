// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Model file resolution
//!
//! The ONNX model and its tokenizer either live at explicit local paths or
//! are fetched from the Hugging Face Hub. Hub downloads land in the shared
//! HF cache, so a warm cache means no network access at startup.

use anyhow::{bail, Context, Result};
use hf_hub::api::sync::ApiBuilder;
use hf_hub::{Repo, RepoType};
use std::path::PathBuf;
use tracing::info;

/// Where to find the model files
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    Local {
        model_path: PathBuf,
        tokenizer_path: PathBuf,
    },
    Hub {
        repo_id: String,
        revision: String,
        model_file: String,
        tokenizer_file: String,
    },
}

/// Resolved on-disk model files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelFiles {
    pub model_path: PathBuf,
    pub tokenizer_path: PathBuf,
}

impl ModelSource {
    /// Returns local paths for the model and tokenizer, downloading them if
    /// needed. Blocking.
    pub fn resolve(&self) -> Result<ModelFiles> {
        match self {
            ModelSource::Local {
                model_path,
                tokenizer_path,
            } => {
                if !model_path.exists() {
                    bail!("ONNX model file not found: {}", model_path.display());
                }
                if !tokenizer_path.exists() {
                    bail!("Tokenizer file not found: {}", tokenizer_path.display());
                }

                Ok(ModelFiles {
                    model_path: model_path.clone(),
                    tokenizer_path: tokenizer_path.clone(),
                })
            }
            ModelSource::Hub {
                repo_id,
                revision,
                model_file,
                tokenizer_file,
            } => {
                info!("Fetching {}@{} from Hugging Face Hub", repo_id, revision);

                let api = ApiBuilder::new()
                    .with_progress(false)
                    .build()
                    .context("Failed to create Hugging Face Hub client")?;
                let repo = api.repo(Repo::with_revision(
                    repo_id.clone(),
                    RepoType::Model,
                    revision.clone(),
                ));

                let model_path = repo
                    .get(model_file)
                    .with_context(|| format!("Failed to fetch {} from {}", model_file, repo_id))?;
                let tokenizer_path = repo.get(tokenizer_file).with_context(|| {
                    format!("Failed to fetch {} from {}", tokenizer_file, repo_id)
                })?;

                info!("Model file: {}", model_path.display());
                info!("Tokenizer file: {}", tokenizer_path.display());

                Ok(ModelFiles {
                    model_path,
                    tokenizer_path,
                })
            }
        }
    }
}
