// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod embeddings;

pub use api::{create_app, start_server, AppState, EmbedRequest, EmbedResponse};
pub use config::{Backend, ServiceConfig};
pub use embeddings::{load_embedder, HashEmbedder, OnnxEmbeddingModel, TextEmbedder};
