// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Hash backend tests
//!
//! The hash backend is what tests and model-less deployments run on, so it
//! has to honour the same output contract as the ONNX model.

use clap::Parser;
use embeddings_service::{
    config::ServiceConfig,
    embeddings::{load_embedder, HashEmbedder, TextEmbedder},
};

fn norm(vector: &[f32]) -> f32 {
    vector.iter().map(|x| x * x).sum::<f32>().sqrt()
}

#[test]
fn test_output_contract() {
    let embedder = HashEmbedder::new(384).unwrap();
    let texts: Vec<String> = vec!["hello world".into(), "".into(), "hello world".into()];

    let vectors = embedder.encode(&texts).unwrap();

    assert_eq!(vectors.len(), texts.len());
    for vector in &vectors {
        assert_eq!(vector.len(), 384);
        assert!((norm(vector) - 1.0).abs() < 1e-5);
    }
    assert_eq!(vectors[0], vectors[2]);
}

#[test]
fn test_embed_matches_batch_encode() {
    let embedder = HashEmbedder::new(32).unwrap();
    let texts: Vec<String> = vec!["one".into(), "two".into()];

    let batch = embedder.encode(&texts).unwrap();

    assert_eq!(batch[0], embedder.embed("one").unwrap());
    assert_eq!(batch[1], embedder.embed("two").unwrap());
}

#[tokio::test]
async fn test_load_embedder_respects_dimension() {
    let config = ServiceConfig::try_parse_from([
        "embeddings-service",
        "--backend",
        "hash",
        "--dimension",
        "16",
    ])
    .unwrap();

    let embedder = load_embedder(&config).await.unwrap();

    assert_eq!(embedder.dimension(), 16);
    assert_eq!(embedder.embed("x").unwrap().len(), 16);
}
