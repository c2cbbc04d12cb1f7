// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Error Handling Tests for the Embedding API
//!
//! This module tests the error paths of POST /embed:
//! - Malformed bodies are rejected with 422 before the model is called
//! - Model failures surface as 500 with a JSON error body
//! - A failing batch returns no partial results

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
};
use embeddings_service::api::{create_app, AppState, ErrorResponse};
use embeddings_service::embeddings::TextEmbedder;
use mockall::mock;
use std::sync::Arc;
use tower::ServiceExt; // for `oneshot`

mock! {
    pub Embedder {}

    impl TextEmbedder for Embedder {
        fn dimension(&self) -> usize;
        fn encode(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
    }
}

/// Test helper: a mock that must never be asked to encode
fn untouched_embedder() -> MockEmbedder {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(384usize);
    embedder.expect_encode().never();
    embedder
}

async fn send(embedder: MockEmbedder, request: Request<Body>) -> Response {
    let app = create_app(AppState::new(Arc::new(embedder)));
    app.oneshot(request).await.unwrap()
}

async fn error_body(response: Response) -> ErrorResponse {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "Response is not an ErrorResponse ({}): {}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    })
}

fn json_request(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

//
// ERROR TEST 1: Malformed requests (422, model untouched)
//

#[tokio::test]
async fn test_missing_texts_field() {
    let response = send(untouched_embedder(), json_request(r#"{}"#)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = error_body(response).await;
    assert_eq!(body.error_type, "validation_error");
    assert!(body.message.contains("texts"), "message: {}", body.message);
}

#[tokio::test]
async fn test_texts_not_a_list() {
    let response = send(untouched_embedder(), json_request(r#"{"texts": "hello"}"#)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_body(response).await.error_type, "validation_error");
}

#[tokio::test]
async fn test_texts_contains_non_strings() {
    let response = send(untouched_embedder(), json_request(r#"{"texts": ["ok", 42]}"#)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_texts_null() {
    let response = send(untouched_embedder(), json_request(r#"{"texts": null}"#)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_json_syntax() {
    let response = send(untouched_embedder(), json_request(r#"{"texts": ["#)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_body(response).await.error_type, "invalid_request");
}

#[tokio::test]
async fn test_missing_content_type() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/embed")
        .body(Body::from(r#"{"texts": ["hello"]}"#))
        .unwrap();

    let response = send(untouched_embedder(), request).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_body(response).await.error_type, "invalid_request");
}

//
// ERROR TEST 2: Inference failures (500)
//

#[tokio::test]
async fn test_inference_failure_returns_500() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(384usize);
    embedder
        .expect_encode()
        .times(1)
        .returning(|_| Err(anyhow::anyhow!("ONNX Runtime: out of memory")));

    let response = send(embedder, json_request(r#"{"texts": ["a", "b"]}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body.error_type, "internal_error");
    assert!(body.message.contains("out of memory"));
}

#[tokio::test]
async fn test_panicking_model_returns_500() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(384usize);
    embedder
        .expect_encode()
        .times(1)
        .returning(|_| panic!("inference worker crashed"));

    let response = send(embedder, json_request(r#"{"texts": ["a", "b"]}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = error_body(response).await;
    assert_eq!(body.error_type, "internal_error");
    assert!(body.message.contains("Embedding task failed"), "message: {}", body.message);
}

#[tokio::test]
async fn test_wrong_vector_count_returns_500() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(3usize);
    embedder
        .expect_encode()
        .times(1)
        .returning(|_| Ok(vec![vec![1.0, 0.0, 0.0]]));

    let response = send(embedder, json_request(r#"{"texts": ["a", "b"]}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_wrong_dimension_returns_500() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(384usize);
    embedder
        .expect_encode()
        .times(1)
        .returning(|texts| Ok(vec![vec![1.0, 0.0]; texts.len()]));

    let response = send(embedder, json_request(r#"{"texts": ["a"]}"#)).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

//
// ERROR TEST 3: Whole batch goes to the model in one call
//

#[tokio::test]
async fn test_single_model_call_per_request() {
    let mut embedder = MockEmbedder::new();
    embedder.expect_dimension().return_const(2usize);
    embedder
        .expect_encode()
        .withf(|texts: &[String]| texts == ["x", "y", "z"])
        .times(1)
        .returning(|texts| Ok(vec![vec![1.0, 0.0]; texts.len()]));

    let response = send(embedder, json_request(r#"{"texts": ["x", "y", "z"]}"#)).await;

    assert_eq!(response.status(), StatusCode::OK);
}
