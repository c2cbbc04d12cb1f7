// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! JSON body extractor whose rejections render as [`ApiError`]

use axum::extract::FromRequest;

use super::ApiError;

/// Like `axum::Json`, but malformed bodies become a 422 `ApiError` with a
/// JSON error body instead of axum's plain-text rejection.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);
