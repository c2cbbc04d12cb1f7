// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Sentence pooling over token embeddings

use ndarray::ArrayView2;

/// Norms below this are treated as zero when normalizing
const NORM_EPSILON: f32 = 1e-12;

/// Mean pooling over `[seq_len, hidden_dim]` token embeddings.
///
/// Only positions whose attention mask is non-zero contribute, so padding
/// tokens never affect the sentence vector.
pub fn mean_pool(token_embeddings: ArrayView2<f32>, attention_mask: &[i64]) -> Vec<f32> {
    let seq_len = token_embeddings.shape()[0];
    let hidden_dim = token_embeddings.shape()[1];

    let mut pooled = vec![0.0f32; hidden_dim];
    let mut sum_mask = 0.0f32;

    for (i, row) in token_embeddings.outer_iter().enumerate().take(seq_len) {
        let mask_value = attention_mask.get(i).copied().unwrap_or(0) as f32;
        if mask_value == 0.0 {
            continue;
        }
        sum_mask += mask_value;
        for (acc, value) in pooled.iter_mut().zip(row.iter()) {
            *acc += value * mask_value;
        }
    }

    let denom = sum_mask.max(1e-9);
    for value in &mut pooled {
        *value /= denom;
    }

    pooled
}

/// Scales `vector` in place to unit Euclidean length.
///
/// A zero vector is left unchanged.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > NORM_EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
