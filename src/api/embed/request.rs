// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! EmbedRequest type for POST /embed

use serde::{Deserialize, Serialize};

/// Request body for POST /embed
///
/// `texts` is required. It may be empty and may contain empty strings;
/// no count or length limit is enforced here. Unknown fields are ignored.
///
/// # Example
/// ```json
/// {
///   "texts": ["Hello world", "Another text"]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
}

impl EmbedRequest {
    pub fn new<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            texts: texts.into_iter().map(Into::into).collect(),
        }
    }
}
