//! Common types and utilities for the control-plane API

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Page size requested when listing resources
pub const DEFAULT_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub code: Option<String>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: code={code:?}, errors={errors:?}")]
pub struct ApiErrorDetails {
    pub code: Option<String>,
    pub errors: Option<Vec<String>>,
}

/// Whether a service error code means the addressed object does not exist
pub fn is_not_found_code(code: &str) -> bool {
    code == "ResourceNotFoundException" || code.ends_with(".NotFound") || code.ends_with("NotFound")
}

/// Key/value tag as used by the EC2 API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

pub fn tags_to_map(tags: &[Tag]) -> BTreeMap<String, String> {
    tags.iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn add_optional<K: Into<String>, V: ToString>(mut self, key: K, value: Option<V>) -> Self {
        if let Some(v) = value {
            self.params.push((key.into(), v.to_string()));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Token-based pagination for list calls
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub max_results: Option<u32>,
    pub next_token: Option<String>,
}

impl PageRequest {
    pub fn new() -> Self {
        Self {
            max_results: Some(DEFAULT_PAGE_SIZE),
            next_token: None,
        }
    }

    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    pub fn to_query_params(&self) -> ApiQueryParams {
        ApiQueryParams::new()
            .add_optional("max_results", self.max_results)
            .add_optional("next_token", self.next_token.as_ref())
    }
}
