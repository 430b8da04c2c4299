//! Read-only extraction of telemetry attributes from embeddings requests and
//! responses. Nothing in here fails a call: absent data is omitted, and the
//! only fallible step (prompt contents) returns a `Result` for the caller to log.

use std::collections::BTreeMap;

use opentelemetry::KeyValue;
use serde::Serialize;
use serde_json::Value;

use crate::error::ExtractError;
pub use crate::model::EmbeddingVector;
use crate::model::{EmbedInput, EmbedRequest, EmbedResponse, EmbeddingsResponse};
use crate::telemetry::keys::*;

/// Canonical record every response shape is normalized into.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub usage: BTreeMap<String, u64>,
    pub data: Vec<EmbeddingItem>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EmbeddingItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<EmbeddingVector>,
}

/// The two response shapes an embeddings client may hand back.
#[derive(Debug, Clone, Copy)]
pub enum ResponseShape<'a> {
    /// Typed object that has to be converted to a mapping first.
    Object(&'a EmbedResponse),
    /// Already a mapping; used as-is.
    Mapping(&'a Value),
}

/// Implemented by every type a wrapped call may return.
pub trait ResponseView {
    fn shape(&self) -> ResponseShape<'_>;
}

impl ResponseView for EmbedResponse {
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Object(self)
    }
}

impl ResponseView for Value {
    fn shape(&self) -> ResponseShape<'_> {
        ResponseShape::Mapping(self)
    }
}

impl ResponseView for EmbeddingsResponse {
    fn shape(&self) -> ResponseShape<'_> {
        match self {
            Self::Object(resp) => ResponseShape::Object(resp),
            Self::Mapping(value) => ResponseShape::Mapping(value),
        }
    }
}

impl<T: ResponseView + ?Sized> ResponseView for &T {
    fn shape(&self) -> ResponseShape<'_> {
        (**self).shape()
    }
}

pub fn normalize_response<R: ResponseView + ?Sized>(response: &R) -> ResponseBody {
    match response.shape() {
        ResponseShape::Object(resp) => from_object(resp),
        ResponseShape::Mapping(value) => from_mapping(value),
    }
}

fn from_object(resp: &EmbedResponse) -> ResponseBody {
    let mut usage = BTreeMap::new();
    usage.insert("prompt_tokens".to_string(), u64::from(resp.usage.prompt_tokens));
    usage.insert("total_tokens".to_string(), u64::from(resp.usage.total_tokens));
    ResponseBody {
        model: non_empty(&resp.model),
        usage,
        data: resp
            .data
            .iter()
            .map(|d| EmbeddingItem {
                embedding: Some(d.embedding.clone()),
            })
            .collect(),
    }
}

fn from_mapping(value: &Value) -> ResponseBody {
    let model = value.get("model").and_then(Value::as_str).and_then(non_empty);
    let usage = value
        .get("usage")
        .and_then(Value::as_object)
        .map(|u| {
            u.iter()
                .filter_map(|(k, v)| v.as_u64().map(|n| (k.clone(), n)))
                .collect()
        })
        .unwrap_or_default();
    let data = value
        .get("data")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| EmbeddingItem {
                    embedding: item.get("embedding").and_then(EmbeddingVector::from_json),
                })
                .collect()
        })
        .unwrap_or_default();
    ResponseBody { model, usage, data }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Request attributes set on the span before the call. `api_base` is the
/// resolved client base URL, when the client knows one.
pub fn request_attributes(req: &EmbedRequest, api_base: Option<&str>) -> Vec<KeyValue> {
    let mut attrs = vec![KeyValue::new(KEY_VENDOR, VENDOR)];
    if !req.model.is_empty() {
        attrs.push(KeyValue::new(KEY_REQUEST_MODEL, req.model.clone()));
    }
    if let Some(format) = req.encoding_format {
        attrs.push(KeyValue::new(KEY_ENCODING_FORMAT, format.as_str()));
    }
    if let Some(dimensions) = req.dimensions {
        attrs.push(KeyValue::new(KEY_DIMENSIONS, i64::from(dimensions)));
    }
    if let Some(user) = req.user.as_deref().filter(|u| !u.is_empty()) {
        attrs.push(KeyValue::new(KEY_USER, user.to_string()));
    }
    if let Some(base) = api_base.filter(|b| !b.is_empty()) {
        attrs.push(KeyValue::new(KEY_API_BASE, base.to_string()));
    }
    attrs
}

/// Indexed prompt contents. Only text inputs can be recorded; token-id
/// inputs are rejected so the caller can log and move on.
pub fn prompt_attributes(input: &EmbedInput) -> Result<Vec<(usize, &str)>, ExtractError> {
    match input {
        EmbedInput::Text(s) if s.is_empty() => Ok(Vec::new()),
        EmbedInput::Text(s) => Ok(vec![(0, s.as_str())]),
        EmbedInput::Batch(items) => Ok(items
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.as_str()))
            .collect()),
        EmbedInput::Tokens(t) if t.is_empty() => Ok(Vec::new()),
        EmbedInput::TokenBatch(t) if t.is_empty() => Ok(Vec::new()),
        EmbedInput::Tokens(_) => Err(ExtractError::UnsupportedInput("token ids")),
        EmbedInput::TokenBatch(_) => Err(ExtractError::UnsupportedInput("batched token ids")),
    }
}

/// Attributes set on the span after a successful call.
pub fn response_attributes(body: &ResponseBody) -> Vec<KeyValue> {
    let mut attrs = Vec::with_capacity(3);
    if let Some(model) = &body.model {
        attrs.push(KeyValue::new(KEY_RESPONSE_MODEL, model.clone()));
    }
    if let Some(prompt) = body.usage.get("prompt_tokens") {
        attrs.push(KeyValue::new(KEY_USAGE_PROMPT_TOKENS, to_i64(*prompt)));
    }
    if let Some(total) = body.usage.get("total_tokens") {
        attrs.push(KeyValue::new(KEY_USAGE_TOTAL_TOKENS, to_i64(*total)));
    }
    attrs
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

/// `(token type, count)` for every allow-listed usage entry; `prompt_tokens`
/// yields token type `prompt`.
pub fn usage_attributes(body: &ResponseBody) -> Vec<(&str, u64)> {
    body.usage
        .iter()
        .filter(|(k, _)| USAGE_TOKEN_TYPES.contains(&k.as_str()))
        .map(|(k, v)| (k.split('_').next().unwrap_or(k.as_str()), *v))
        .collect()
}

/// Length of the first embedding vector; 0 when there is none.
pub fn vector_size(body: &ResponseBody) -> usize {
    body.data
        .first()
        .and_then(|item| item.embedding.as_ref())
        .map_or(0, EmbeddingVector::len)
}
