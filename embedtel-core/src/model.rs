use serde::{Deserialize, Serialize};

/// Input accepted by the embeddings endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EmbedInput {
    Text(String),
    Batch(Vec<String>),
    Tokens(Vec<u32>),
    TokenBatch(Vec<Vec<u32>>),
}

impl EmbedInput {
    /// Number of embedding results a provider is expected to return.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(_) | Self::Tokens(_) => 1,
            Self::Batch(v) => v.len(),
            Self::TokenBatch(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Batch(v) => v.is_empty(),
            Self::Tokens(v) => v.is_empty(),
            Self::TokenBatch(v) => v.is_empty(),
        }
    }
}

impl From<&str> for EmbedInput {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for EmbedInput {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<Vec<String>> for EmbedInput {
    fn from(v: Vec<String>) -> Self {
        Self::Batch(v)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EncodingFormat {
    Float,
    Base64,
}

impl EncodingFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Base64 => "base64",
        }
    }
}

/// Arguments of one embeddings call, as sent on the wire.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmbedRequest {
    pub model: String,
    pub input: EmbedInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding_format: Option<EncodingFormat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl EmbedRequest {
    pub fn new(model: impl Into<String>, input: impl Into<EmbedInput>) -> Self {
        Self {
            model: model.into(),
            input: input.into(),
            encoding_format: None,
            dimensions: None,
            user: None,
        }
    }

    pub fn encoding_format(mut self, format: EncodingFormat) -> Self {
        self.encoding_format = Some(format);
        self
    }

    pub fn dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// One embedding as returned on the wire: a float array, or a base64 string
/// when the request asked for `encoding_format = "base64"`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum EmbeddingVector {
    Float(Vec<f32>),
    /// Little-endian f32s, base64 encoded.
    Base64(String),
}

impl EmbeddingVector {
    /// Number of elements; for base64 this is decoded bytes / 4.
    pub fn len(&self) -> usize {
        match self {
            Self::Float(v) => v.len(),
            Self::Base64(s) => base64_decoded_len(s) / std::mem::size_of::<f32>(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lenient read from an untyped mapping. Array elements that are not
    /// numbers still count towards the length; they become NaN.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Array(items) => Some(Self::Float(
                items
                    .iter()
                    .map(|v| v.as_f64().unwrap_or(f64::NAN) as f32)
                    .collect(),
            )),
            serde_json::Value::String(s) => Some(Self::Base64(s.clone())),
            _ => None,
        }
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(v: Vec<f32>) -> Self {
        Self::Float(v)
    }
}

fn base64_decoded_len(encoded: &str) -> usize {
    let unpadded = encoded.trim_end().trim_end_matches('=');
    unpadded.len() * 3 / 4
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Embedding {
    pub index: u32,
    pub embedding: EmbeddingVector,
    #[serde(default = "embedding_object")]
    pub object: String,
}

fn embedding_object() -> String {
    "embedding".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmbedUsage {
    pub prompt_tokens: u32,
    pub total_tokens: u32,
}

/// Typed embeddings response, as produced by the v1 client.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EmbedResponse {
    #[serde(default = "list_object")]
    pub object: String,
    pub model: String,
    pub data: Vec<Embedding>,
    #[serde(default)]
    pub usage: EmbedUsage,
}

fn list_object() -> String {
    "list".to_string()
}

impl EmbedResponse {
    pub fn vectors(&self) -> impl Iterator<Item = &EmbeddingVector> {
        self.data.iter().map(|d| &d.embedding)
    }
}

/// What a provider hands back: the typed object (v1 clients) or the raw JSON
/// mapping (legacy clients).
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingsResponse {
    Object(EmbedResponse),
    Mapping(serde_json::Value),
}

impl EmbeddingsResponse {
    /// Vector lengths of every result, in response order.
    pub fn dimensions(&self) -> Vec<usize> {
        match self {
            Self::Object(resp) => resp.vectors().map(EmbeddingVector::len).collect(),
            Self::Mapping(value) => value
                .get("data")
                .and_then(|d| d.as_array())
                .map(|items| {
                    items
                        .iter()
                        .map(|item| {
                            item.get("embedding")
                                .and_then(EmbeddingVector::from_json)
                                .map_or(0, |v| v.len())
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}
