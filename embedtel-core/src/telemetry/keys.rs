/// Span/metric attribute keys for embeddings calls.
/// Keep these stable; changing them is a breaking change for dashboards.
pub const KEY_REQUEST_TYPE: &str = "llm.request.type";
pub const KEY_VENDOR: &str = "llm.vendor";
pub const KEY_REQUEST_MODEL: &str = "llm.request.model";
pub const KEY_ENCODING_FORMAT: &str = "llm.request.encoding_format";
pub const KEY_DIMENSIONS: &str = "llm.request.dimensions";
pub const KEY_USER: &str = "llm.user";
pub const KEY_API_BASE: &str = "llm.openai.api_base";
pub const KEY_PROMPTS: &str = "llm.prompts";

pub const KEY_RESPONSE_MODEL: &str = "llm.response.model";
pub const KEY_USAGE_PROMPT_TOKENS: &str = "llm.usage.prompt_tokens";
pub const KEY_USAGE_TOTAL_TOKENS: &str = "llm.usage.total_tokens";
pub const KEY_TOKEN_TYPE: &str = "llm.usage.token_type";

pub const KEY_SERVER_ADDRESS: &str = "server.address";
pub const KEY_ERROR_TYPE: &str = "error.type";

/// Span name for every embeddings call.
pub const SPAN_NAME: &str = "openai.embeddings";
/// Value of `llm.request.type` for embeddings.
pub const REQUEST_TYPE_EMBEDDING: &str = "embedding";
pub const VENDOR: &str = "OpenAI";

/// Usage keys that are counted as tokens; anything else in `usage` is skipped.
pub const USAGE_TOKEN_TYPES: [&str; 4] = [
    "prompt_tokens",
    "completion_tokens",
    "input_tokens",
    "output_tokens",
];

pub const METRIC_TOKENS: &str = "llm.openai.embeddings.tokens";
pub const METRIC_VECTOR_SIZE: &str = "llm.openai.embeddings.vector_size";
pub const METRIC_DURATION: &str = "llm.openai.embeddings.duration";

/// `llm.prompts.<index>.content`
pub fn prompt_content_key(index: usize) -> String {
    format!("{KEY_PROMPTS}.{index}.content")
}
