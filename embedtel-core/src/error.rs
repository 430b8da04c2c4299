use std::borrow::Cow;

use thiserror::Error;

/// Core error type for embedtel.
/// Internally, modules can use `anyhow::Result<T>` for convenience,
/// but public boundaries should expose `CoreResult<T>` with this error.
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("rate limited by provider {provider}")]
    RateLimited {
        provider: String,
        retry_after: Option<u64>,
    },

    #[error("provider unavailable: {provider}")]
    ProviderUnavailable { provider: String },

    #[error("upstream error from {provider}: {code} {message}")]
    ProviderError {
        provider: String,
        code: String,
        message: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CoreResult<T> = std::result::Result<T, EmbedError>;

/// Kind name reported as `error.type` when a wrapped call fails.
///
/// Values land in metric attributes, so they must stay low-cardinality:
/// return a kind, never the message.
pub trait ErrorType {
    fn error_type(&self) -> Cow<'static, str>;
}

impl ErrorType for EmbedError {
    fn error_type(&self) -> Cow<'static, str> {
        let kind = match self {
            Self::Validation(_) => "Validation",
            Self::RateLimited { .. } => "RateLimited",
            Self::ProviderUnavailable { .. } => "ProviderUnavailable",
            Self::ProviderError { .. } => "ProviderError",
            Self::Io(_) => "Io",
            Self::Other(_) => "Other",
        };
        Cow::Borrowed(kind)
    }
}

impl ErrorType for std::io::Error {
    fn error_type(&self) -> Cow<'static, str> {
        Cow::Owned(format!("{:?}", self.kind()))
    }
}

impl ErrorType for anyhow::Error {
    fn error_type(&self) -> Cow<'static, str> {
        Cow::Borrowed("Error")
    }
}

/// Failure while deriving telemetry from a call. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported prompt input: {0}")]
    UnsupportedInput(&'static str),
}
