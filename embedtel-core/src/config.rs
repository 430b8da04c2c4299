use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Environment variable consulted for the prompt-content privacy toggle.
pub const TRACE_CONTENT_ENV: &str = "TRACELOOP_TRACE_CONTENT";

fn default_true() -> bool {
    true
}
fn default_meter_name() -> String {
    "embedtel.openai".to_string()
}
fn default_tracer_name() -> String {
    "embedtel.openai".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct InstrumentationCfg {
    /// Record prompt contents on spans. Defaults to true.
    #[serde(default = "default_true")]
    pub trace_content: bool,
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
    #[serde(default = "default_meter_name")]
    pub meter_name: String,
    #[serde(default = "default_tracer_name")]
    pub tracer_name: String,
}

impl Default for InstrumentationCfg {
    fn default() -> Self {
        Self {
            trace_content: true,
            enable_metrics: true,
            enable_tracing: true,
            meter_name: default_meter_name(),
            tracer_name: default_tracer_name(),
        }
    }
}

impl InstrumentationCfg {
    /// Defaults, with `trace_content` taken from `TRACELOOP_TRACE_CONTENT`.
    pub fn from_env() -> Self {
        Self {
            trace_content: trace_content_from(std::env::var(TRACE_CONTENT_ENV).ok().as_deref()),
            ..Self::default()
        }
    }
}

/// Unset means enabled; otherwise only a case-insensitive "true" enables.
fn trace_content_from(raw: Option<&str>) -> bool {
    match raw {
        None => true,
        Some(v) => v.trim().eq_ignore_ascii_case("true"),
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// Client returns typed response objects.
    #[default]
    V1,
    /// Client returns plain JSON mappings.
    Legacy,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct OpenAiCfg {
    /// Name of the environment variable that contains the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub api_version: ApiVersion,
}

impl Default for OpenAiCfg {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            organization: None,
            api_version: ApiVersion::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpCfg {
    /// TCP connect timeout in milliseconds (default 5000ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds (default 60000ms)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional per-host idle connection pool cap (None = reqwest default)
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            pool_max_idle_per_host: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default)]
    pub instrumentation: InstrumentationCfg,
    #[serde(default)]
    pub openai: OpenAiCfg,
    /// HTTP client configuration (timeouts, pooling). Missing → defaults.
    #[serde(default)]
    pub http: HttpCfg,
}

impl Config {
    /// Load a Config from a file path (JSON or TOML by extension). If the
    /// extension is missing or unrecognized, try JSON first, then TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> crate::error::CoreResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(crate::error::EmbedError::from)?;
        let s =
            std::str::from_utf8(&bytes).map_err(|e| crate::error::EmbedError::Other(e.into()))?;
        let cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<Self>(s)
                .map_err(|e| crate::error::EmbedError::Other(e.into()))?,
            Some("toml") => toml::from_str::<Self>(s)
                .map_err(|e| crate::error::EmbedError::Other(e.into()))?,
            _ => serde_json::from_str::<Self>(s)
                .map_err(|e| crate::error::EmbedError::Other(e.into()))
                .or_else(|_| {
                    toml::from_str::<Self>(s)
                        .map_err(|e| crate::error::EmbedError::Other(e.into()))
                })?,
        };
        Ok(cfg)
    }
}
