use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::config::{ApiVersion, OpenAiCfg};
use crate::error::{CoreResult, EmbedError};
use crate::http_client::HttpClient;
use crate::model::{EmbedRequest, EmbedResponse, EmbeddingsResponse};
use crate::provider::EmbedProvider;
use crate::telemetry::CallContext;

#[derive(Debug, Clone)]
pub struct OpenAI {
    http: HttpClient,
    base: String,
    org: Option<String>,
    api_key: SecretString,
    api_version: ApiVersion,
    name: String,
}

impl OpenAI {
    pub fn new(http: HttpClient, api_key: SecretString, base: String, org: Option<String>) -> Self {
        Self {
            http,
            api_key,
            base: base.trim_end_matches('/').to_string(),
            org,
            api_version: ApiVersion::default(),
            name: "openai".into(),
        }
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_cfg(http: HttpClient, cfg: &OpenAiCfg) -> CoreResult<Self> {
        let key = std::env::var(&cfg.api_key_env).map_err(|_| {
            EmbedError::Validation(format!("environment variable {} is not set", cfg.api_key_env))
        })?;
        Ok(Self::new(http, SecretString::new(key.into()), cfg.base_url.clone(), cfg.organization.clone())
            .with_api_version(cfg.api_version))
    }

    /// `Legacy` hands back raw JSON mappings instead of typed objects.
    pub fn with_api_version(mut self, api_version: ApiVersion) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    #[cfg(test)]
    pub fn new_for_tests(server_base: &str) -> Self {
        OpenAI::new(
            HttpClient::new_default().unwrap(),
            SecretString::new("test-key".into()),
            server_base.to_string(),
            None,
        )
    }

    fn headers(&self) -> Vec<(String, String)> {
        let mut h = vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.api_key.expose_secret()),
            ),
            ("Content-Type".to_string(), "application/json".to_string()),
        ];
        if let Some(org) = &self.org {
            h.push(("OpenAI-Organization".into(), org.clone()));
        }
        h
    }
}

#[async_trait]
impl EmbedProvider for OpenAI {
    fn name(&self) -> &str {
        &self.name
    }

    fn base_url(&self) -> Option<&str> {
        Some(&self.base)
    }

    async fn embed(&self, _cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        let owned_headers = self.headers();
        let hdrs: Vec<(&str, &str)> = owned_headers
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let url = format!("{}/embeddings", self.base);

        let response = match self.api_version {
            ApiVersion::V1 => {
                let (resp, request_id) = self
                    .http
                    .post_json::<_, EmbedResponse>(&self.name, &url, &req, &hdrs)
                    .await?;
                tracing::debug!(provider = %self.name, request_id = ?request_id, "embeddings received");
                EmbeddingsResponse::Object(resp)
            }
            ApiVersion::Legacy => {
                let (resp, request_id) = self
                    .http
                    .post_json::<_, serde_json::Value>(&self.name, &url, &req, &hdrs)
                    .await?;
                tracing::debug!(provider = %self.name, request_id = ?request_id, "embeddings received");
                EmbeddingsResponse::Mapping(resp)
            }
        };
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::Method::POST;
    use httpmock::MockServer;
    use serde_json::json;

    fn embeddings_body() -> serde_json::Value {
        json!({
            "object": "list",
            "model": "text-embedding-3-small",
            "data": [
                {"object": "embedding", "index": 0, "embedding": [0.1, 0.2]},
                {"object": "embedding", "index": 1, "embedding": [0.3, 0.4]}
            ],
            "usage": {"prompt_tokens": 4, "total_tokens": 4}
        })
    }

    #[tokio::test]
    async fn embed_200_maps_typed_response() {
        let server = MockServer::start();
        let provider = OpenAI::new_for_tests(&server.base_url());

        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .header("Authorization", "Bearer test-key")
                .json_body(json!({"model": "text-embedding-3-small", "input": ["hello", "world"]}));
            then.status(200).json_body(embeddings_body());
        });

        let req = EmbedRequest::new("text-embedding-3-small", vec!["hello".to_string(), "world".to_string()]);
        let resp = provider.embed(&CallContext::new(), req).await.expect("embed ok");
        m.assert();
        match resp {
            EmbeddingsResponse::Object(r) => {
                assert_eq!(r.data.len(), 2);
                assert_eq!(r.usage.prompt_tokens, 4);
                assert_eq!(r.model, "text-embedding-3-small");
            }
            other => panic!("expected typed response, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn embed_200_accepts_base64_vectors() {
        use crate::model::{EmbeddingVector, EncodingFormat};
        use crate::telemetry::attributes::{normalize_response, vector_size};

        let server = MockServer::start();
        let provider = OpenAI::new_for_tests(&server.base_url());
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/embeddings")
                .json_body(json!({"model": "text-embedding-3-small", "input": "hi", "encoding_format": "base64"}));
            then.status(200).json_body(json!({
                "object": "list",
                "model": "text-embedding-3-small",
                "data": [{"object": "embedding", "index": 0, "embedding": "AACAPwAAAEA="}],
                "usage": {"prompt_tokens": 1, "total_tokens": 1}
            }));
        });

        let req = EmbedRequest::new("text-embedding-3-small", "hi").encoding_format(EncodingFormat::Base64);
        let resp = provider.embed(&CallContext::new(), req).await.expect("embed ok");
        m.assert();
        match &resp {
            EmbeddingsResponse::Object(r) => {
                assert_eq!(r.data[0].embedding, EmbeddingVector::Base64("AACAPwAAAEA=".into()));
            }
            other => panic!("expected typed response, got: {:?}", other),
        }
        assert_eq!(resp.dimensions(), vec![2]);
        assert_eq!(vector_size(&normalize_response(&resp)), 2);
    }

    #[tokio::test]
    async fn legacy_version_returns_mapping() {
        let server = MockServer::start();
        let provider = OpenAI::new_for_tests(&server.base_url()).with_api_version(ApiVersion::Legacy);
        let _m = server.mock(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(embeddings_body());
        });

        let resp = provider
            .embed(&CallContext::new(), EmbedRequest::new("text-embedding-3-small", "hi"))
            .await
            .unwrap();
        assert_eq!(resp, EmbeddingsResponse::Mapping(embeddings_body()));
        assert_eq!(resp.dimensions(), vec![2, 2]);
    }

    #[tokio::test]
    async fn organization_header_is_sent() {
        let server = MockServer::start();
        let provider = OpenAI::new(
            HttpClient::new_default().unwrap(),
            SecretString::new("k".into()),
            format!("{}/", server.base_url()),
            Some("org-1".into()),
        );
        assert_eq!(provider.base_url(), Some(server.base_url().as_str()));
        let m = server.mock(|when, then| {
            when.method(POST).path("/embeddings").header("OpenAI-Organization", "org-1");
            then.status(200).json_body(embeddings_body());
        });
        provider
            .embed(&CallContext::new(), EmbedRequest::new("m", "hi"))
            .await
            .unwrap();
        m.assert();
    }

    #[tokio::test]
    async fn embed_429_is_rate_limited() {
        let server = MockServer::start();
        let provider = OpenAI::new_for_tests(&server.base_url());
        let _m = server.mock(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(429).body("limit");
        });

        let err = provider
            .embed(&CallContext::new(), EmbedRequest::new("m", "hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmbedError::RateLimited { ref provider, .. } if provider == "openai"));
    }

    #[test]
    fn from_cfg_requires_key_env() {
        let cfg = OpenAiCfg {
            api_key_env: "EMBEDTEL_TEST_MISSING_KEY".into(),
            ..OpenAiCfg::default()
        };
        let err = OpenAI::from_cfg(HttpClient::new_default().unwrap(), &cfg).unwrap_err();
        assert!(matches!(err, EmbedError::Validation(ref m) if m.contains("EMBEDTEL_TEST_MISSING_KEY")));
    }
}
