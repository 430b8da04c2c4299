use std::sync::Arc;

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::model::{EmbedInput, EmbedRequest, EmbedResponse, EmbedUsage, Embedding, EmbeddingsResponse};
use crate::telemetry::CallContext;

/// An embeddings endpoint. `cx` carries the suppression gate and content
/// override; providers that call other providers must pass it on.
#[async_trait]
pub trait EmbedProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Resolved API base, reported as `server.address` / `llm.openai.api_base`.
    fn base_url(&self) -> Option<&str> {
        None
    }

    async fn embed(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse>;
}

/// Blocking counterpart of [`EmbedProvider`].
pub trait BlockingEmbedProvider: Send + Sync {
    fn name(&self) -> &str;

    fn base_url(&self) -> Option<&str> {
        None
    }

    fn embed_blocking(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse>;
}

#[async_trait]
impl<P: EmbedProvider + ?Sized> EmbedProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn base_url(&self) -> Option<&str> {
        (**self).base_url()
    }

    async fn embed(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        (**self).embed(cx, req).await
    }
}

#[async_trait]
impl<P: EmbedProvider + ?Sized> EmbedProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn base_url(&self) -> Option<&str> {
        (**self).base_url()
    }

    async fn embed(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        (**self).embed(cx, req).await
    }
}

impl<P: BlockingEmbedProvider + ?Sized> BlockingEmbedProvider for Box<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn base_url(&self) -> Option<&str> {
        (**self).base_url()
    }

    fn embed_blocking(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        (**self).embed_blocking(cx, req)
    }
}

/// A dummy provider implementation that always returns canned responses.
/// Useful for tests or as a placeholder.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullProvider;

impl NullProvider {
    const DIMENSIONS: usize = 3;

    fn respond(req: EmbedRequest) -> EmbeddingsResponse {
        let n = req.input.len();
        let tokens = match &req.input {
            EmbedInput::Text(s) => s.split_whitespace().count(),
            EmbedInput::Batch(items) => items.iter().map(|s| s.split_whitespace().count()).sum(),
            EmbedInput::Tokens(t) => t.len(),
            EmbedInput::TokenBatch(batch) => batch.iter().map(Vec::len).sum(),
        } as u32;
        let data = (0..n)
            .map(|index| Embedding {
                index: index as u32,
                embedding: vec![0.0_f32; Self::DIMENSIONS].into(),
                object: "embedding".into(),
            })
            .collect();
        EmbeddingsResponse::Object(EmbedResponse {
            object: "list".into(),
            model: req.model,
            data,
            usage: EmbedUsage {
                prompt_tokens: tokens,
                total_tokens: tokens,
            },
        })
    }
}

#[async_trait]
impl EmbedProvider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }

    async fn embed(&self, _cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        Ok(Self::respond(req))
    }
}

impl BlockingEmbedProvider for NullProvider {
    fn name(&self) -> &str {
        "null"
    }

    fn embed_blocking(&self, _cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        Ok(Self::respond(req))
    }
}
