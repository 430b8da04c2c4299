//! Provider decorators that put the span and metric wrappers around every
//! `embed` call, and the instrumentor that composes them from config.

use std::sync::Arc;

use async_trait::async_trait;
use opentelemetry::global::BoxedTracer;

use crate::config::InstrumentationCfg;
use crate::error::CoreResult;
use crate::model::{EmbedRequest, EmbeddingsResponse};
use crate::provider::{BlockingEmbedProvider, EmbedProvider};
use crate::telemetry::{
    CallContext, EmbeddingsInstruments, EmbeddingsMeter, EmbeddingsTracer, OtelTracer, Tracer,
    global_instruments,
};

/// Opens an `openai.embeddings` span around each call of the inner provider.
#[derive(Debug, Clone)]
pub struct TracedEmbedder<P, T> {
    inner: P,
    tracer: EmbeddingsTracer<T>,
}

impl<P, T: Tracer> TracedEmbedder<P, T> {
    pub fn new(inner: P, tracer: EmbeddingsTracer<T>) -> Self {
        Self { inner, tracer }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P, T> EmbedProvider for TracedEmbedder<P, T>
where
    P: EmbedProvider,
    T: Tracer,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn base_url(&self) -> Option<&str> {
        self.inner.base_url()
    }

    async fn embed(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        self.tracer
            .call_async(cx, self.inner.base_url(), req, |req| self.inner.embed(cx, req))
            .await
    }
}

impl<P, T> BlockingEmbedProvider for TracedEmbedder<P, T>
where
    P: BlockingEmbedProvider,
    T: Tracer,
{
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn base_url(&self) -> Option<&str> {
        self.inner.base_url()
    }

    fn embed_blocking(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        self.tracer
            .call(cx, self.inner.base_url(), req, |req| self.inner.embed_blocking(cx, req))
    }
}

/// Records token, vector-size and duration measurements for each call.
#[derive(Debug, Clone)]
pub struct MeteredEmbedder<P> {
    inner: P,
    meter: EmbeddingsMeter,
}

impl<P> MeteredEmbedder<P> {
    pub fn new(inner: P, meter: EmbeddingsMeter) -> Self {
        Self { inner, meter }
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

#[async_trait]
impl<P: EmbedProvider> EmbedProvider for MeteredEmbedder<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn base_url(&self) -> Option<&str> {
        self.inner.base_url()
    }

    async fn embed(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        let server_address = self.inner.base_url().unwrap_or_default();
        self.meter
            .call_async(cx, server_address, req, |req| self.inner.embed(cx, req))
            .await
    }
}

impl<P: BlockingEmbedProvider> BlockingEmbedProvider for MeteredEmbedder<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn base_url(&self) -> Option<&str> {
        self.inner.base_url()
    }

    fn embed_blocking(&self, cx: &CallContext, req: EmbedRequest) -> CoreResult<EmbeddingsResponse> {
        let server_address = self.inner.base_url().unwrap_or_default();
        self.meter
            .call(cx, server_address, req, |req| self.inner.embed_blocking(cx, req))
    }
}

/// Wraps providers with whichever of tracing and metrics the config enables.
///
/// With both on, the span is the outer layer so its lifetime covers the
/// metered call.
pub struct EmbeddingsInstrumentor<T> {
    cfg: InstrumentationCfg,
    tracer: Arc<T>,
    instruments: EmbeddingsInstruments,
}

impl EmbeddingsInstrumentor<OtelTracer<BoxedTracer>> {
    /// Instrumentor backed by the globally installed OpenTelemetry providers.
    pub fn global(cfg: InstrumentationCfg) -> Self {
        let tracer = OtelTracer::global(cfg.tracer_name.clone());
        let instruments = global_instruments(&cfg.meter_name);
        Self::new(cfg, tracer, instruments)
    }
}

impl<T: Tracer + 'static> EmbeddingsInstrumentor<T> {
    pub fn new(cfg: InstrumentationCfg, tracer: T, instruments: EmbeddingsInstruments) -> Self {
        Self {
            cfg,
            tracer: Arc::new(tracer),
            instruments,
        }
    }

    pub fn config(&self) -> &InstrumentationCfg {
        &self.cfg
    }

    fn embeddings_tracer(&self) -> EmbeddingsTracer<Arc<T>> {
        EmbeddingsTracer::new(self.tracer.clone(), self.cfg.trace_content)
    }

    fn meter(&self) -> EmbeddingsMeter {
        EmbeddingsMeter::new(self.instruments.clone())
    }

    pub fn instrument<P: EmbedProvider + 'static>(&self, provider: P) -> Box<dyn EmbedProvider> {
        tracing::debug!(
            provider = provider.name(),
            tracing = self.cfg.enable_tracing,
            metrics = self.cfg.enable_metrics,
            "instrumenting embeddings provider"
        );
        match (self.cfg.enable_tracing, self.cfg.enable_metrics) {
            (true, true) => Box::new(TracedEmbedder::new(
                MeteredEmbedder::new(provider, self.meter()),
                self.embeddings_tracer(),
            )),
            (true, false) => Box::new(TracedEmbedder::new(provider, self.embeddings_tracer())),
            (false, true) => Box::new(MeteredEmbedder::new(provider, self.meter())),
            (false, false) => Box::new(provider),
        }
    }

    pub fn instrument_blocking<P: BlockingEmbedProvider + 'static>(
        &self,
        provider: P,
    ) -> Box<dyn BlockingEmbedProvider> {
        match (self.cfg.enable_tracing, self.cfg.enable_metrics) {
            (true, true) => Box::new(TracedEmbedder::new(
                MeteredEmbedder::new(provider, self.meter()),
                self.embeddings_tracer(),
            )),
            (true, false) => Box::new(TracedEmbedder::new(provider, self.embeddings_tracer())),
            (false, true) => Box::new(MeteredEmbedder::new(provider, self.meter())),
            (false, false) => Box::new(provider),
        }
    }
}
