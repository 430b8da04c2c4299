//! The narrow span interface the wrappers depend on, with two backends:
//! OpenTelemetry (`OtelTracer`) and the `tracing` crate (`TracingTracer`).

use std::borrow::Cow;
use std::sync::Arc;

use opentelemetry::KeyValue;

pub use opentelemetry::trace::SpanKind;

/// One live span. Implementations must tolerate `set_attribute` after the
/// backend has stopped recording.
pub trait SpanHandle: Send {
    fn set_attribute(&mut self, attribute: KeyValue);
    fn is_recording(&self) -> bool;
    fn end(&mut self);
}

/// Span factory. Implementations must be thread-safe (`Send + Sync`).
pub trait Tracer: Send + Sync {
    type Span: SpanHandle;

    fn start_span(
        &self,
        name: &'static str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self::Span;
}

impl<T: Tracer + ?Sized> Tracer for Arc<T> {
    type Span = T::Span;

    fn start_span(
        &self,
        name: &'static str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self::Span {
        (**self).start_span(name, kind, attributes)
    }
}

/// A span that ends when the guard is dropped: on return, on `?`, on panic
/// unwind, and when an enclosing future is cancelled.
#[must_use = "the span ends as soon as the guard is dropped"]
pub struct ScopedSpan<S: SpanHandle> {
    span: S,
}

impl<S: SpanHandle> ScopedSpan<S> {
    pub fn start<T>(tracer: &T, name: &'static str, kind: SpanKind, attributes: Vec<KeyValue>) -> Self
    where
        T: Tracer<Span = S> + ?Sized,
    {
        Self {
            span: tracer.start_span(name, kind, attributes),
        }
    }

    pub fn set_attribute(&mut self, attribute: KeyValue) {
        self.span.set_attribute(attribute);
    }

    pub fn set_attributes(&mut self, attributes: impl IntoIterator<Item = KeyValue>) {
        for attribute in attributes {
            self.span.set_attribute(attribute);
        }
    }

    pub fn is_recording(&self) -> bool {
        self.span.is_recording()
    }
}

impl<S: SpanHandle> Drop for ScopedSpan<S> {
    fn drop(&mut self) {
        self.span.end();
    }
}

/// Adapter over any OpenTelemetry tracer.
#[derive(Debug, Clone)]
pub struct OtelTracer<T> {
    inner: T,
}

impl<T> OtelTracer<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

impl OtelTracer<opentelemetry::global::BoxedTracer> {
    /// Tracer from the globally installed provider.
    pub fn global(name: impl Into<Cow<'static, str>>) -> Self {
        Self::new(opentelemetry::global::tracer(name))
    }
}

#[derive(Debug)]
pub struct OtelSpan<S>(S);

impl<S> SpanHandle for OtelSpan<S>
where
    S: opentelemetry::trace::Span + Send,
{
    fn set_attribute(&mut self, attribute: KeyValue) {
        self.0.set_attribute(attribute);
    }

    fn is_recording(&self) -> bool {
        self.0.is_recording()
    }

    fn end(&mut self) {
        self.0.end();
    }
}

impl<T> Tracer for OtelTracer<T>
where
    T: opentelemetry::trace::Tracer + Send + Sync,
    T::Span: Send,
{
    type Span = OtelSpan<T::Span>;

    fn start_span(
        &self,
        name: &'static str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self::Span {
        let span = self
            .inner
            .span_builder(name)
            .with_kind(kind)
            .with_attributes(attributes)
            .start(&self.inner);
        OtelSpan(span)
    }
}

/// Bridges spans onto the `tracing` crate, for processes that log rather
/// than export. Keys known up front become span fields; any other key is
/// emitted as an `attribute` event inside the span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTracer;

#[derive(Debug)]
pub struct TracingSpan {
    span: tracing::Span,
}

fn kind_str(kind: &SpanKind) -> &'static str {
    match kind {
        SpanKind::Client => "client",
        SpanKind::Server => "server",
        SpanKind::Producer => "producer",
        SpanKind::Consumer => "consumer",
        SpanKind::Internal => "internal",
    }
}

impl Tracer for TracingTracer {
    type Span = TracingSpan;

    fn start_span(
        &self,
        name: &'static str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self::Span {
        let span = tracing::info_span!(
            "llm.call",
            otel.name = name,
            otel.kind = kind_str(&kind),
            llm.request.type = tracing::field::Empty,
            llm.vendor = tracing::field::Empty,
            llm.request.model = tracing::field::Empty,
            llm.request.encoding_format = tracing::field::Empty,
            llm.request.dimensions = tracing::field::Empty,
            llm.user = tracing::field::Empty,
            llm.openai.api_base = tracing::field::Empty,
            llm.response.model = tracing::field::Empty,
            llm.usage.prompt_tokens = tracing::field::Empty,
            llm.usage.total_tokens = tracing::field::Empty,
        );
        let mut handle = TracingSpan { span };
        for attribute in attributes {
            handle.set_attribute(attribute);
        }
        handle
    }
}

impl SpanHandle for TracingSpan {
    fn set_attribute(&mut self, attribute: KeyValue) {
        let key = attribute.key.as_str();
        if !self.span.has_field(key) {
            tracing::debug!(
                parent: &self.span,
                attribute.key = key,
                attribute.value = %attribute.value,
                "attribute"
            );
            return;
        }
        match &attribute.value {
            opentelemetry::Value::Bool(b) => self.span.record(key, *b),
            opentelemetry::Value::I64(n) => self.span.record(key, *n),
            opentelemetry::Value::F64(f) => self.span.record(key, *f),
            other => self.span.record(key, other.as_str().as_ref()),
        };
    }

    fn is_recording(&self) -> bool {
        !self.span.is_disabled()
    }

    fn end(&mut self) {
        // the span closes once its last handle is gone
        drop(std::mem::replace(&mut self.span, tracing::Span::none()));
    }
}
