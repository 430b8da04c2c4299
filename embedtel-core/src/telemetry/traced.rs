//! Span around one embeddings call, in blocking and async flavors.
//!
//! Both flavors share the same steps: passthrough when suppressed, otherwise
//! open a client span, attach request (and optionally prompt) attributes,
//! run the call, attach response attributes on success. The span is a
//! [`ScopedSpan`], so it ends on every exit path, including an `Err` from
//! the call, a panic, or the async future being dropped mid-flight.

use std::future::Future;

use opentelemetry::KeyValue;

use crate::model::{EmbedInput, EmbedRequest};
use crate::telemetry::attributes::{
    ResponseView, normalize_response, prompt_attributes, request_attributes, response_attributes,
};
use crate::telemetry::context::CallContext;
use crate::telemetry::keys::{KEY_REQUEST_TYPE, REQUEST_TYPE_EMBEDDING, SPAN_NAME, prompt_content_key};
use crate::telemetry::tracer::{ScopedSpan, SpanHandle, SpanKind, Tracer};

#[derive(Debug, Clone)]
pub struct EmbeddingsTracer<T> {
    tracer: T,
    trace_content: bool,
}

impl<T: Tracer> EmbeddingsTracer<T> {
    /// `trace_content` is the configured default for recording prompt
    /// contents; a [`CallContext`] override wins over it.
    pub fn new(tracer: T, trace_content: bool) -> Self {
        Self {
            tracer,
            trace_content,
        }
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    /// Blocking variant: runs `call` on the current thread.
    pub fn call<R, E, F>(
        &self,
        cx: &CallContext,
        api_base: Option<&str>,
        req: EmbedRequest,
        call: F,
    ) -> Result<R, E>
    where
        R: ResponseView,
        F: FnOnce(EmbedRequest) -> Result<R, E>,
    {
        if cx.is_suppressed() {
            return call(req);
        }

        let mut span = self.start(cx, api_base, &req);
        let response = call(req)?;
        set_response(&mut span, &response);
        Ok(response)
    }

    /// Async variant: the only suspension point is awaiting `call`.
    pub async fn call_async<R, E, F, Fut>(
        &self,
        cx: &CallContext,
        api_base: Option<&str>,
        req: EmbedRequest,
        call: F,
    ) -> Result<R, E>
    where
        R: ResponseView,
        F: FnOnce(EmbedRequest) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        if cx.is_suppressed() {
            return call(req).await;
        }

        let mut span = self.start(cx, api_base, &req);
        let response = call(req).await?;
        set_response(&mut span, &response);
        Ok(response)
    }

    fn start(
        &self,
        cx: &CallContext,
        api_base: Option<&str>,
        req: &EmbedRequest,
    ) -> ScopedSpan<T::Span> {
        let mut span = ScopedSpan::start(
            &self.tracer,
            SPAN_NAME,
            SpanKind::Client,
            vec![KeyValue::new(KEY_REQUEST_TYPE, REQUEST_TYPE_EMBEDDING)],
        );
        span.set_attributes(request_attributes(req, api_base));
        if cx.should_send_prompts(self.trace_content) {
            set_prompts(&mut span, &req.input);
        }
        span
    }
}

fn set_prompts<S: SpanHandle>(span: &mut ScopedSpan<S>, input: &EmbedInput) {
    if !span.is_recording() {
        return;
    }
    match prompt_attributes(input) {
        Ok(prompts) => {
            for (index, content) in prompts {
                span.set_attribute(KeyValue::new(prompt_content_key(index), content.to_string()));
            }
        }
        Err(err) => tracing::warn!(error = %err, "failed to set prompts for openai span"),
    }
}

fn set_response<S: SpanHandle, R: ResponseView>(span: &mut ScopedSpan<S>, response: &R) {
    let body = normalize_response(response);
    span.set_attributes(response_attributes(&body));
}
