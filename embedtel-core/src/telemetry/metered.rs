//! Token, vector-size and duration measurements around one embeddings call.
//!
//! Every non-suppressed call produces exactly one measurement set. Success
//! tags carry `llm.response.model` / `server.address` (plus the token type on
//! token counts); failure tags carry `error.type` / `server.address`.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use opentelemetry::KeyValue;

use crate::error::ErrorType;
use crate::model::EmbedRequest;
use crate::telemetry::attributes::{ResponseBody, ResponseView, normalize_response, usage_attributes, vector_size};
use crate::telemetry::context::CallContext;
use crate::telemetry::instruments::EmbeddingsInstruments;
use crate::telemetry::keys::{KEY_ERROR_TYPE, KEY_RESPONSE_MODEL, KEY_SERVER_ADDRESS, KEY_TOKEN_TYPE};

/// Time source for call durations.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[derive(Clone)]
pub struct EmbeddingsMeter {
    instruments: EmbeddingsInstruments,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for EmbeddingsMeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingsMeter").finish_non_exhaustive()
    }
}

impl EmbeddingsMeter {
    pub fn new(instruments: EmbeddingsInstruments) -> Self {
        Self {
            instruments,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Blocking variant. `server_address` is the client's resolved base URL.
    pub fn call<R, E, F>(
        &self,
        cx: &CallContext,
        server_address: &str,
        req: EmbedRequest,
        call: F,
    ) -> Result<R, E>
    where
        R: ResponseView,
        E: ErrorType,
        F: FnOnce(EmbedRequest) -> Result<R, E>,
    {
        if cx.is_suppressed() {
            return call(req);
        }

        let start = self.clock.now();
        let result = call(req);
        let end = self.clock.now();
        self.observe(&result, server_address, start, end);
        result
    }

    /// Async variant; same timing discipline, the await is the only suspension.
    pub async fn call_async<R, E, F, Fut>(
        &self,
        cx: &CallContext,
        server_address: &str,
        req: EmbedRequest,
        call: F,
    ) -> Result<R, E>
    where
        R: ResponseView,
        E: ErrorType,
        F: FnOnce(EmbedRequest) -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        if cx.is_suppressed() {
            return call(req).await;
        }

        let start = self.clock.now();
        let result = call(req).await;
        let end = self.clock.now();
        self.observe(&result, server_address, start, end);
        result
    }

    fn observe<R: ResponseView, E: ErrorType>(
        &self,
        result: &Result<R, E>,
        server_address: &str,
        start: Instant,
        end: Instant,
    ) {
        let duration = end.saturating_duration_since(start).as_secs_f64();
        match result {
            Ok(response) => {
                self.record_success(&normalize_response(response), server_address, duration)
            }
            Err(err) => self.record_failure(err, server_address, duration),
        }
    }

    fn record_failure<E: ErrorType>(&self, err: &E, server_address: &str, duration: f64) {
        let attributes = [
            KeyValue::new(KEY_ERROR_TYPE, err.error_type().into_owned()),
            KeyValue::new(KEY_SERVER_ADDRESS, server_address.to_string()),
        ];
        self.instruments.tokens.add(1, &attributes);
        self.instruments.vector_size.add(1, &attributes);
        // a zero duration means the call never got timed; leave the histogram alone
        if duration > 0.0 {
            self.instruments.duration.record(duration, &attributes);
        }
        tracing::debug!(error_type = %err.error_type(), duration, "embeddings call failed");
    }

    fn record_success(&self, body: &ResponseBody, server_address: &str, duration: f64) {
        let mut shared = Vec::with_capacity(3);
        if let Some(model) = &body.model {
            shared.push(KeyValue::new(KEY_RESPONSE_MODEL, model.clone()));
        }
        shared.push(KeyValue::new(KEY_SERVER_ADDRESS, server_address.to_string()));

        for (token_type, count) in usage_attributes(body) {
            let mut attributes = shared.clone();
            attributes.push(KeyValue::new(KEY_TOKEN_TYPE, token_type.to_string()));
            self.instruments.tokens.add(count, &attributes);
        }

        let size = vector_size(body);
        self.instruments
            .vector_size
            .add(u64::try_from(size).unwrap_or(u64::MAX), &shared);
        self.instruments.duration.record(duration, &shared);
        tracing::debug!(vector_size = size, duration, "embeddings call measured");
    }
}
