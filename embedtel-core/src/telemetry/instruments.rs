use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use opentelemetry::metrics::Meter;
use opentelemetry::{InstrumentationScope, KeyValue};

use crate::telemetry::keys::{METRIC_DURATION, METRIC_TOKENS, METRIC_VECTOR_SIZE};

/// Additive instrument. Implementations must accept concurrent `add`s.
pub trait Counter: Send + Sync {
    fn add(&self, value: u64, attributes: &[KeyValue]);
}

/// Distribution instrument. Implementations must accept concurrent `record`s.
pub trait Histogram: Send + Sync {
    fn record(&self, value: f64, attributes: &[KeyValue]);
}

impl Counter for opentelemetry::metrics::Counter<u64> {
    fn add(&self, value: u64, attributes: &[KeyValue]) {
        opentelemetry::metrics::Counter::add(self, value, attributes);
    }
}

impl Histogram for opentelemetry::metrics::Histogram<f64> {
    fn record(&self, value: f64, attributes: &[KeyValue]) {
        opentelemetry::metrics::Histogram::record(self, value, attributes);
    }
}

impl<T: Counter + ?Sized> Counter for Arc<T> {
    fn add(&self, value: u64, attributes: &[KeyValue]) {
        (**self).add(value, attributes);
    }
}

impl<T: Histogram + ?Sized> Histogram for Arc<T> {
    fn record(&self, value: f64, attributes: &[KeyValue]) {
        (**self).record(value, attributes);
    }
}

/// Instrument that writes each measurement as a `tracing` event.
#[derive(Debug, Clone, Copy)]
pub struct LogInstrument {
    name: &'static str,
}

impl LogInstrument {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }
}

struct Attrs<'a>(&'a [KeyValue]);

impl fmt::Display for Attrs<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, kv) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", kv.key, kv.value)?;
        }
        Ok(())
    }
}

impl Counter for LogInstrument {
    fn add(&self, value: u64, attributes: &[KeyValue]) {
        tracing::info!(metric = self.name, value, attributes = %Attrs(attributes), "counter add");
    }
}

impl Histogram for LogInstrument {
    fn record(&self, value: f64, attributes: &[KeyValue]) {
        tracing::info!(metric = self.name, value, attributes = %Attrs(attributes), "histogram record");
    }
}

/// The three instruments every embeddings call reports to.
#[derive(Clone)]
pub struct EmbeddingsInstruments {
    pub tokens: Arc<dyn Counter>,
    pub vector_size: Arc<dyn Counter>,
    pub duration: Arc<dyn Histogram>,
}

impl fmt::Debug for EmbeddingsInstruments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddingsInstruments").finish_non_exhaustive()
    }
}

impl EmbeddingsInstruments {
    pub fn new(
        tokens: Arc<dyn Counter>,
        vector_size: Arc<dyn Counter>,
        duration: Arc<dyn Histogram>,
    ) -> Self {
        Self {
            tokens,
            vector_size,
            duration,
        }
    }

    pub fn from_meter(meter: &Meter) -> Self {
        let tokens = meter
            .u64_counter(METRIC_TOKENS)
            .with_unit("token")
            .with_description("Number of tokens used in prompt and completions")
            .build();
        let vector_size = meter
            .u64_counter(METRIC_VECTOR_SIZE)
            .with_unit("element")
            .with_description("The size of returned vector")
            .build();
        let duration = meter
            .f64_histogram(METRIC_DURATION)
            .with_unit("s")
            .with_description("Duration of embeddings operation")
            .build();
        Self::new(Arc::new(tokens), Arc::new(vector_size), Arc::new(duration))
    }

    /// Instruments from the globally installed meter provider.
    pub fn from_global(meter_name: impl Into<Cow<'static, str>>) -> Self {
        let scope = InstrumentationScope::builder(meter_name).build();
        Self::from_meter(&opentelemetry::global::meter_with_scope(scope))
    }

    /// Instruments that only log.
    pub fn logging() -> Self {
        Self::new(
            Arc::new(LogInstrument::new(METRIC_TOKENS)),
            Arc::new(LogInstrument::new(METRIC_VECTOR_SIZE)),
            Arc::new(LogInstrument::new(METRIC_DURATION)),
        )
    }
}
