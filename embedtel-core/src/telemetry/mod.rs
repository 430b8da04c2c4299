//! Instrumentation for embeddings calls: attribute extraction, span and
//! metric wrappers, and the per-call suppression gate.
//! By default metrics go nowhere unless instruments are installed via `set_global_instruments`.

pub mod attributes;
pub mod context;
pub mod instruments;
pub mod keys;
pub mod metered;
pub mod traced;
pub mod tracer;
#[cfg(test)]
pub mod test_span;
#[cfg(test)]
pub mod testing;

pub use attributes::{ResponseBody, ResponseShape, ResponseView, normalize_response};
pub use context::CallContext;
pub use instruments::{Counter, EmbeddingsInstruments, Histogram, LogInstrument};
pub use keys::*;
pub use metered::{Clock, EmbeddingsMeter, SystemClock};
pub use traced::EmbeddingsTracer;
pub use tracer::{OtelTracer, ScopedSpan, SpanHandle, SpanKind, Tracer, TracingTracer};

use once_cell::sync::OnceCell;

static GLOBAL_INSTRUMENTS: OnceCell<EmbeddingsInstruments> = OnceCell::new();

/// Install process-wide instruments. Returns `false` if some are already installed.
///
/// This is write-once for the process lifetime (backed by `OnceCell`).
pub fn set_global_instruments(instruments: EmbeddingsInstruments) -> bool {
    GLOBAL_INSTRUMENTS.set(instruments).is_ok()
}

/// The process-wide instruments. When none were installed, they are built
/// once from the global OpenTelemetry meter provider under `meter_name`.
pub fn global_instruments(meter_name: &str) -> EmbeddingsInstruments {
    GLOBAL_INSTRUMENTS
        .get_or_init(|| EmbeddingsInstruments::from_global(meter_name.to_string()))
        .clone()
}
