#![cfg(test)]
//! Recording fakes for the tracer and metric instruments.

use std::sync::{Arc, Mutex};

use opentelemetry::{KeyValue, Value};

use crate::telemetry::instruments::{Counter, EmbeddingsInstruments, Histogram};
use crate::telemetry::tracer::{SpanHandle, SpanKind, Tracer};

pub fn attr(attributes: &[KeyValue], key: &str) -> Option<Value> {
    attributes
        .iter()
        .rev()
        .find(|kv| kv.key.as_str() == key)
        .map(|kv| kv.value.clone())
}

#[derive(Debug, Clone)]
pub struct SpanRecord {
    pub name: &'static str,
    pub kind: SpanKind,
    pub attributes: Vec<KeyValue>,
    pub end_count: usize,
}

impl SpanRecord {
    pub fn attribute(&self, key: &str) -> Option<Value> {
        attr(&self.attributes, key)
    }

    pub fn has_attribute_prefix(&self, prefix: &str) -> bool {
        self.attributes.iter().any(|kv| kv.key.as_str().starts_with(prefix))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    spans: Arc<Mutex<Vec<Arc<Mutex<SpanRecord>>>>>,
    not_recording: bool,
}

impl RecordingTracer {
    /// Spans from this tracer report `is_recording() == false`.
    pub fn not_recording() -> Self {
        Self {
            not_recording: true,
            ..Self::default()
        }
    }

    /// Snapshot of every span started so far, in start order.
    pub fn spans(&self) -> Vec<SpanRecord> {
        self.spans
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.lock().unwrap().clone())
            .collect()
    }
}

pub struct RecordingSpan {
    record: Arc<Mutex<SpanRecord>>,
    recording: bool,
}

impl SpanHandle for RecordingSpan {
    fn set_attribute(&mut self, attribute: KeyValue) {
        self.record.lock().unwrap().attributes.push(attribute);
    }

    fn is_recording(&self) -> bool {
        self.recording && self.record.lock().unwrap().end_count == 0
    }

    fn end(&mut self) {
        self.record.lock().unwrap().end_count += 1;
    }
}

impl Tracer for RecordingTracer {
    type Span = RecordingSpan;

    fn start_span(
        &self,
        name: &'static str,
        kind: SpanKind,
        attributes: Vec<KeyValue>,
    ) -> Self::Span {
        let record = Arc::new(Mutex::new(SpanRecord {
            name,
            kind,
            attributes,
            end_count: 0,
        }));
        self.spans.lock().unwrap().push(record.clone());
        RecordingSpan {
            record,
            recording: !self.not_recording,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordingCounter {
    pub adds: Mutex<Vec<(u64, Vec<KeyValue>)>>,
}

impl RecordingCounter {
    pub fn adds(&self) -> Vec<(u64, Vec<KeyValue>)> {
        self.adds.lock().unwrap().clone()
    }
}

impl Counter for RecordingCounter {
    fn add(&self, value: u64, attributes: &[KeyValue]) {
        self.adds.lock().unwrap().push((value, attributes.to_vec()));
    }
}

#[derive(Debug, Default)]
pub struct RecordingHistogram {
    pub records: Mutex<Vec<(f64, Vec<KeyValue>)>>,
}

impl RecordingHistogram {
    pub fn records(&self) -> Vec<(f64, Vec<KeyValue>)> {
        self.records.lock().unwrap().clone()
    }
}

impl Histogram for RecordingHistogram {
    fn record(&self, value: f64, attributes: &[KeyValue]) {
        self.records.lock().unwrap().push((value, attributes.to_vec()));
    }
}

/// Recording instruments plus handles to inspect them.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    pub tokens: Arc<RecordingCounter>,
    pub vector_size: Arc<RecordingCounter>,
    pub duration: Arc<RecordingHistogram>,
}

impl Recorded {
    pub fn instruments(&self) -> EmbeddingsInstruments {
        EmbeddingsInstruments::new(
            self.tokens.clone(),
            self.vector_size.clone(),
            self.duration.clone(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.adds().is_empty()
            && self.vector_size.adds().is_empty()
            && self.duration.records().is_empty()
    }
}
