//! JSONL layer.
//!
//! Each event becomes one flat object: the event's own fields at top level,
//! `msg` for the message, plus `ts`, `level`, `service`, `pid` and `target`.
//! The innermost span name goes under `span`, the callsite under `src`.

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::io::Write;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::Layer;

/// Writes an event's fields straight into a JSON object.
struct Fields<'a>(&'a mut Map<String, Value>);

impl Fields<'_> {
    fn put(&mut self, field: &Field, value: Value) {
        let key = match field.name() {
            "message" => "msg",
            name => name,
        };
        self.0.insert(key.to_string(), value);
    }
}

impl Visit for Fields<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, Value::String(format!("{value:?}")));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::Bool(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        let value = Number::from_f64(value)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string()));
        self.put(field, value);
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.put(field, Value::String(value.to_string()));
    }
}

/// Layer writing one JSON line per event through `W`.
pub struct JsonLayer<W> {
    service: String,
    pid: u32,
    make_writer: W,
}

impl<W> JsonLayer<W> {
    pub fn new(service: impl Into<String>, make_writer: W) -> Self {
        Self {
            service: service.into(),
            pid: std::process::id(),
            make_writer,
        }
    }

    fn line<S>(&self, event: &Event<'_>, ctx: &Context<'_, S>) -> Map<String, Value>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        let mut line = Map::new();
        event.record(&mut Fields(&mut line));
        line.entry("msg").or_insert_with(|| Value::from(""));

        // Fixed keys override event fields of the same name.
        let meta = event.metadata();
        let ts = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        line.insert("ts".into(), Value::String(ts));
        line.insert("level".into(), Value::from(meta.level().as_str()));
        line.insert("service".into(), Value::from(self.service.as_str()));
        line.insert("pid".into(), Value::from(self.pid));
        line.insert("target".into(), Value::from(meta.target()));

        if let Some(span) = ctx.event_span(event) {
            line.insert("span".into(), Value::from(span.name()));
        }
        if let (Some(file), Some(no)) = (meta.file(), meta.line()) {
            line.insert("src".into(), Value::String(format!("{file}:{no}")));
        }

        line
    }
}

impl<S, W> Layer<S> for JsonLayer<W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'writer> MakeWriter<'writer> + 'static,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let mut text = Value::Object(self.line(event, &ctx)).to_string();
        text.push('\n');

        // One write per line; failures are dropped.
        let _ = self.make_writer.make_writer().write_all(text.as_bytes());
    }
}
