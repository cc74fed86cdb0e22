use crate::reconcile::Fields;
use serde_json::Value;

pub const TRACE_KEY: &str = "logging.googleapis.com/trace";
pub const SPAN_ID_KEY: &str = "logging.googleapis.com/spanId";
pub const TRACE_SAMPLED_KEY: &str = "logging.googleapis.com/trace_sampled";

/// Source of distributed-tracing identifiers for the active request.
///
/// Called once per structured emission; `None` means no span is active.
pub trait TraceProvider: Send + Sync {
    fn trace_payload(&self) -> Option<Fields>;
}

/// Identifiers of the active span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpanContext {
    pub trace_id: String,
    pub span_id: String,
    pub sampled: bool,
}

impl SpanContext {
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert(SPAN_ID_KEY.to_string(), Value::String(self.span_id.clone()));
        fields.insert(TRACE_KEY.to_string(), Value::String(self.trace_id.clone()));
        fields.insert(TRACE_SAMPLED_KEY.to_string(), Value::Bool(self.sampled));
        fields
    }
}

impl<F> TraceProvider for F
where
    F: Fn() -> Option<SpanContext> + Send + Sync,
{
    fn trace_payload(&self) -> Option<Fields> {
        self().map(|ctx| ctx.to_fields())
    }
}
