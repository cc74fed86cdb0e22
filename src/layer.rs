use crate::level::Level;
use crate::logger::Logger;
use crate::reconcile::Fields;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Target prefix of the engine's own diagnostics.
pub const ENGINE_TARGET: &str = "cloudlog";

/// `tracing_subscriber` layer that forwards `tracing` events to a facade
/// [`Logger`].
///
/// The event's `message` field becomes the log message and every other
/// field lands in the record's context. Events emitted by this crate
/// (target `cloudlog...`) are skipped so a failing sink cannot feed
/// back into itself.
pub struct FacadeLayer {
    logger: Option<Logger>,
}

impl FacadeLayer {
    /// Forward to `logger`, or to the process-wide logger at the time of
    /// each event when `None`.
    pub fn new(logger: Option<Logger>) -> Self {
        Self { logger }
    }
}

fn level_of(level: &tracing::Level) -> Level {
    match *level {
        tracing::Level::TRACE => Level::Trace,
        tracing::Level::DEBUG => Level::Debug,
        tracing::Level::INFO => Level::Info,
        tracing::Level::WARN => Level::Warn,
        tracing::Level::ERROR => Level::Error,
    }
}

impl<S> Layer<S> for FacadeLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if meta.target().starts_with(ENGINE_TARGET) {
            return;
        }

        let mut fields = Fields::new();
        let mut message: Option<String> = None;
        let mut visitor = FieldVisitor {
            fields: &mut fields,
            message: &mut message,
        };
        event.record(&mut visitor);

        let level = level_of(meta.level());
        let text = message.unwrap_or_default();
        let emit = |logger: &Logger| {
            if fields.is_empty() {
                logger.log_text(level, text);
            } else {
                logger.context(serde_json::Value::Object(fields)).log_text(level, text);
            }
        };

        match &self.logger {
            Some(logger) => emit(logger),
            None => emit(crate::init::current().as_ref()),
        }
    }
}

pub struct FieldVisitor<'a> {
    pub fields: &'a mut Fields,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.fields.insert(field.name().to_string(), serde_json::Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.insert(field.name().to_string(), serde_json::Value::String(format!("{:?}", value)));
        }
    }
}
