use crate::level::Severity;
use crate::reconcile::Fields;
use serde::Serialize;

/// Top-level keys assigned by the engine. Values for these keys never
/// come from caller-supplied structured arguments.
pub const RESERVED_KEYS: &[&str] = &[
    "message",
    "severity",
    "httpRequest",
    "timestamp",
    "time",
    "log",
    "context",
];

pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Structured record emitted by the cloud logger, one JSON object per line.
///
/// Caller data lives under `context`; `fields` carries engine-assigned
/// top-level entries (`httpRequest`, `userId`, trace keys, ...).
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(flatten)]
    fields: Fields,
    #[serde(skip_serializing_if = "Fields::is_empty")]
    pub context: Fields,
}

impl LogRecord {
    pub fn new(severity: Severity, message: Option<String>) -> Self {
        Self {
            severity,
            message,
            fields: Fields::new(),
            context: Fields::new(),
        }
    }

    pub fn with_context(mut self, context: Fields) -> Self {
        self.context = context;
        self
    }

    /// Set an engine-owned top-level field. `None` values are skipped so
    /// absent request data never appears as `null`.
    pub(crate) fn set(&mut self, key: &str, value: Option<serde_json::Value>) {
        if let Some(value) = value {
            self.fields.insert(key.to_string(), value);
        }
    }

    /// Add entries that are not already present. Reserved keys and keys
    /// set earlier are left untouched.
    pub fn merge_missing(&mut self, extra: Fields) {
        for (key, value) in extra {
            if is_reserved(&key) || self.fields.contains_key(&key) {
                continue;
            }
            self.fields.insert(key, value);
        }
    }

    pub fn field(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    pub fn to_json(&self) -> String {
        // Every member is already a serde_json value or a plain enum, so
        // serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn serializes_flat_with_context() {
        let mut context = Fields::new();
        context.insert("foo".into(), json!("bar"));
        let mut record = LogRecord::new(Severity::Info, Some("msg".into())).with_context(context);
        record.set("userId", Some(json!("u1")));
        record.set("requestBody", None);

        let parsed: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(
            parsed,
            json!({"severity": "INFO", "message": "msg", "userId": "u1", "context": {"foo": "bar"}})
        );
    }

    #[test]
    fn merge_missing_keeps_existing_and_reserved() {
        let mut record = LogRecord::new(Severity::Error, None);
        record.set("trace", Some(json!("engine")));

        let mut extra = Fields::new();
        extra.insert("trace".into(), json!("other"));
        extra.insert("severity".into(), json!("DEBUG"));
        extra.insert("spanId".into(), json!("1"));
        record.merge_missing(extra);

        let parsed: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();
        assert_eq!(parsed, json!({"severity": "ERROR", "trace": "engine", "spanId": "1"}));
    }
}
