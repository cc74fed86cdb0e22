use crate::level::Level;
use crate::reconcile::Fields;

/// Third-party error-reporting backend.
///
/// The reporting logger hands every admitted call to `report` with the
/// rendered console-style line and the caller's structured fields.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, level: Level, message: &str, extra: &Fields);
}

/// Extra fields attached to a reported request: the user id, latency in
/// milliseconds and human readable size.
pub(crate) fn request_extra(user_id: Option<&str>, latency_ms: u64, size: &str) -> Fields {
    let mut extra = Fields::new();
    extra.insert(
        "user.id".to_string(),
        user_id.map_or(serde_json::Value::Null, |id| serde_json::Value::from(id)),
    );
    extra.insert("latency".to_string(), serde_json::Value::from(latency_ms));
    extra.insert("size".to_string(), serde_json::Value::from(size));
    extra
}
