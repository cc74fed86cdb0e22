use serde_json::Number;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A single logging argument.
///
/// Containers ([`Object`], [`Array`]) are shared handles: cloning a
/// container clones the handle, not the contents, so a container can be
/// inserted into itself to build a cyclic graph. The dumper and the JSON
/// conversion both detect such cycles.
#[derive(Clone, Debug)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    /// NaN or an infinity. Rendered as text, `null` in structured fields.
    NonFinite(f64),
    String(String),
    Error(ErrorValue),
    Array(Array),
    Object(Object),
}

impl Value {
    /// Capture any error (and its `source()` chain) as an argument.
    pub fn error<E: std::error::Error + 'static>(err: &E) -> Self {
        Value::Error(ErrorValue::from_error(err))
    }

    /// Strings, numbers, booleans, null, undefined and errors produce
    /// message text; arrays and objects are structured.
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Value::Array(_) | Value::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Captured description of an error: its type, message, causes and an
/// optional backtrace. Renders as one block of trace text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorValue {
    kind: String,
    message: String,
    causes: Vec<String>,
    backtrace: Option<String>,
}

impl ErrorValue {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            causes: Vec::new(),
            backtrace: None,
        }
    }

    pub fn from_error<E: std::error::Error + 'static>(err: &E) -> Self {
        let mut value = Self::new(short_type_name::<E>(), err.to_string());
        let mut source = err.source();
        while let Some(cause) = source {
            value.causes.push(cause.to_string());
            source = cause.source();
        }
        value
    }

    pub fn with_cause(mut self, cause: impl Into<String>) -> Self {
        self.causes.push(cause.into());
        self
    }

    pub fn with_backtrace(mut self, backtrace: impl fmt::Display) -> Self {
        self.backtrace = Some(backtrace.to_string());
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Full descriptive text: `Kind: message`, one `caused by:` line per
    /// cause, then the backtrace if one was captured.
    pub fn trace(&self) -> String {
        let mut out = if self.message.is_empty() {
            self.kind.clone()
        } else {
            format!("{}: {}", self.kind, self.message)
        };
        for cause in &self.causes {
            out.push_str("\n    caused by: ");
            out.push_str(cause);
        }
        if let Some(bt) = &self.backtrace {
            out.push('\n');
            out.push_str(bt.trim_end());
        }
        out
    }
}

/// Text of a float JSON cannot hold.
pub(crate) fn non_finite_text(n: f64) -> &'static str {
    if n.is_nan() {
        "NaN"
    } else if n > 0.0 {
        "Infinity"
    } else {
        "-Infinity"
    }
}

fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_string()
}

/// Shared, insertion-ordered map of keys to values.
#[derive(Clone, Default)]
pub struct Object(Arc<RwLock<Vec<(String, Value)>>>);

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace `key`, keeping its original position on replace.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let mut entries = self.0.write().unwrap_or_else(PoisonError::into_inner);
        match entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                entries.push((key, value));
                None
            }
        }
    }

    /// Builder form of [`Object::insert`].
    pub fn with(self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.0.read().unwrap_or_else(PoisonError::into_inner);
        entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    /// Snapshot of the current entries. The lock is released before the
    /// caller traverses them, so self-referencing objects can be walked.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Contents may be cyclic; print identity and size only.
        write!(f, "Object(#{:x}, len={})", self.id(), self.len())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}

/// Shared, ordered list of values.
#[derive(Clone, Default)]
pub struct Array(Arc<RwLock<Vec<Value>>>);

impl Array {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(value.into());
    }

    pub fn with(self, value: impl Into<Value>) -> Self {
        self.push(value);
        self
    }

    pub fn get(&self, index: usize) -> Option<Value> {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index)
            .cloned()
    }

    pub fn items(&self) -> Vec<Value> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.0.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Array(#{:x}, len={})", self.id(), self.len())
    }
}

impl<V: Into<Value>> FromIterator<V> for Array {
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        Array(Arc::new(RwLock::new(iter.into_iter().map(Into::into).collect())))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::NonFinite(value), Value::Number)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::from(f64::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().collect())
    }
}

impl From<ErrorValue> for Value {
    fn from(value: ErrorValue) -> Self {
        Value::Error(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().collect()),
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Outer(std::io::Error);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("request failed")
        }
    }

    impl std::error::Error for Outer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn error_trace_lists_causes() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "connection reset"));
        let value = ErrorValue::from_error(&err);
        assert_eq!(value.kind(), "Outer");
        assert_eq!(value.trace(), "Outer: request failed\n    caused by: connection reset");
    }

    #[test]
    fn insert_replaces_in_place() {
        let obj = Object::new().with("a", 1).with("b", 2);
        assert!(obj.insert("a", 3).is_some());
        let keys: Vec<String> = obj.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert!(matches!(obj.get("a"), Some(Value::Number(n)) if n.as_i64() == Some(3)));
    }

    #[test]
    fn json_object_keeps_structure() {
        let value = Value::from(serde_json::json!({"user": {"name": "Joe"}, "tags": ["a"]}));
        let Value::Object(obj) = value else {
            panic!("expected object");
        };
        assert!(matches!(obj.get("user"), Some(Value::Object(_))));
        assert!(matches!(obj.get("tags"), Some(Value::Array(a)) if a.len() == 1));
    }

    #[test]
    fn non_finite_floats_keep_their_value() {
        assert!(matches!(Value::from(f64::NAN), Value::NonFinite(n) if n.is_nan()));
        assert!(matches!(Value::from(f64::NEG_INFINITY), Value::NonFinite(n) if n < 0.0));
        assert!(matches!(Value::from(1.5), Value::Number(_)));
    }

    #[test]
    fn cyclic_debug_does_not_recurse() {
        let obj = Object::new().with("foo", "bar");
        obj.insert("self", obj.clone());
        let text = format!("{:?}", Value::Object(obj));
        assert!(text.starts_with("Object(Object(#"));
    }
}
