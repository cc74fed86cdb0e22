use crate::value::{non_finite_text, Value};

/// Depth used when a logger is not configured otherwise.
pub const DEFAULT_DEPTH: usize = 3;

/// Marker emitted for a back-reference to a container being rendered.
pub const CIRCULAR: &str = "[Circular]";

const ARRAY_PLACEHOLDER: &str = "[Array]";
const OBJECT_PLACEHOLDER: &str = "[Object]";

/// Render `value` for display.
///
/// `depth` of `None` descends fully (cycles are still detected).
/// `Some(0)` disables recursion: the whole value is rendered as one line
/// of compact JSON. Containers already on the render stack become
/// `[Circular]`.
pub fn dump(value: &Value, depth: Option<usize>) -> String {
    if depth == Some(0) {
        return to_json(value).to_string();
    }
    DumpContext::new(depth).render(value, 0)
}

/// Canonical text of a single value at nesting level 0: bare strings,
/// error trace text, JSON for other primitives. Containers go through
/// [`dump`].
pub fn render_top(value: &Value, depth: Option<usize>) -> String {
    if value.is_primitive() {
        render_primitive(value, 0)
    } else {
        dump(value, depth)
    }
}

/// Convert `value` into JSON-safe data for structured fields.
///
/// Cycles become the string `"[Circular]"`, `undefined` object members
/// are dropped, `undefined` array members become `null` and errors become
/// their trace text. No depth bound applies.
pub fn to_json(value: &Value) -> serde_json::Value {
    json_inner(value, &mut Vec::new())
}

fn json_inner(value: &Value, stack: &mut Vec<usize>) -> serde_json::Value {
    match value {
        Value::Undefined | Value::Null | Value::NonFinite(_) => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => serde_json::Value::Number(n.clone()),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Error(e) => serde_json::Value::String(e.trace()),
        Value::Array(arr) => {
            if stack.contains(&arr.id()) {
                return serde_json::Value::String(CIRCULAR.to_string());
            }
            stack.push(arr.id());
            let items = arr.items().iter().map(|v| json_inner(v, stack)).collect();
            stack.pop();
            serde_json::Value::Array(items)
        }
        Value::Object(obj) => {
            if stack.contains(&obj.id()) {
                return serde_json::Value::String(CIRCULAR.to_string());
            }
            stack.push(obj.id());
            let map = obj
                .entries()
                .into_iter()
                .filter(|(_, v)| !matches!(v, Value::Undefined))
                .map(|(k, v)| {
                    let v = json_inner(&v, stack);
                    (k, v)
                })
                .collect();
            stack.pop();
            serde_json::Value::Object(map)
        }
    }
}

/// Per-call rendering state: the depth bound and the identities of the
/// containers currently on the rendering stack.
struct DumpContext {
    max_depth: Option<usize>,
    visiting: Vec<usize>,
}

impl DumpContext {
    fn new(max_depth: Option<usize>) -> Self {
        Self {
            max_depth,
            visiting: Vec::new(),
        }
    }

    fn can_descend(&self, level: usize) -> bool {
        self.max_depth.map_or(true, |max| level < max)
    }

    fn render(&mut self, value: &Value, level: usize) -> String {
        match value {
            Value::Array(arr) => {
                let id = arr.id();
                if self.visiting.contains(&id) {
                    return CIRCULAR.to_string();
                }
                if !self.can_descend(level) {
                    return ARRAY_PLACEHOLDER.to_string();
                }
                self.visiting.push(id);
                let items: Vec<String> = arr
                    .items()
                    .iter()
                    .map(|el| self.render(el, level + 1))
                    .collect();
                self.visiting.pop();
                format!("[{}]", items.join(", "))
            }
            Value::Object(obj) => {
                let id = obj.id();
                if self.visiting.contains(&id) {
                    return CIRCULAR.to_string();
                }
                if !self.can_descend(level) {
                    return OBJECT_PLACEHOLDER.to_string();
                }
                let entries = obj.entries();
                if entries.is_empty() {
                    return "{}".to_string();
                }
                self.visiting.push(id);
                let fields: Vec<String> = entries
                    .iter()
                    .map(|(key, val)| format!("{}: {}", render_key(key), self.render(val, level + 1)))
                    .collect();
                self.visiting.pop();
                format!("{{ {} }}", fields.join(", "))
            }
            _ => render_primitive(value, level),
        }
    }
}

fn render_primitive(value: &Value, level: usize) -> String {
    match value {
        Value::String(s) if level == 0 => s.clone(),
        Value::String(s) => serde_json::Value::String(s.clone()).to_string(),
        Value::Number(n) => n.to_string(),
        Value::NonFinite(n) => non_finite_text(*n).to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Undefined => "undefined".to_string(),
        Value::Error(e) => e.trace(),
        Value::Array(_) | Value::Object(_) => dump(value, None),
    }
}

fn render_key(key: &str) -> String {
    let mut chars = key.chars();
    let identifier = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if identifier {
        key.to_string()
    } else {
        serde_json::Value::String(key.to_string()).to_string()
    }
}
