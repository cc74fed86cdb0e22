use crate::dump::{render_top, to_json};
use crate::value::Value;

/// Structured field map carried by records and logger handles.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Key grouping several complex arguments that were logged together.
pub const ARGUMENTS_KEY: &str = "arguments";

/// Result of reconciling one argument list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub message: Option<String>,
    pub fields: Fields,
}

/// Order-preserving split of an argument list.
#[derive(Debug)]
pub struct Partition<'a> {
    pub primitives: Vec<&'a Value>,
    pub complex: Vec<&'a Value>,
}

pub fn partition(args: &[Value]) -> Partition<'_> {
    let (primitives, complex): (Vec<&Value>, Vec<&Value>) =
        args.iter().partition(|arg| arg.is_primitive());
    Partition {
        primitives,
        complex,
    }
}

/// Build the message and structured fields for `args`.
///
/// Every argument contributes to the message, in order: primitives at
/// level 0, containers through the depth-bounded dumper. Structured
/// fields are only produced when no primitive is present. A lone object
/// contributes its own keys, a lone array its indices, and two or more
/// containers are grouped under [`ARGUMENTS_KEY`].
pub fn reconcile(args: &[Value], depth: Option<usize>) -> Payload {
    if args.is_empty() {
        return Payload::default();
    }

    let message = args
        .iter()
        .map(|arg| render_top(arg, depth))
        .collect::<Vec<_>>()
        .join(" ");

    let parts = partition(args);
    let fields = if parts.primitives.is_empty() {
        hoist(&parts.complex)
    } else {
        Fields::new()
    };

    Payload {
        message: Some(message),
        fields,
    }
}

fn hoist(complex: &[&Value]) -> Fields {
    match complex {
        [] => Fields::new(),
        [single] => fields_of(single),
        many => {
            let grouped = many.iter().copied().map(to_json).collect();
            let mut fields = Fields::new();
            fields.insert(ARGUMENTS_KEY.to_string(), serde_json::Value::Array(grouped));
            fields
        }
    }
}

/// Field map of a single container: object keys as-is, array elements
/// keyed by index. Primitives have no fields.
pub fn fields_of(value: &Value) -> Fields {
    match to_json(value) {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Fields::new(),
    }
}

/// Merge `overlay` over `base`; keys in `overlay` win.
pub fn merge(base: &Fields, overlay: Fields) -> Fields {
    let mut merged = base.clone();
    merged.extend(overlay);
    merged
}
