use crate::dump::render_top;
use crate::value::{non_finite_text, Value};

/// Substitute `%s`, `%d` and `%i` placeholders in `args[0]`.
///
/// Placeholders are scanned left to right and each consumes the next
/// unconsumed argument, which is removed from the list. `%%` yields a
/// literal `%`. A placeholder with nothing left to consume stays in the
/// text as written. Arguments not consumed follow the rewritten template
/// unchanged. If `args[0]` is not a string the list is returned as is.
pub fn interpolate(args: Vec<Value>, depth: Option<usize>) -> Vec<Value> {
    let mut iter = args.into_iter();
    let template = match iter.next() {
        Some(Value::String(template)) => template,
        Some(first) => return std::iter::once(first).chain(iter).collect(),
        None => return Vec::new(),
    };
    if !template.contains('%') {
        return std::iter::once(Value::String(template)).chain(iter).collect();
    }

    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        let op = match chars.peek() {
            Some(&op) if matches!(op, 's' | 'd' | 'i' | '%') => op,
            _ => {
                out.push('%');
                continue;
            }
        };
        chars.next();
        if op == '%' {
            out.push('%');
            continue;
        }
        match iter.next() {
            Some(arg) => out.push_str(&substitute(op, &arg, depth)),
            None => {
                out.push('%');
                out.push(op);
            }
        }
    }

    std::iter::once(Value::String(out)).chain(iter).collect()
}

fn substitute(op: char, arg: &Value, depth: Option<usize>) -> String {
    match op {
        'd' => format_number(to_number(arg)),
        'i' => format_number(to_number(arg).trunc()),
        _ => render_top(arg, depth),
    }
}

/// Numeric coercion of a substitution argument. Anything that does not
/// describe a number yields NaN.
fn to_number(arg: &Value) -> f64 {
    match arg {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::NonFinite(n) => *n,
        Value::Bool(b) => f64::from(u8::from(*b)),
        Value::Null => 0.0,
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

fn format_number(n: f64) -> String {
    if !n.is_finite() {
        non_finite_text(n).to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::dump::dump;

    fn render(args: Vec<Value>) -> Vec<String> {
        interpolate(args, Some(3))
            .iter()
            .map(|v| dump(v, Some(3)))
            .collect()
    }

    #[test]
    fn substitutes_strings() {
        assert_eq!(render(args!["%s -> %s", "foo", "bar"]), vec!["foo -> bar"]);
    }

    #[test]
    fn substitutes_digits_and_integers() {
        assert_eq!(render(args!["%s -> %d", "foo", 1000]), vec!["foo -> 1000"]);
        assert_eq!(render(args!["%s -> %i", "foo", 1000]), vec!["foo -> 1000"]);
        assert_eq!(render(args!["%i items", 3.9]), vec!["3 items"]);
        assert_eq!(render(args!["%d%%", "42"]), vec!["42%"]);
        assert_eq!(render(args!["%d", "abc"]), vec!["NaN"]);
    }

    #[test]
    fn leftover_arguments_pass_through() {
        let out = interpolate(args!["a %s", "b", "c", serde_json::json!({"k": 1})], Some(3));
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].as_str(), Some("a b"));
        assert_eq!(out[1].as_str(), Some("c"));
        assert!(matches!(out[2], Value::Object(_)));
    }

    #[test]
    fn missing_arguments_keep_placeholder() {
        assert_eq!(render(args!["%s and %s", "one"]), vec!["one and %s"]);
    }

    #[test]
    fn non_string_template_is_untouched() {
        let out = interpolate(args![1, "%s", "x"], Some(3));
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].as_str(), Some("%s"));
    }

    #[test]
    fn unknown_directives_are_literal() {
        assert_eq!(render(args!["100%x %s", "y"]), vec!["100%x y"]);
    }

    #[test]
    fn objects_substitute_as_dump() {
        let out = render(args!["got %s", serde_json::json!({"a": 1})]);
        assert_eq!(out, vec!["got { a: 1 }"]);
    }
}
