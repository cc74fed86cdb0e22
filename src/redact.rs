use crate::matcher::Matcher;
use regex::Regex;
use std::sync::OnceLock;

const DEFAULT_DENY_PATTERN: &str = "(?i)token|password|secret|hash|jwt";

fn default_deny() -> Matcher {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let regex = PATTERN.get_or_init(|| Regex::new(DEFAULT_DENY_PATTERN).expect("default deny pattern is valid"));
    Matcher::Pattern(regex.clone())
}

/// Which keys survive redaction.
///
/// Without an include-list every key is kept unless it is denied
/// (opt-out). With an include-list only listed dotted paths, their
/// ancestors and their descendants are kept (opt-in). Denied keys are
/// dropped in both modes.
#[derive(Clone, Debug)]
pub struct RedactConfig {
    include: Option<Vec<String>>,
    deny: Vec<Matcher>,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            include: None,
            deny: vec![default_deny()],
        }
    }
}

impl RedactConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matcher to the denylist, on top of the defaults.
    pub fn deny(mut self, matcher: impl Into<Matcher>) -> Self {
        self.deny.push(matcher.into());
        self
    }

    pub fn deny_all<I, M>(mut self, matchers: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<Matcher>,
    {
        self.deny.extend(matchers.into_iter().map(Into::into));
        self
    }

    /// Switch to opt-in mode with the given dotted paths.
    pub fn include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    fn denied(&self, key: &str, path: &str) -> bool {
        self.deny.iter().any(|m| m.matches(key) || m.matches(path))
    }

    fn included(&self, path: &str) -> bool {
        let Some(include) = &self.include else {
            return true;
        };
        include.iter().any(|inc| {
            inc == path || is_ancestor(path, inc) || is_ancestor(inc, path)
        })
    }

    fn allows(&self, key: &str, path: &str) -> bool {
        !self.denied(key, path) && self.included(path)
    }
}

/// `ancestor` is a strict dotted-path prefix of `path`.
fn is_ancestor(ancestor: &str, path: &str) -> bool {
    path.len() > ancestor.len()
        && path.starts_with(ancestor)
        && path.as_bytes().get(ancestor.len()) == Some(&b'.')
}

/// Deep-copy `value`, dropping object keys `config` does not allow.
/// Array elements share their parent's path.
pub fn redact(value: &serde_json::Value, config: &RedactConfig) -> serde_json::Value {
    walk(value, "", config)
}

fn walk(value: &serde_json::Value, prefix: &str, config: &RedactConfig) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, child) in map {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                if config.allows(key, &path) {
                    out.insert(key.clone(), walk(child, &path, config));
                }
            }
            serde_json::Value::Object(out)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|item| walk(item, prefix, config)).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn default_policy_drops_sensitive_keys() {
        let body = json!({"password": "x", "name": "y"});
        assert_eq!(redact(&body, &RedactConfig::default()), json!({"name": "y"}));
    }

    #[test]
    fn nested_and_mixed_case_keys_are_dropped() {
        let body = json!({
            "bar": "baz",
            "secret": "BAD",
            "token": "BAD",
            "mySecret": "BAD",
            "myToken": "BAD",
            "myPassword": "BAD",
            "passwordHash": "BAD",
            "jwt": "BAD",
            "user": {
                "bar": "baz",
                "secret": "BAD",
                "myPassword": "BAD"
            }
        });
        assert_eq!(
            redact(&body, &RedactConfig::default()),
            json!({"bar": "baz", "user": {"bar": "baz"}})
        );
    }

    #[test]
    fn custom_denylist_adds_to_defaults() {
        let body = json!({
            "bar": "baz",
            "test1": "test1",
            "test2": "test2",
            "sensitive": "sensitive",
            "token": "BAD",
            "user": {"bar": "baz", "test1": "test1", "sensitive": "sensitive"}
        });
        let config = RedactConfig::default()
            .deny("sensitive")
            .deny(Matcher::pattern(r"test\d").unwrap());
        assert_eq!(
            redact(&body, &config),
            json!({"bar": "baz", "user": {"bar": "baz"}})
        );
    }

    #[test]
    fn include_list_keeps_ancestors_and_descendants() {
        let body = json!({
            "user": {"name": "Joe", "email": "joe@example.com"},
            "shop": {"address": {"city": "Osaka", "zip": "1"}},
            "other": 1
        });
        let config = RedactConfig::default().include(["user.name", "shop"]);
        assert_eq!(
            redact(&body, &config),
            json!({"user": {"name": "Joe"}, "shop": {"address": {"city": "Osaka", "zip": "1"}}})
        );
    }

    #[test]
    fn deny_wins_over_include() {
        let body = json!({"user": {"name": "Joe", "token": "t"}});
        let config = RedactConfig::default().include(["user"]);
        assert_eq!(redact(&body, &config), json!({"user": {"name": "Joe"}}));
    }

    #[test]
    fn denylist_matches_full_path() {
        let body = json!({"user": {"name": "Joe"}, "name": "top"});
        let config = RedactConfig::default().deny("user.name");
        assert_eq!(redact(&body, &config), json!({"user": {}, "name": "top"}));
    }

    #[test]
    fn arrays_are_walked() {
        let body = json!({"items": [{"id": 1, "secret": "s"}, 2]});
        assert_eq!(
            redact(&body, &RedactConfig::default()),
            json!({"items": [{"id": 1}, 2]})
        );
    }

    #[test]
    fn ancestor_requires_dot_boundary() {
        assert!(is_ancestor("user", "user.name"));
        assert!(!is_ancestor("user", "username"));
        assert!(!is_ancestor("user", "user"));
    }
}
