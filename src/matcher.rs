use crate::error::ConfigError;
use regex::Regex;

/// A string-or-pattern matcher, used for user-agent ignore lists,
/// field denylists and route paths.
#[derive(Clone, Debug)]
pub enum Matcher {
    /// Matches a candidate equal to the string.
    Literal(String),
    /// Matches a candidate the regex finds a match in.
    Pattern(Regex),
}

impl Matcher {
    pub fn literal(value: impl Into<String>) -> Self {
        Matcher::Literal(value.into())
    }

    pub fn pattern(pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Matcher::Pattern)
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            Matcher::Literal(value) => value == candidate,
            Matcher::Pattern(regex) => regex.is_match(candidate),
        }
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Matcher::literal(value)
    }
}

impl From<String> for Matcher {
    fn from(value: String) -> Self {
        Matcher::Literal(value)
    }
}

impl From<Regex> for Matcher {
    fn from(value: Regex) -> Self {
        Matcher::Pattern(value)
    }
}

/// True if any matcher in `matchers` accepts `candidate`.
pub fn any_match(matchers: &[Matcher], candidate: &str) -> bool {
    matchers.iter().any(|m| m.matches(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_is_exact() {
        let m = Matcher::from("Foobar");
        assert!(m.matches("Foobar"));
        assert!(!m.matches("Foobar/1.0"));
    }

    #[test]
    fn pattern_searches() {
        let m = Matcher::pattern("(?i)^foo").unwrap();
        assert!(m.matches("Foobar"));
        assert!(!m.matches("barfoo"));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = Matcher::pattern("(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }
}
