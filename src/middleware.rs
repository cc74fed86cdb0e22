use crate::error::ConfigError;
use crate::logger::Logger;
use crate::matcher::{any_match, Matcher};
use crate::reconcile::Fields;
use crate::redact::{redact, RedactConfig};
use crate::request::RequestSummary;
use regex::Regex;
use std::borrow::Cow;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

const HEALTH_CHECK_AGENTS: &str = "^(GoogleHC|kube-probe)";

/// Authenticated user id, attached by auth middleware as a request or
/// response extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser(pub String);

/// Parsed request body, attached by the body-parsing layer as a request or
/// response extension.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBody(pub serde_json::Value);

/// Which requests get their body and query recorded.
#[derive(Debug, Clone, Default)]
pub enum RecordParams {
    #[default]
    Disabled,
    /// Every route, once the status reaches the configured threshold.
    All,
    /// The first matching rule decides.
    Routes(Vec<RouteRule>),
}

impl From<bool> for RecordParams {
    fn from(enabled: bool) -> Self {
        if enabled {
            RecordParams::All
        } else {
            RecordParams::Disabled
        }
    }
}

impl From<Vec<RouteRule>> for RecordParams {
    fn from(rules: Vec<RouteRule>) -> Self {
        RecordParams::Routes(rules)
    }
}

/// Admits requests whose path matches, optionally restricted by method
/// and a minimum status, and tunes redaction for them.
#[derive(Debug, Clone)]
pub struct RouteRule {
    pub path: Matcher,
    pub method: Option<String>,
    /// Minimum status; the middleware threshold when unset.
    pub status: Option<u16>,
    /// Dotted paths to keep (opt-in redaction).
    pub include: Option<Vec<String>>,
    /// Keys to drop on top of the denylist.
    pub exclude: Vec<Matcher>,
}

impl RouteRule {
    pub fn new(path: impl Into<Matcher>) -> Self {
        Self {
            path: path.into(),
            method: None,
            status: None,
            include: None,
            exclude: Vec::new(),
        }
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn include<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude(mut self, matcher: impl Into<Matcher>) -> Self {
        self.exclude.push(matcher.into());
        self
    }

    fn admits(&self, method: &str, path: &str, status: u16, threshold: u16) -> bool {
        status >= self.status.unwrap_or(threshold)
            && self
                .method
                .as_deref()
                .map_or(true, |m| m.eq_ignore_ascii_case(method))
            && self.path.matches(path)
    }

    fn refine(&self, mut redaction: RedactConfig) -> RedactConfig {
        if let Some(include) = &self.include {
            redaction = redaction.include(include.iter().cloned());
        }
        redaction.deny_all(self.exclude.iter().cloned())
    }
}

/// Request middleware options.
#[derive(Debug, Clone)]
pub struct MiddlewareConfig {
    /// User agents that produce no record, health checkers by default.
    pub ignore_user_agents: Vec<Matcher>,
    /// Keys dropped from recorded bodies and queries on top of the
    /// default denylist.
    pub disallowed_fields: Vec<Matcher>,
    pub record_params: RecordParams,
    /// Default minimum status for recording body and query.
    pub status_threshold: u16,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            ignore_user_agents: vec![health_checks()],
            disallowed_fields: Vec::new(),
            record_params: RecordParams::Disabled,
            status_threshold: 400,
        }
    }
}

fn health_checks() -> Matcher {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let regex = PATTERN.get_or_init(|| Regex::new(HEALTH_CHECK_AGENTS).expect("health check pattern is valid"));
    Matcher::Pattern(regex.clone())
}

impl MiddlewareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Also ignore user agents matching `matcher`.
    pub fn ignore_user_agent(mut self, matcher: impl Into<Matcher>) -> Self {
        self.ignore_user_agents.push(matcher.into());
        self
    }

    /// Compile `pattern` and ignore user agents matching it.
    pub fn ignore_user_agent_pattern(self, pattern: &str) -> Result<Self, ConfigError> {
        Ok(self.ignore_user_agent(Matcher::pattern(pattern)?))
    }

    pub fn disallow(mut self, matcher: impl Into<Matcher>) -> Self {
        self.disallowed_fields.push(matcher.into());
        self
    }

    pub fn record_params(mut self, params: impl Into<RecordParams>) -> Self {
        self.record_params = params.into();
        self
    }

    pub fn status_threshold(mut self, status: u16) -> Self {
        self.status_threshold = status;
        self
    }

    fn ignores(&self, user_agent: Option<&str>) -> bool {
        any_match(&self.ignore_user_agents, user_agent.unwrap_or(""))
    }

    /// Redaction to apply when this request's params are recorded, `None`
    /// when they are not.
    fn redaction_for(&self, method: &str, path: &str, status: u16) -> Option<RedactConfig> {
        let base = || RedactConfig::default().deny_all(self.disallowed_fields.iter().cloned());
        match &self.record_params {
            RecordParams::Disabled => None,
            RecordParams::All => (status >= self.status_threshold).then(base),
            RecordParams::Routes(rules) => rules
                .iter()
                .find(|rule| rule.admits(method, path, status, self.status_threshold))
                .map(|rule| rule.refine(base())),
        }
    }
}

/// What the middleware reads from an incoming request.
#[derive(Debug, Clone, Default)]
pub struct RequestInfo {
    pub method: String,
    /// Path with the query string, as requested.
    pub path: String,
    pub url: Option<String>,
    pub request_length: Option<String>,
    pub referer: Option<String>,
    pub remote_ip: Option<String>,
    pub server_ip: Option<String>,
    pub protocol: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl RequestInfo {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    fn route(&self) -> (&str, Option<&str>) {
        match self.path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (&self.path, None),
        }
    }
}

/// What the middleware reads once the response is finished. Values here
/// take precedence over the request's.
#[derive(Debug, Clone, Default)]
pub struct ResponseInfo {
    pub status: u16,
    pub response_length: Option<String>,
    pub user_id: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl ResponseInfo {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }
}

/// Request logging entry point.
///
/// [`RequestLogger::start`] runs when a request arrives and returns a
/// [`PendingRequest`] unless the request is ignored. Finishing it consumes
/// it, so each admitted request produces exactly one record.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    config: Arc<MiddlewareConfig>,
    logger: Option<Logger>,
}

impl RequestLogger {
    /// Emit through the process-wide logger active when each request
    /// finishes.
    pub fn new(config: MiddlewareConfig) -> Self {
        Self {
            config: Arc::new(config),
            logger: None,
        }
    }

    /// Emit through `logger` instead of the process-wide one.
    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn config(&self) -> &MiddlewareConfig {
        &self.config
    }

    /// Begin timing `request`. Returns `None` for ignored user agents.
    pub fn start(&self, request: RequestInfo) -> Option<PendingRequest> {
        if self.config.ignores(request.user_agent.as_deref()) {
            return None;
        }
        Some(PendingRequest {
            owner: self.clone(),
            request,
            started: Instant::now(),
        })
    }

    fn summarize(&self, request: RequestInfo, response: ResponseInfo, latency_ms: u64) -> RequestSummary {
        let (route, query) = request.route();
        let mut summary = RequestSummary::new(&request.method, &request.path, response.status, latency_ms);
        if let Some(length) = response.response_length {
            summary = summary.with_response_length(length);
        }

        if let Some(redaction) = self.config.redaction_for(&request.method, route, response.status) {
            summary.request_body = response
                .body
                .or_else(|| request.body.clone())
                .map(|body| redact(&body, &redaction));
            summary.request_query = query
                .map(parse_query)
                .filter(|q| !q.is_empty())
                .map(|q| redact(&serde_json::Value::Object(q), &redaction));
        }

        summary.url = request.url;
        summary.request_length = request.request_length;
        summary.referer = request.referer;
        summary.remote_ip = request.remote_ip;
        summary.server_ip = request.server_ip;
        summary.protocol = request.protocol;
        summary.user_agent = request.user_agent;
        summary.user_id = response.user_id.or(request.user_id);
        summary
    }
}

/// An admitted request waiting for its response.
#[derive(Debug)]
pub struct PendingRequest {
    owner: RequestLogger,
    request: RequestInfo,
    started: Instant,
}

impl PendingRequest {
    /// Emit the request record with the latency measured since
    /// [`RequestLogger::start`].
    pub fn finish(self, response: ResponseInfo) -> RequestSummary {
        let latency_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.finish_with_latency(response, latency_ms)
    }

    /// Emit the request record with an externally measured latency.
    pub fn finish_with_latency(self, response: ResponseInfo, latency_ms: u64) -> RequestSummary {
        let PendingRequest { owner, request, .. } = self;
        let summary = owner.summarize(request, response, latency_ms);
        match &owner.logger {
            Some(logger) => logger.format_request(&summary),
            None => crate::init::current().format_request(&summary),
        }
        summary
    }
}

/// Decode a query string into an object. Repeated keys collect into an
/// array in order of appearance.
pub fn parse_query(query: &str) -> Fields {
    let mut fields = Fields::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_component(key);
        let value = serde_json::Value::String(decode_component(value));
        match fields.get_mut(&key) {
            Some(serde_json::Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = serde_json::Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key, value);
            }
        }
    }
    fields
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => Cow::into_owned(decoded),
        Err(_) => spaced,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn parses_query_strings() {
        let query = parse_query("bar=baz&tag=a&tag=b%20c&q=x+y&flag");
        assert_eq!(
            serde_json::Value::Object(query),
            json!({"bar": "baz", "tag": ["a", "b c"], "q": "x y", "flag": ""})
        );
        assert!(parse_query("").is_empty());
    }

    #[test]
    fn default_ignores_health_checks() {
        let config = MiddlewareConfig::default();
        assert!(config.ignores(Some("GoogleHC/1.0")));
        assert!(config.ignores(Some("kube-probe/1.26")));
        assert!(!config.ignores(Some("curl/8.0")));
        assert!(!config.ignores(None));
    }

    #[test]
    fn custom_agents_add_to_defaults() {
        let config = MiddlewareConfig::default()
            .ignore_user_agent("Foobar")
            .ignore_user_agent_pattern("(?i)^foo")
            .unwrap();
        assert!(config.ignores(Some("Foobar")));
        assert!(config.ignores(Some("fooBot")));
        assert!(config.ignores(Some("GoogleHC/1.0")));
    }

    #[test]
    fn recording_is_opt_in() {
        let config = MiddlewareConfig::default();
        assert!(config.redaction_for("POST", "/foo", 500).is_none());

        let config = config.record_params(true);
        assert!(config.redaction_for("POST", "/foo", 400).is_some());
        assert!(config.redaction_for("POST", "/foo", 399).is_none());
    }

    #[test]
    fn route_rules_match_method_path_and_status() {
        let config = MiddlewareConfig::default().record_params(vec![
            RouteRule::new("/login").method("post"),
            RouteRule::new(Matcher::pattern("^/api/").unwrap()).status(500),
        ]);
        assert!(config.redaction_for("POST", "/login", 401).is_some());
        assert!(config.redaction_for("GET", "/login", 401).is_none());
        assert!(config.redaction_for("POST", "/login", 200).is_none());
        assert!(config.redaction_for("GET", "/api/users", 404).is_none());
        assert!(config.redaction_for("GET", "/api/users", 503).is_some());
    }

    #[test]
    fn route_path_excludes_query() {
        let request = RequestInfo::new("GET", "/foo?bar=baz");
        assert_eq!(request.route(), ("/foo", Some("bar=baz")));
        let request = RequestInfo::new("GET", "/foo");
        assert_eq!(request.route(), ("/foo", None));
    }
}
