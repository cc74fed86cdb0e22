use crate::level::Severity;
use crate::record::LogRecord;
use serde::Serialize;

/// What is known about one served request once its response finished.
///
/// All header-derived fields are optional; a missing header simply leaves
/// the field out of the record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestSummary {
    pub method: String,
    /// Path including the query string.
    pub path: String,
    /// Full request URL when known.
    pub url: Option<String>,
    pub status: u16,
    pub latency_ms: u64,
    /// Raw request `content-length`.
    pub request_length: Option<String>,
    /// Raw response `content-length`.
    pub response_length: Option<String>,
    /// Human readable response size, e.g. `2KB`.
    pub size: String,
    pub referer: Option<String>,
    pub remote_ip: Option<String>,
    pub server_ip: Option<String>,
    pub protocol: Option<String>,
    pub user_agent: Option<String>,
    pub user_id: Option<String>,
    pub request_body: Option<serde_json::Value>,
    pub request_query: Option<serde_json::Value>,
}

impl RequestSummary {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16, latency_ms: u64) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status,
            latency_ms,
            size: format_bytes(0),
            ..Self::default()
        }
    }

    /// Set the response length, deriving the human readable size from it.
    pub fn with_response_length(mut self, length: impl Into<String>) -> Self {
        let length = length.into();
        self.size = format_bytes(length.trim().parse().unwrap_or(0));
        self.response_length = Some(length);
        self
    }

    pub fn severity(&self) -> Severity {
        Severity::for_status(self.status)
    }

    /// `METHOD path size - latencyms`, e.g. `POST /foo 2KB - 100ms`.
    pub fn message(&self) -> String {
        format!("{} {} {} - {}ms", self.method, self.path, self.size, self.latency_ms)
    }

    pub fn http_request(&self) -> HttpRequest {
        HttpRequest {
            request_method: self.method.clone(),
            request_url: self.path.clone(),
            request_size: self.request_length.clone(),
            response_size: self.response_length.clone(),
            status: self.status,
            referer: self.referer.clone(),
            remote_ip: self.remote_ip.clone(),
            server_ip: self.server_ip.clone(),
            protocol: self.protocol.clone(),
            user_agent: self.user_agent.clone(),
            latency: format_latency(self.latency_ms),
        }
    }

    /// The structured request record:
    /// `{severity, message, httpRequest, userId?, requestBody?, requestQuery?}`.
    pub fn to_record(&self) -> LogRecord {
        let mut record = LogRecord::new(self.severity(), Some(self.message()));
        record.set("httpRequest", serde_json::to_value(self.http_request()).ok());
        record.set("userId", self.user_id.clone().map(serde_json::Value::String));
        record.set("requestBody", self.request_body.clone());
        record.set("requestQuery", self.request_query.clone());
        record
    }
}

/// Transport metadata nested under `httpRequest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpRequest {
    pub request_method: String,
    pub request_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_size: Option<String>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub latency: String,
}

/// Milliseconds as seconds with an `s` suffix: `100` -> `0.1s`.
pub fn format_latency(ms: u64) -> String {
    // u64 -> f64 is exact for any latency a request can realistically have.
    format!("{}s", ms as f64 / 1000.0)
}

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Byte count in 1024-based units with at most two decimals and trailing
/// zeros trimmed: `2048` -> `2KB`, `1536` -> `1.5KB`, `0` -> `0B`.
pub fn format_bytes(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", text, UNITS[unit])
}
