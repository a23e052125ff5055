//! HTTP request/response descriptors shared by both transports.
//!
//! # Design
//! Requests and responses are plain data. Operation builders produce an
//! `HttpRequest`, a transport turns it into bytes on the wire and hands back
//! an `HttpResponse`, and the decoder maps that response to a typed result.
//! Both the blocking and the async transport render the URL, headers and body
//! through the methods here, so what goes on the wire cannot differ between
//! the two modes.

use std::fmt;

use serde_json::Value;
use url::form_urlencoded;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single query-string value.
///
/// Booleans render as `true`/`false`, matching what the API's filter
/// backends accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Str(String),
    Int(i64),
    UInt(u64),
    Bool(bool),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::Str(s) => f.write_str(s),
            QueryValue::Int(n) => write!(f, "{n}"),
            QueryValue::UInt(n) => write!(f, "{n}"),
            QueryValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Str(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Str(value)
    }
}

impl From<&String> for QueryValue {
    fn from(value: &String) -> Self {
        QueryValue::Str(value.clone())
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Int(value)
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Int(i64::from(value))
    }
}

impl From<u64> for QueryValue {
    fn from(value: u64) -> Self {
        QueryValue::UInt(value)
    }
}

/// An HTTP request described as plain data.
///
/// `path` is the absolute URL without its query string. Operation builders
/// join the configured base URL with a relative endpoint path; pagination
/// cursors are used verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, QueryValue)>,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Append a query parameter. `None` drops the parameter entirely.
    pub fn query<V: Into<QueryValue>>(mut self, name: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.query.push((name.to_string(), value.into()));
        }
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Attach a JSON body and the matching content type.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self.header("content-type", "application/json")
    }

    /// The full request URL including the encoded query string.
    pub fn url(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.query {
            serializer.append_pair(name, &value.to_string());
        }
        let separator = if self.path.contains('?') { '&' } else { '?' };
        format!("{}{separator}{}", self.path, serializer.finish())
    }

    /// The serialized body, if any.
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(|body| body.to_string().into_bytes())
    }
}

/// An HTTP response described as plain data.
///
/// Both transports produce this exact shape; the decoder never sees an
/// engine-specific response type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Case-insensitive header lookup; returns the first match.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, replacing invalid UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_query_values_are_dropped() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/api/contracts/")
            .query("is_active", None::<bool>)
            .query("search", None::<&str>)
            .query("page", Some(1u32));
        assert_eq!(req.url(), "http://localhost/api/contracts/?page=1");
    }

    #[test]
    fn empty_string_is_not_absent() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/x/").query("search", Some(""));
        assert_eq!(req.url(), "http://localhost/x/?search=");
    }

    #[test]
    fn booleans_render_as_words() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/x/")
            .query("is_active", Some(true))
            .query("archived", Some(false));
        assert_eq!(req.url(), "http://localhost/x/?is_active=true&archived=false");
    }

    #[test]
    fn large_unsigned_values_render_exactly() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/api/events/").query("ledger__gte", Some(u64::MAX));
        assert_eq!(req.url(), "http://localhost/api/events/?ledger__gte=18446744073709551615");
    }

    #[test]
    fn query_values_are_encoded() {
        let req = HttpRequest::new(HttpMethod::Get, "http://localhost/x/").query("search", Some("a b&c"));
        assert_eq!(req.url(), "http://localhost/x/?search=a+b%26c");
    }

    #[test]
    fn no_query_leaves_path_untouched() {
        let req = HttpRequest::new(HttpMethod::Delete, "http://localhost/api/webhooks/3/");
        assert_eq!(req.url(), "http://localhost/api/webhooks/3/");
        assert!(req.body_bytes().is_none());
    }

    #[test]
    fn json_sets_content_type() {
        let req = HttpRequest::new(HttpMethod::Post, "http://localhost/x/").json(json!({"name": "Token"}));
        assert_eq!(
            req.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
        let body: Value = serde_json::from_slice(&req.body_bytes().unwrap()).unwrap();
        assert_eq!(body["name"], "Token");
    }

    #[test]
    fn header_lookup_ignores_case() {
        let resp = HttpResponse::new(429, "").with_header("Retry-After", "30");
        assert_eq!(resp.header("retry-after"), Some("30"));
        assert_eq!(resp.header("x-missing"), None);
    }
}
