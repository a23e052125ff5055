//! Error types for the SoroScan client.
//!
//! # Design
//! Every failure a caller can see is one variant of [`Error`], and every
//! variant's payload is itself a closed enum or struct, so a `match` over a
//! client result is exhaustive. API failures share one record type,
//! [`ApiError`], tagged with an [`ApiErrorKind`] derived from the status code.

use std::fmt;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Any failure returned by a client operation.
#[derive(Debug, Error)]
pub enum Error {
    /// The server answered with a non-2xx status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never produced a response.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A 2xx response whose body could not be turned into the expected type.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The client was closed before this call.
    #[error("client is closed")]
    Closed,

    /// An operation argument failed local validation; nothing was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The client configuration is unusable.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.api().map(|err| err.status_code)
    }

    pub fn api_kind(&self) -> Option<ApiErrorKind> {
        self.api().map(|err| err.kind)
    }

    pub fn is_not_found(&self) -> bool {
        self.api_kind() == Some(ApiErrorKind::NotFound)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Error::Closed)
    }
}

/// Classification of a non-2xx response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// 400
    Validation,
    /// 401 or 403
    Auth,
    /// 404
    NotFound,
    /// 429
    RateLimit,
    /// Any other 4xx/5xx status.
    Other,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => ApiErrorKind::Validation,
            401 | 403 => ApiErrorKind::Auth,
            404 => ApiErrorKind::NotFound,
            429 => ApiErrorKind::RateLimit,
            _ => ApiErrorKind::Other,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Validation => "validation failed",
            ApiErrorKind::Auth => "authentication failed",
            ApiErrorKind::NotFound => "not found",
            ApiErrorKind::RateLimit => "rate limit exceeded",
            ApiErrorKind::Other => "API error",
        };
        f.write_str(label)
    }
}

/// A failed API call as reported by the server.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} (HTTP {status_code}): {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status_code: u16,
    pub message: String,
    /// The decoded error body. Non-JSON bodies are kept as a JSON string.
    pub response_data: Option<Value>,
    /// Raw `Retry-After` header value, only read for 429 responses.
    pub retry_after: Option<String>,
}

impl ApiError {
    /// `Retry-After` in its delta-seconds form. HTTP-date values yield `None`.
    pub fn retry_after_secs(&self) -> Option<Duration> {
        self.retry_after
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Per-field messages from a 400 body shaped like
    /// `{"field": ["msg", ...], ...}`. Non-list values are stringified.
    pub fn field_errors(&self) -> Vec<(String, Vec<String>)> {
        let Some(Value::Object(map)) = &self.response_data else {
            return Vec::new();
        };
        map.iter()
            .filter(|(field, _)| field.as_str() != "detail")
            .map(|(field, value)| {
                let messages = match value {
                    Value::Array(items) => items.iter().map(value_text).collect(),
                    other => vec![value_text(other)],
                };
                (field.clone(), messages)
            })
            .collect()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Why a request failed before a response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    /// Connection refused, reset, or the host could not be resolved.
    Connect,
    /// Anything else the HTTP engine reported.
    Io,
}

#[derive(Debug, Error)]
#[error("transport error ({kind:?}): {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == TransportErrorKind::Timeout
    }
}

/// A successful status whose body could not be decoded.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The body is not JSON at all.
    #[error("malformed response body (HTTP {status}): {source}")]
    MalformedBody {
        status: u16,
        #[source]
        source: serde_json::Error,
    },

    /// The body is JSON but does not match the expected model.
    #[error("response schema mismatch (HTTP {status}): {source}")]
    SchemaMismatch {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn api_error(status: u16, data: Option<Value>) -> ApiError {
        ApiError {
            kind: ApiErrorKind::from_status(status),
            status_code: status,
            message: "boom".to_string(),
            response_data: data,
            retry_after: None,
        }
    }

    #[test]
    fn status_classification() {
        assert_eq!(ApiErrorKind::from_status(400), ApiErrorKind::Validation);
        assert_eq!(ApiErrorKind::from_status(401), ApiErrorKind::Auth);
        assert_eq!(ApiErrorKind::from_status(403), ApiErrorKind::Auth);
        assert_eq!(ApiErrorKind::from_status(404), ApiErrorKind::NotFound);
        assert_eq!(ApiErrorKind::from_status(429), ApiErrorKind::RateLimit);
        for status in [402, 409, 422, 500, 503] {
            assert_eq!(ApiErrorKind::from_status(status), ApiErrorKind::Other, "{status}");
        }
    }

    #[test]
    fn field_errors_from_validation_body() {
        let err = api_error(
            400,
            Some(json!({"contract_id": ["This field is required."], "name": "too long"})),
        );
        let fields = err.field_errors();
        assert!(fields.contains(&("contract_id".to_string(), vec!["This field is required.".to_string()])));
        assert!(fields.contains(&("name".to_string(), vec!["too long".to_string()])));
    }

    #[test]
    fn field_errors_ignore_non_object_bodies() {
        assert!(api_error(400, Some(json!("plain text"))).field_errors().is_empty());
        assert!(api_error(400, None).field_errors().is_empty());
    }

    #[test]
    fn retry_after_seconds() {
        let mut err = api_error(429, None);
        err.retry_after = Some("120".to_string());
        assert_eq!(err.retry_after_secs(), Some(Duration::from_secs(120)));
        err.retry_after = Some("Wed, 21 Oct 2015 07:28:00 GMT".to_string());
        assert_eq!(err.retry_after_secs(), None);
    }

    #[test]
    fn error_accessors() {
        let err = Error::from(api_error(404, None));
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));
        assert!(!err.is_closed());
        assert!(Error::Closed.is_closed());
        assert_eq!(Error::Closed.status_code(), None);
    }

    #[test]
    fn display_includes_status_and_message() {
        let err = api_error(500, None);
        assert_eq!(err.to_string(), "API error (HTTP 500): boom");
    }
}
