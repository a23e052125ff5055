//! Response decoding: raw `HttpResponse` to typed result or typed error.
//!
//! Decoding runs in two steps for successful statuses. The body is first
//! parsed as untyped JSON, which separates "not JSON at all"
//! ([`DecodeError::MalformedBody`]) from "JSON of the wrong shape"
//! ([`DecodeError::SchemaMismatch`]). An empty body decodes as `null`, so
//! only shapes that accept `null` (such as [`NoContent`](crate::NoContent))
//! succeed on it.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiErrorKind, DecodeError, Error};
use crate::http::HttpResponse;

pub fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T, Error> {
    if !response.is_success() {
        let err = classify(response);
        debug!(status = err.status_code, kind = ?err.kind, "API request failed");
        return Err(err.into());
    }

    let value = if response.body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice::<Value>(&response.body).map_err(|source| DecodeError::MalformedBody {
            status: response.status,
            source,
        })?
    };

    serde_json::from_value(value).map_err(|source| {
        DecodeError::SchemaMismatch {
            status: response.status,
            source,
        }
        .into()
    })
}

/// Build the error record for a non-2xx response.
pub fn classify(response: &HttpResponse) -> ApiError {
    let kind = ApiErrorKind::from_status(response.status);
    let text = response.text();
    let response_data = if text.trim().is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text.clone())))
    };

    let message = response_data
        .as_ref()
        .and_then(error_message)
        .or_else(|| Some(text.trim().to_string()).filter(|t| !t.is_empty()))
        .unwrap_or_else(|| kind.to_string());

    let retry_after = match kind {
        ApiErrorKind::RateLimit => response.header("retry-after").map(str::to_string),
        _ => None,
    };

    ApiError {
        kind,
        status_code: response.status,
        message,
        response_data,
        retry_after,
    }
}

/// `detail`, then `error`, from a JSON object body.
fn error_message(data: &Value) -> Option<String> {
    ["detail", "error"]
        .iter()
        .filter_map(|key| data.get(key))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Null => None,
            Value::String(_) => None,
            other => Some(other.to_string()),
        })
}
