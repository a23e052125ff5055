//! Verify error classification against the JSON vectors in `test-vectors/`.
//!
//! Each case is a simulated error response and the taxonomy kind and message
//! the decoder must produce for it.

use soroscan::{decode, ApiErrorKind, Error, HttpResponse, NoContent, TrackedContract};

fn parse_kind(s: &str) -> ApiErrorKind {
    match s {
        "Validation" => ApiErrorKind::Validation,
        "Auth" => ApiErrorKind::Auth,
        "NotFound" => ApiErrorKind::NotFound,
        "RateLimit" => ApiErrorKind::RateLimit,
        "Other" => ApiErrorKind::Other,
        other => panic!("unknown kind: {other}"),
    }
}

#[test]
fn status_test_vectors() {
    let raw = include_str!("../../test-vectors/status.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let status = case["status"].as_u64().unwrap() as u16;
        let mut response = HttpResponse::new(status, case["body"].as_str().unwrap());
        if let Some(retry_after) = case["retry_after"].as_str() {
            response = response.with_header("Retry-After", retry_after);
        }

        // The expected shape must not matter once the status is an error.
        for err in [
            decode::<TrackedContract>(&response).unwrap_err(),
            decode::<NoContent>(&response).unwrap_err(),
        ] {
            let api = match err {
                Error::Api(api) => api,
                other => panic!("{name}: expected an API error, got {other:?}"),
            };
            assert_eq!(api.kind, parse_kind(case["expected_kind"].as_str().unwrap()), "{name}: kind");
            assert_eq!(api.status_code, status, "{name}: status");
            assert_eq!(api.message, case["expected_message"].as_str().unwrap(), "{name}: message");
            assert_eq!(api.retry_after.as_deref(), case["retry_after"].as_str(), "{name}: retry_after");
        }
    }
}

#[test]
fn every_error_status_is_classified() {
    for status in 400u16..600 {
        let err = decode::<NoContent>(&HttpResponse::new(status, "")).unwrap_err();
        let expected = match status {
            400 => ApiErrorKind::Validation,
            401 | 403 => ApiErrorKind::Auth,
            404 => ApiErrorKind::NotFound,
            429 => ApiErrorKind::RateLimit,
            _ => ApiErrorKind::Other,
        };
        assert_eq!(err.api_kind(), Some(expected), "status {status}");
    }
}

#[test]
fn success_statuses_decode() {
    for status in [200u16, 201, 202, 204] {
        assert!(decode::<NoContent>(&HttpResponse::new(status, "")).is_ok(), "status {status}");
    }
}
