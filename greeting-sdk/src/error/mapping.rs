//! Error mapping between the SDK and the greeting service
//!
//! This module converts failures that never produced a usable HTTP response
//! into the service's own [`ErrorEnvelope`] shape, so that every call can be
//! reported as an outcome.

use reqwest::StatusCode;
use serde_json::Value;

use super::ServiceError;
use crate::services::greeting::ErrorEnvelope;
use crate::util::truncate_string;

/// Status reported for outcomes that never received an HTTP response
pub const TRANSPORT_FAILURE_STATUS: u16 = 0;

/// Longest raw body kept in a synthesised envelope
pub const MAX_ECHOED_BODY: usize = 256;

/// Map a transport-level ServiceError to an ErrorEnvelope
pub fn map_transport_error(error: &ServiceError) -> ErrorEnvelope {
    let mut envelope = ErrorEnvelope::new(error.kind(), TRANSPORT_FAILURE_STATUS)
        .with_detail("message", Value::String(error.to_string()));

    if let Some(context) = error.context() {
        envelope = envelope.with_detail("service", Value::String(context.service.clone()));

        if let Some(ref endpoint) = context.endpoint {
            envelope = envelope.with_detail("endpoint", Value::String(endpoint.clone()));
        }

        if let Some(timestamp) = context.timestamp {
            envelope = envelope.with_detail("timestamp", Value::String(timestamp.to_rfc3339()));
        }

        for (key, value) in &context.data {
            envelope = envelope.with_detail(key.clone(), Value::String(value.clone()));
        }
    }

    envelope
}

/// Build the envelope for a response whose body does not match its schema
pub fn map_malformed_response(status: StatusCode, body: &str, reason: impl ToString) -> ErrorEnvelope {
    ErrorEnvelope::new("MalformedResponse", status.as_u16())
        .with_detail("message", Value::String(reason.to_string()))
        .with_detail("body", Value::String(truncate_string(body, MAX_ECHOED_BODY)))
}

/// Helper function to classify HTTP statuses by category, for progress notices
pub fn classify_http_error(status: u16) -> &'static str {
    match status {
        TRANSPORT_FAILURE_STATUS => "transport",
        400 => "validation",
        401 => "authentication",
        403 => "authorization",
        404 => "not_found",
        408 => "timeout",
        429 => "rate_limit",
        500..=599 => "server",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorContext;

    #[test]
    fn test_map_transport_error_carries_context() {
        let error = ServiceError::network("Connection refused")
            .with_context(ErrorContext::for_service("greeting").endpoint("/request").with("attempt", 1));

        let envelope = map_transport_error(&error);

        assert_eq!(envelope.error, "NetworkError");
        assert_eq!(envelope.status_code, TRANSPORT_FAILURE_STATUS);
        assert_eq!(envelope.details["service"], "greeting");
        assert_eq!(envelope.details["endpoint"], "/request");
        assert_eq!(envelope.details["attempt"], "1");
        assert!(envelope.details["message"].as_str().unwrap().contains("Connection refused"));
    }

    #[test]
    fn test_map_malformed_response_truncates_body() {
        let body = "x".repeat(1000);
        let envelope = map_malformed_response(StatusCode::OK, &body, "missing field `output`");

        assert_eq!(envelope.error, "MalformedResponse");
        assert_eq!(envelope.status_code, 200);
        assert_eq!(envelope.details["body"].as_str().unwrap().chars().count(), MAX_ECHOED_BODY);
    }

    #[test]
    fn test_classify_http_error() {
        assert_eq!(classify_http_error(0), "transport");
        assert_eq!(classify_http_error(408), "timeout");
        assert_eq!(classify_http_error(503), "server");
        assert_eq!(classify_http_error(418), "unknown");
    }
}
