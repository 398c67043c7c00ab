//! Terminal result of one call

use reqwest::StatusCode;

use crate::error::mapping::{map_malformed_response, map_transport_error, TRANSPORT_FAILURE_STATUS};
use crate::error::ServiceError;
use crate::services::greeting::{ErrorEnvelope, SuccessEnvelope};
use crate::transport::RawResponse;

/// What one call, sync or async, resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The service answered 200 with a well-formed result
    Success(SuccessEnvelope),

    /// Anything else, with the status it was reported under
    Failure { status: u16, error: ErrorEnvelope },
}

impl Outcome {
    /// Interpret a terminal response: 200 decodes as success, everything else as an error envelope
    pub fn from_response(response: &RawResponse) -> Self {
        let status = response.status;

        if status == StatusCode::OK {
            match serde_json::from_str::<SuccessEnvelope>(&response.body) {
                Ok(envelope) => Outcome::Success(envelope),
                Err(e) => Self::malformed(status, &response.body, e),
            }
        } else {
            match serde_json::from_str::<ErrorEnvelope>(&response.body) {
                Ok(error) => Outcome::Failure {
                    status: status.as_u16(),
                    error,
                },
                Err(e) => Self::malformed(status, &response.body, e),
            }
        }
    }

    /// Failure for a response whose body does not match its schema
    pub fn malformed(status: StatusCode, body: &str, reason: impl ToString) -> Self {
        Outcome::Failure {
            status: status.as_u16(),
            error: map_malformed_response(status, body, reason),
        }
    }

    /// Failure for a call that never got a terminal HTTP response
    pub fn transport_failure(error: &ServiceError) -> Self {
        Outcome::Failure {
            status: TRANSPORT_FAILURE_STATUS,
            error: map_transport_error(error),
        }
    }

    /// Status the outcome is reported under
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Success(_) => StatusCode::OK.as_u16(),
            Outcome::Failure { status, .. } => *status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}
