//! Core abstractions for the Greeting SDK
//!
//! This module provides the trait interface that every call operation uses to
//! reach the service:
//!
//! - `GreetingTransport`: the shared connection context, one per dispatch
//! - `RawResponse`: a status plus undecoded body, interpreted by the calls

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::error::Result;
use crate::services::greeting::{GreetingQuery, SubjectPayload, TicketQuery};

/// A response as received from the service, before schema decoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status of the response
    pub status: StatusCode,

    /// Response body as text
    pub body: String,
}

impl RawResponse {
    /// Create a new raw response
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Trait responsible for the two exchanges the call operations need
///
/// Implementations must tolerate concurrent use through a shared reference;
/// every in-flight call borrows the same transport.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GreetingTransport: Send + Sync {
    /// Send a request to the submit endpoint
    async fn submit(&self, query: &GreetingQuery, payload: &SubjectPayload) -> Result<RawResponse>;

    /// Send a request to the retrieve endpoint
    async fn retrieve(&self, query: &TicketQuery) -> Result<RawResponse>;
}
