//! Common utilities for service clients
//!
//! This module provides shared functionality for all service clients.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};

use crate::error::{ErrorContext, Result, ServiceError};
use crate::transport::RawResponse;

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Greeting-SDK".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("greeting-driver".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client
///
/// A `None` timeout leaves requests untimed; long-running synchronous calls
/// and long polls are bounded by the service instead.
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| ServiceError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    let mut builder = reqwest::Client::builder().default_headers(headers).gzip(true);

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| ServiceError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Create error context for HTTP requests
pub fn create_error_context(service_name: &str, endpoint: &str) -> ErrorContext {
    ErrorContext::for_service(service_name).endpoint(endpoint)
}

/// Read a response into a RawResponse, whatever its status
pub async fn read_raw_response(
    service_name: &str,
    endpoint: &str,
    response: reqwest::Response,
) -> Result<RawResponse> {
    let status = response.status();

    let body = response.text().await.map_err(|e| {
        ServiceError::network(format!("Failed to read response body: {}", e))
            .with_context(create_error_context(service_name, endpoint).status_code(status.as_u16()))
    })?;

    Ok(RawResponse::new(status, body))
}
