//! Greeting service client implementation
//!
//! This module provides the HTTP client for the greeting service. One client
//! is the connection context shared by every call of a dispatch; reqwest pools
//! and reuses the underlying connections.

mod models;
pub use models::*;

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, StatusCode};
use url::Url;

use crate::config::{GreetingServiceConfig, ServiceConfig};
use crate::error::{Result, ServiceError};
use crate::services::common::{build_http_client, create_error_context, read_raw_response, UserAgent};
use crate::transport::{GreetingTransport, RawResponse};

const SERVICE_NAME: &str = "greeting";
const SUBMIT_ENDPOINT: &str = "request";
const RETRIEVE_ENDPOINT: &str = "retrieve";
const STATUS_ENDPOINT: &str = "status";

/// Greeting service client
#[derive(Debug, Clone)]
pub struct GreetingClient {
    /// HTTP client
    http_client: Client,

    /// Configuration
    config: GreetingServiceConfig,

    /// Parsed base URL, always ending in a slash
    base_url: Url,
}

impl GreetingClient {
    /// Create a new client with custom configuration
    pub fn new_with_config(config: GreetingServiceConfig) -> Result<Self> {
        config.validate()?;
        let base_url = config.parsed_base_url()?;

        let http_client = build_http_client(
            Some(UserAgent {
                extra: config.user_agent.clone().or_else(|| UserAgent::default().extra),
                ..UserAgent::default()
            }),
            config.request_timeout(),
        )?;

        Ok(Self {
            http_client,
            config,
            base_url,
        })
    }

    /// Create a new builder for the greeting client
    pub fn builder() -> GreetingClientBuilder {
        GreetingClientBuilder::default()
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &GreetingServiceConfig {
        &self.config
    }

    /// Fetch the service's status report
    pub async fn status(&self) -> Result<StatusResponse> {
        let url = self.endpoint_url(STATUS_ENDPOINT)?;
        debug!("Sending request to greeting service: GET {}", url);

        let response = self.http_client.get(url).send().await?;
        let raw = read_raw_response(SERVICE_NAME, STATUS_ENDPOINT, response).await?;

        if raw.status != StatusCode::OK {
            return Err(ServiceError::network(format!(
                "Status endpoint answered {}",
                raw.status
            ))
            .with_context(create_error_context(SERVICE_NAME, STATUS_ENDPOINT).status_code(raw.status.as_u16())));
        }

        serde_json::from_str(&raw.body).map_err(|e| {
            ServiceError::parsing(format!("Failed to parse status response: {}", e))
                .with_context(create_error_context(SERVICE_NAME, STATUS_ENDPOINT))
        })
    }

    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        self.base_url
            .join(endpoint)
            .map_err(|e| ServiceError::validation(format!("Invalid endpoint {}: {}", endpoint, e)))
    }
}

#[async_trait]
impl GreetingTransport for GreetingClient {
    async fn submit(&self, query: &GreetingQuery, payload: &SubjectPayload) -> Result<RawResponse> {
        let url = self.endpoint_url(SUBMIT_ENDPOINT)?;
        debug!("Sending request to greeting service: POST {}", url);

        let response = self
            .http_client
            .post(url)
            .query(&query.to_query_params())
            .json(payload)
            .send()
            .await?;

        read_raw_response(SERVICE_NAME, SUBMIT_ENDPOINT, response).await
    }

    async fn retrieve(&self, query: &TicketQuery) -> Result<RawResponse> {
        let url = self.endpoint_url(RETRIEVE_ENDPOINT)?;
        debug!("Sending request to greeting service: GET {} (ticket {})", url, query.ticket);

        let response = self
            .http_client
            .get(url)
            .query(&query.to_query_params())
            .send()
            .await?;

        read_raw_response(SERVICE_NAME, RETRIEVE_ENDPOINT, response).await
    }
}

/// Builder for the greeting client
#[derive(Default)]
pub struct GreetingClientBuilder {
    /// Base URL for the API
    base_url: Option<String>,

    /// Request timeout
    timeout: Option<Duration>,

    /// Extra user agent information
    user_agent: Option<String>,
}

impl GreetingClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the transport timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set extra user agent information
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Build the greeting client
    pub fn build(self) -> Result<GreetingClient> {
        let mut config = GreetingServiceConfig::default();

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(timeout) = self.timeout {
            config.request_timeout = Some(timeout);
        }

        if let Some(user_agent) = self.user_agent {
            config.user_agent = Some(user_agent);
        }

        GreetingClient::new_with_config(config)
    }
}
