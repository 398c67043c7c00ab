//! Greeting service data models
//!
//! This module contains type definitions for greeting service requests and responses.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ServiceError;

/// Opaque correlation token handed out by an asynchronous submit
pub type Ticket = String;

/// Free-form metadata attached to service responses
pub type Metadata = HashMap<String, Value>;

/// Languages accepted by the greeting service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "zh")]
    Chinese,
}

impl Language {
    /// Wire code of the language
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Spanish => "es",
            Self::Chinese => "zh",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Self::English),
            "es" => Ok(Self::Spanish),
            "zh" => Ok(Self::Chinese),
            other => Err(ServiceError::validation(format!(
                "Unsupported language `{}`; expected one of en, es, zh",
                other
            ))),
        }
    }
}

/// How the service should process a submitted request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallMode {
    /// Hold the connection until the result is ready
    Sync,
    /// Answer 202 with a ticket straight away
    Async,
}

impl CallMode {
    fn is_async(&self) -> bool {
        matches!(self, Self::Async)
    }
}

/// Query parameters for the submit endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreetingQuery {
    /// Language of the greeting
    pub language: Language,

    /// How long the service may spend on the request
    pub timeout: Option<Duration>,

    /// Processing mode
    pub mode: CallMode,
}

impl GreetingQuery {
    /// Convert parameters to query parameters for the API request
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("language", self.language.code().to_string())];

        if let Some(timeout) = self.timeout {
            params.push(("timeout", timeout.as_secs_f64().to_string()));
        }

        params.push(("async", self.mode.is_async().to_string()));
        params
    }
}

/// Request body for the submit endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectPayload {
    pub name: String,
    pub age: u8,
}

/// The greeting computed by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GreetingResult {
    pub greeting: String,
    pub answer_id: u64,
}

/// Body of every terminal 200 response, sync or async
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuccessEnvelope {
    pub ticket: Ticket,
    #[serde(default)]
    pub metadata: Metadata,
    pub output: GreetingResult,
}

/// Body of every terminal non-200 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// Identifier for the type of error in PascalCase, e.g. `InvalidConfiguration`
    pub error: String,

    /// The HTTP status code the service answered with
    pub status_code: u16,

    /// Additional details, passed through uninterpreted
    #[serde(default, deserialize_with = "null_as_empty")]
    pub details: HashMap<String, Value>,
}

impl ErrorEnvelope {
    /// Create a new envelope without details
    pub fn new(error: impl Into<String>, status_code: u16) -> Self {
        Self {
            error: error.into(),
            status_code,
            details: HashMap::new(),
        }
    }

    /// Add a detail entry
    pub fn with_detail(mut self, key: impl Into<String>, value: Value) -> Self {
        self.details.insert(key.into(), value);
        self
    }
}

impl fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = reqwest::StatusCode::from_u16(self.status_code)
            .ok()
            .and_then(|status| status.canonical_reason());

        match reason {
            Some(reason) => write!(f, "{}: {}", reason, self.error),
            None => write!(f, "{}: {}", self.status_code, self.error),
        }
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<HashMap<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<HashMap<String, Value>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Body of a 202 answer to an asynchronous submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketResponse {
    pub ticket: Ticket,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Query parameters for the retrieve endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketQuery {
    /// Ticket from the submit step
    pub ticket: Ticket,

    /// Server-side long-poll budget
    pub timeout: Option<Duration>,
}

impl TicketQuery {
    /// Convert parameters to query parameters for the API request
    pub fn to_query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("ticket", self.ticket.clone())];

        if let Some(timeout) = self.timeout {
            params.push(("timeout", timeout.as_secs_f64().to_string()));
        }

        params
    }
}

/// Body of the status endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub metadata: Metadata,
    pub request_count: u64,
    pub ticket_count: u64,
}
