//! # Greeting SDK
//!
//! Client SDK and load driver for the greeting service.
//!
//! This crate provides:
//!
//! - Typed models for the service's queries, payloads and envelopes
//! - A reqwest-backed client sharing one connection pool across calls
//! - Synchronous calls and submit-then-poll asynchronous calls
//! - A dispatcher that runs many calls concurrently and joins them in order
//! - Aggregation of the outcomes into a success/failure summary
//!
//! ## Architecture
//!
//! - `GreetingTransport`: the connection context every call borrows
//! - `sync_call` / `AsyncCall`: one call each, resolving to an `Outcome`
//! - `dispatch`: concurrent fan-out and ordered join
//! - `aggregate`: partition and summary
//! - `ServiceError`: error handling for transport and configuration failures

// Re-export the transport seam
pub mod transport;
pub use transport::{GreetingTransport, RawResponse};

// Re-export the service client
pub mod services;
pub use services::greeting::{self, GreetingClient};

// Re-export call operations
pub mod calls;
pub use calls::{async_call, sync_call, AsyncCall, CallReport, CallRequest, Outcome};

// Re-export dispatch and aggregation
pub mod dispatch;
pub use dispatch::{aggregate, dispatch, run, Aggregate, DispatchPlan, Summary, TransportFailurePolicy};

// Re-export error handling
pub mod error;
pub use error::{ErrorContext, Result, ServiceError};

// Re-export resilience patterns
pub mod resilience;
pub use resilience::PollPolicy;

// Re-export configuration management
pub mod config;
pub use config::{ConfigProvider, DriverConfig, GreetingServiceConfig, ServiceConfig};

// Utility module for common functionality
mod util;

#[cfg(test)]
mod tests;

/// Create a client for a locally running greeting service
pub fn client() -> Result<GreetingClient> {
    GreetingClient::builder().build()
}
