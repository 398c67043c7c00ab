//! Concurrent dispatch of greeting calls
//!
//! The dispatcher launches every sync and async call of a plan at once over a
//! single shared transport, waits for all of them and hands back their
//! outcomes in construction order: the sync block by index, then the async
//! block by index, whatever order they finished in.

mod aggregate;

pub use aggregate::{aggregate, Aggregate, Summary};

use std::time::Duration;

use futures::future::{join_all, try_join_all};
use log::{info, warn};
use tokio::sync::Semaphore;

use crate::calls::{async_call, sync_call, CallRequest, Outcome};
use crate::config::DriverConfig;
use crate::error::{Result, ServiceError};
use crate::resilience::PollPolicy;
use crate::services::greeting::{GreetingClient, Language};
use crate::transport::GreetingTransport;

/// Age sent with every synchronous subject
pub const SYNC_SUBJECT_AGE: u8 = 18;

/// Age sent with every asynchronous subject
pub const ASYNC_SUBJECT_AGE: u8 = 25;

/// What a transport failure inside one call does to the dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportFailurePolicy {
    /// The failing call resolves to a status-0 failure outcome; siblings carry on
    #[default]
    Isolate,
    /// The whole dispatch fails with the first transport error
    Abort,
}

/// How many calls to launch and what they send
#[derive(Debug, Clone)]
pub struct DispatchPlan {
    pub sync_count: usize,
    pub async_count: usize,
    pub language: Language,
    pub call_timeout: Option<Duration>,
    pub name_prefix: String,
    pub max_in_flight: Option<usize>,
    pub failure_policy: TransportFailurePolicy,
    pub poll: PollPolicy,
}

impl DispatchPlan {
    /// A plan with default call settings
    pub fn new(sync_count: usize, async_count: usize) -> Self {
        Self::from_config(sync_count, async_count, &DriverConfig::default())
    }

    /// A plan taking its call settings from the driver configuration
    pub fn from_config(sync_count: usize, async_count: usize, config: &DriverConfig) -> Self {
        Self {
            sync_count,
            async_count,
            language: config.language,
            call_timeout: config.call_timeout,
            name_prefix: config.name_prefix.clone(),
            max_in_flight: config.max_in_flight,
            failure_policy: config.failure_policy,
            poll: config.poll.clone(),
        }
    }

    /// Number of calls the plan launches
    pub fn total(&self) -> usize {
        self.sync_count + self.async_count
    }

    fn request(&self, index: usize, age: u8) -> CallRequest {
        CallRequest::new(
            format!("{}{}", self.name_prefix, index),
            age,
            self.language,
            self.call_timeout,
        )
    }

    fn operations(&self) -> Vec<Operation> {
        let sync = (0..self.sync_count).map(|i| Operation::Sync(self.request(i, SYNC_SUBJECT_AGE)));
        let asynchronous = (0..self.async_count).map(|i| Operation::Async(self.request(i, ASYNC_SUBJECT_AGE)));

        sync.chain(asynchronous).collect()
    }
}

enum Operation {
    Sync(CallRequest),
    Async(CallRequest),
}

/// Launch every call of the plan concurrently and collect their outcomes in order
pub async fn dispatch<T>(transport: &T, plan: &DispatchPlan) -> Result<Vec<Outcome>>
where
    T: GreetingTransport + ?Sized,
{
    if plan.max_in_flight == Some(0) {
        return Err(ServiceError::validation("max_in_flight must be at least 1"));
    }

    plan.poll.validate()?;

    let limiter = plan
        .max_in_flight
        .map(|permits| Semaphore::new(permits.min(Semaphore::MAX_PERMITS)));

    info!(
        "Dispatching {} blocking and {} asynchronous requests",
        plan.sync_count, plan.async_count
    );

    let launched = plan
        .operations()
        .into_iter()
        .enumerate()
        .map(|(index, operation)| run_operation(transport, &plan.poll, limiter.as_ref(), index, operation));

    match plan.failure_policy {
        TransportFailurePolicy::Isolate => Ok(join_all(launched)
            .await
            .into_iter()
            .map(|result| result.unwrap_or_else(|e| Outcome::transport_failure(&e)))
            .collect()),
        TransportFailurePolicy::Abort => try_join_all(launched).await,
    }
}

async fn run_operation<T>(
    transport: &T,
    poll: &PollPolicy,
    limiter: Option<&Semaphore>,
    index: usize,
    operation: Operation,
) -> Result<Outcome>
where
    T: GreetingTransport + ?Sized,
{
    let _permit = match limiter {
        Some(limiter) => Some(
            limiter
                .acquire()
                .await
                .map_err(|e| ServiceError::internal(format!("Dispatch limiter closed: {}", e)))?,
        ),
        None => None,
    };

    let result = match operation {
        Operation::Sync(request) => sync_call(transport, &request).await,
        Operation::Async(request) => async_call(transport, request, poll).await,
    };

    result.map_err(|e| {
        warn!("Call #{} ended without a service answer: {}", index, e);
        e.with_context_value("call", index)
    })
}

/// Open a connection to the service, dispatch the plan and aggregate the outcomes
///
/// The client is created here and dropped when this function returns, on
/// success and on every error path.
pub async fn run(config: &DriverConfig, plan: &DispatchPlan) -> Result<Aggregate> {
    let client = GreetingClient::new_with_config(config.service.clone())?;

    if config.check_status {
        let status = client.status().await?;
        info!(
            "Service at {} has handled {} requests and holds {} tickets",
            client.config().base_url,
            status.request_count,
            status.ticket_count
        );
    }

    let outcomes = dispatch(&client, plan).await?;
    Ok(aggregate(outcomes))
}
