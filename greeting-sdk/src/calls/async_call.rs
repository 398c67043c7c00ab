//! Submit-then-poll call
//!
//! An [`AsyncCall`] moves through `Submitting -> Polling -> Terminal`. The
//! ticket handed out by the submit step lives only in the `Polling` state and
//! is reused for every poll of this call. A 408 from the retrieve endpoint is
//! the "not ready yet" signal: the call sleeps for the policy's delay and polls
//! again, for as long as the policy allows (forever by default).

use std::time::Instant;

use log::{info, warn};
use reqwest::StatusCode;

use super::{CallRequest, Outcome};
use crate::error::{ErrorContext, Result, ServiceError};
use crate::resilience::{PollPolicy, PollSchedule};
use crate::services::greeting::{CallMode, Ticket, TicketQuery, TicketResponse};
use crate::transport::GreetingTransport;
use crate::util::elapsed_secs;

/// Lifecycle state of an asynchronous call
#[derive(Debug, Clone, PartialEq)]
pub enum CallState {
    /// Nothing sent yet
    Submitting,
    /// Ticket obtained, waiting for a non-408 retrieve
    Polling { ticket: Ticket },
    /// Final outcome reached; no more network activity
    Terminal(Outcome),
}

/// Result of driving an asynchronous call to completion
#[derive(Debug, Clone, PartialEq)]
pub struct CallReport {
    /// The call's outcome
    pub outcome: Outcome,

    /// Retrieve requests sent
    pub polls: u32,

    /// Delays waited between a 408 and the next poll
    pub retry_delays: u32,
}

/// One asynchronous call and its private state
pub struct AsyncCall<'a, T: ?Sized> {
    transport: &'a T,
    request: CallRequest,
    policy: &'a PollPolicy,
    schedule: PollSchedule,
    state: CallState,
    polls: u32,
    started_at: Instant,
}

impl<'a, T> AsyncCall<'a, T>
where
    T: GreetingTransport + ?Sized,
{
    /// Create a call in the `Submitting` state
    pub fn new(transport: &'a T, request: CallRequest, policy: &'a PollPolicy) -> Self {
        Self {
            transport,
            request,
            policy,
            schedule: policy.schedule(),
            state: CallState::Submitting,
            polls: 0,
            started_at: Instant::now(),
        }
    }

    /// Current state
    pub fn state(&self) -> &CallState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, CallState::Terminal(_))
    }

    /// Advance by one transition: one submit, or one poll plus its retry delay
    ///
    /// Stepping a terminal call does nothing.
    pub async fn step(&mut self) -> Result<()> {
        let ticket = match &self.state {
            CallState::Submitting => None,
            CallState::Polling { ticket } => Some(ticket.clone()),
            CallState::Terminal(_) => return Ok(()),
        };

        let next = match ticket {
            None => self.submit().await?,
            Some(ticket) => self.poll(ticket).await?,
        };

        self.state = next;
        Ok(())
    }

    /// Drive the call until it is terminal
    pub async fn run(mut self) -> Result<CallReport> {
        while !self.is_terminal() {
            self.step().await?;
        }

        let retry_delays = self.schedule.retries();
        match self.state {
            CallState::Terminal(outcome) => Ok(CallReport {
                outcome,
                polls: self.polls,
                retry_delays,
            }),
            _ => Err(ServiceError::internal("Asynchronous call stopped before reaching a terminal state")),
        }
    }

    async fn submit(&mut self) -> Result<CallState> {
        self.started_at = Instant::now();
        info!(
            "Making asynchronous request for {} in {}...",
            self.request.subject.name, self.request.language
        );

        let response = self
            .transport
            .submit(&self.request.query(CallMode::Async), &self.request.subject)
            .await?;

        if response.status != StatusCode::ACCEPTED {
            let outcome = Outcome::from_response(&response);
            warn!(
                "Failed to get ticket for async request due to {}: {}",
                response.status.as_u16(),
                response.body
            );
            return Ok(CallState::Terminal(outcome));
        }

        match serde_json::from_str::<TicketResponse>(&response.body) {
            Ok(ticket) => {
                info!(
                    "Got ticket {} in {:.2} seconds",
                    ticket.ticket,
                    elapsed_secs(self.started_at)
                );
                self.schedule = self.policy.schedule();
                Ok(CallState::Polling { ticket: ticket.ticket })
            }
            Err(e) => {
                warn!("Accepted async request carried no usable ticket: {}", e);
                Ok(CallState::Terminal(Outcome::malformed(response.status, &response.body, e)))
            }
        }
    }

    async fn poll(&mut self, ticket: Ticket) -> Result<CallState> {
        let query = TicketQuery {
            ticket,
            timeout: Some(self.policy.poll_wait),
        };

        self.polls += 1;
        let response = self.transport.retrieve(&query).await?;

        if response.status == StatusCode::REQUEST_TIMEOUT {
            let delay = self.schedule.next_delay().ok_or_else(|| {
                ServiceError::timeout(format!(
                    "Ticket {} still pending after {} polls",
                    query.ticket, self.polls
                ))
                .with_context(
                    ErrorContext::for_service("greeting")
                        .endpoint("retrieve")
                        .status_code(response.status.as_u16())
                        .with("ticket", &query.ticket)
                        .with("polls", self.polls),
                )
            })?;

            info!("Timeout while waiting for async response; will try again...");
            tokio::time::sleep(delay).await;
            return Ok(CallState::Polling { ticket: query.ticket });
        }

        info!(
            "Async request returned {} in {:.2} seconds",
            response.status.as_u16(),
            elapsed_secs(self.started_at)
        );
        Ok(CallState::Terminal(Outcome::from_response(&response)))
    }
}

/// Perform one asynchronous call to completion
pub async fn async_call<T>(transport: &T, request: CallRequest, policy: &PollPolicy) -> Result<Outcome>
where
    T: GreetingTransport + ?Sized,
{
    AsyncCall::new(transport, request, policy)
        .run()
        .await
        .map(|report| report.outcome)
}
