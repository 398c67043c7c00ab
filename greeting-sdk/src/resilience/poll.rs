//! Retry schedule for polling pending tickets
//!
//! A 408 from the retrieve endpoint means "not ready yet". The schedule here
//! decides how long to wait before asking again and whether to give up at
//! all; the default never gives up.

use std::fmt;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;

use crate::error::{Result, ServiceError};

/// Poll policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Long-poll budget sent to the retrieve endpoint with every poll
    pub poll_wait: Duration,

    /// Delay before the first re-poll
    pub delay: Duration,

    /// Multiplier applied to the delay after each re-poll
    pub multiplier: f64,

    /// Upper bound for a single delay
    pub max_delay: Duration,

    /// Maximum number of re-polls; `None` retries forever
    pub max_retries: Option<u32>,

    /// Maximum time to spend re-polling, counted from the moment the ticket arrives; `None` retries forever
    pub max_elapsed_time: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            poll_wait: Duration::from_secs(5),
            delay: Duration::from_secs(1),
            multiplier: 1.0,
            max_delay: Duration::from_secs(1),
            max_retries: None,
            max_elapsed_time: None,
        }
    }
}

impl fmt::Display for PollPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PollPolicy {{ poll_wait: {:?}, delay: {:?}, multiplier: {}, max_delay: {:?}, max_retries: {:?}, max_elapsed_time: {:?} }}",
            self.poll_wait, self.delay, self.multiplier, self.max_delay, self.max_retries, self.max_elapsed_time
        )
    }
}

impl PollPolicy {
    /// A policy that gives up after `max_retries` re-polls spaced by a fixed `delay`
    pub fn bounded(max_retries: u32, delay: Duration) -> Self {
        Self {
            delay,
            max_delay: delay,
            max_retries: Some(max_retries),
            ..Self::default()
        }
    }

    /// Check the policy for values that can never produce a schedule
    pub fn validate(&self) -> Result<()> {
        if !(self.multiplier >= 1.0) {
            return Err(ServiceError::configuration(format!(
                "Poll multiplier must be at least 1.0, got {}",
                self.multiplier
            )));
        }

        if self.max_delay < self.delay {
            return Err(ServiceError::configuration(format!(
                "Poll max_delay {:?} is shorter than delay {:?}",
                self.max_delay, self.delay
            )));
        }

        Ok(())
    }

    /// Start a fresh schedule for one asynchronous call
    pub fn schedule(&self) -> PollSchedule {
        let mut backoff = ExponentialBackoff {
            current_interval: self.delay,
            initial_interval: self.delay,
            max_interval: self.max_delay.max(self.delay),
            multiplier: self.multiplier,
            randomization_factor: 0.0,
            max_elapsed_time: self.max_elapsed_time,
            ..ExponentialBackoff::default()
        };
        backoff.reset();

        PollSchedule {
            backoff,
            retries: 0,
            max_retries: self.max_retries,
        }
    }
}

/// Retry schedule state owned by a single asynchronous call
#[derive(Debug)]
pub struct PollSchedule {
    backoff: ExponentialBackoff,
    retries: u32,
    max_retries: Option<u32>,
}

impl PollSchedule {
    /// Delay before the next re-poll, or `None` once the policy is exhausted
    pub fn next_delay(&mut self) -> Option<Duration> {
        if let Some(max) = self.max_retries {
            if self.retries >= max {
                return None;
            }
        }

        let delay = self.backoff.next_backoff()?;
        self.retries += 1;
        Some(delay)
    }

    /// Number of delays handed out so far
    pub fn retries(&self) -> u32 {
        self.retries
    }
}
