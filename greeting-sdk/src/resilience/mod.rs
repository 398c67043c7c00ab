//! Resilience patterns for the greeting calls
//!
//! Asynchronous calls treat a poll timeout as "not ready yet" and ask again.
//! This module owns the schedule of those re-polls.

mod poll;

pub use poll::{PollPolicy, PollSchedule};
