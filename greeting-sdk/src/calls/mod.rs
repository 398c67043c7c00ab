//! The two ways of calling the greeting service
//!
//! - `sync_call`: one blocking request/response exchange
//! - `async_call`: submit for a ticket, then poll until the result is ready
//!
//! Both resolve to exactly one [`Outcome`].

mod async_call;
mod outcome;
mod sync_call;

pub use async_call::{async_call, AsyncCall, CallReport, CallState};
pub use outcome::Outcome;
pub use sync_call::sync_call;

use std::time::Duration;

use crate::services::greeting::{CallMode, GreetingQuery, Language, SubjectPayload};

/// Everything one call sends, minus the mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Request body
    pub subject: SubjectPayload,

    /// Requested language
    pub language: Language,

    /// Processing budget sent to the service
    pub timeout: Option<Duration>,
}

impl CallRequest {
    pub fn new(name: impl Into<String>, age: u8, language: Language, timeout: Option<Duration>) -> Self {
        Self {
            subject: SubjectPayload {
                name: name.into(),
                age,
            },
            language,
            timeout,
        }
    }

    /// Query parameters for a submit in the given mode
    pub fn query(&self, mode: CallMode) -> GreetingQuery {
        GreetingQuery {
            language: self.language,
            timeout: self.timeout,
            mode,
        }
    }
}
