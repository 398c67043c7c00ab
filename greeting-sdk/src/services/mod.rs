//! Service-specific client implementations
//!
//! This module contains the client for the greeting service.

pub mod greeting;
mod common;

pub use common::UserAgent;
