//! Unit tests for the Greeting SDK
//!
//! This module contains tests for the call operations, the dispatcher and
//! the supporting error and configuration layers.

pub mod dispatch_mock_tests;
