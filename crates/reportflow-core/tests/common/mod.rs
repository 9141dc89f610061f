//! Common test utilities and helpers for integration tests
#![allow(dead_code)]

pub mod mock_smtp;
pub mod test_data;

use reportflow_core::utils::retry::RetryPolicy;
use std::time::Duration;

/// Retry policy with the production attempt count and millisecond pauses
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::linear(3, Duration::from_millis(10))
}
