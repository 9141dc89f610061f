/// External service clients and configuration loading
pub mod config;
pub mod shortlink;
pub mod token;

// Re-export service traits
pub use config::EnvConfigProvider;
pub use shortlink::{HttpLinkResolver, LinkShortener, build_full_url};
pub use token::{HttpTokenClient, TokenProvider};

use crate::error::ReportflowError;
use std::time::Duration;

/// Shared HTTP client for the token and short-link services
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, ReportflowError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("reportflow/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ReportflowError::from)
}
