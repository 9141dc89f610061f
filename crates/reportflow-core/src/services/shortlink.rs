/// Short-link service client with bounded retries
use crate::constants::TOKEN_PLACEHOLDER;
use crate::utils::logging::redact_link;
use crate::utils::retry::{Retriable, RetryPolicy, retry_with_backoff};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkShortener: Send + Sync {
    /// Returns the short form of `full_url`, or an empty string once every
    /// attempt has failed. An empty result is a degraded outcome, not an error.
    async fn resolve_short_link(&self, full_url: &str) -> String;
}

/// Builds the long download link for a token
///
/// The token is URL-escaped and substituted for `{token}` when the base
/// contains that marker, otherwise appended.
pub fn build_full_url(base: &str, token: &str) -> String {
    let escaped: String = url::form_urlencoded::byte_serialize(token.as_bytes()).collect();
    if base.contains(TOKEN_PLACEHOLDER) {
        base.replace(TOKEN_PLACEHOLDER, &escaped)
    } else {
        format!("{}{}", base, escaped)
    }
}

#[derive(Debug, Serialize)]
struct ShortLinkRequest<'a> {
    link: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortLinkResponse {
    data: ShortLinkData,
}

#[derive(Debug, Deserialize)]
struct ShortLinkData {
    #[serde(rename = "short-link", default)]
    short_link: String,
}

/// Why one shortening attempt failed
#[derive(Debug)]
enum AttemptError {
    Transport(String),
    Status(u16),
    Decode(String),
    EmptyLink,
}

impl fmt::Display for AttemptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "transport error: {}", e),
            Self::Status(code) => write!(f, "HTTP status {}", code),
            Self::Decode(e) => write!(f, "undecodable body: {}", e),
            Self::EmptyLink => write!(f, "empty short-link field"),
        }
    }
}

impl Retriable for AttemptError {
    fn is_retriable(&self) -> bool {
        true
    }
}

pub struct HttpLinkResolver {
    client: reqwest::Client,
    url: String,
    policy: RetryPolicy,
}

impl HttpLinkResolver {
    pub fn new(client: reqwest::Client, url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            client,
            url: url.into(),
            policy,
        }
    }

    async fn attempt(&self, full_url: &str) -> Result<String, AttemptError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ShortLinkRequest { link: full_url })
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let body: ShortLinkResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Decode(e.to_string()))?;

        let short_link = body.data.short_link.trim().to_string();
        if short_link.is_empty() {
            return Err(AttemptError::EmptyLink);
        }

        Ok(short_link)
    }
}

#[async_trait]
impl LinkShortener for HttpLinkResolver {
    async fn resolve_short_link(&self, full_url: &str) -> String {
        match retry_with_backoff(|_| self.attempt(full_url), &self.policy, "short_link").await {
            Ok(short_link) => {
                debug!(link = %redact_link(full_url), short_link = %short_link, "Short link resolved");
                short_link
            }
            Err(failure) => {
                warn!(
                    link = %redact_link(full_url),
                    attempts = failure.attempts,
                    error = %failure.error,
                    "Short link unavailable, continuing without it"
                );
                String::new()
            }
        }
    }
}
