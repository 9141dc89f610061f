/// Token service client - exchanges a transfer id for a download token
use crate::error::TokenError;
use crate::models::Token;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Issues a token for one transfer. Called once per item, never retried.
    async fn fetch_token(&self, transfer_id: &str) -> Result<Token, TokenError>;
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    #[serde(rename = "transferId")]
    transfer_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

pub struct HttpTokenClient {
    client: reqwest::Client,
    url: String,
}

impl HttpTokenClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for HttpTokenClient {
    async fn fetch_token(&self, transfer_id: &str) -> Result<Token, TokenError> {
        let response = self
            .client
            .post(&self.url)
            .json(&TokenRequest { transfer_id })
            .send()
            .await
            .map_err(|e| {
                warn!(transfer_id = %transfer_id, error = %e, "Token request failed");
                TokenError::Transport(e.to_string())
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            warn!(
                transfer_id = %transfer_id,
                status = status.as_u16(),
                "Token service rejected request"
            );
            return Err(TokenError::Status(status.as_u16()));
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!(transfer_id = %transfer_id, error = %e, "Failed to decode token response");
            TokenError::Decode(e.to_string())
        })?;

        if body.token.trim().is_empty() {
            warn!(transfer_id = %transfer_id, "Token service returned an empty token");
            return Err(TokenError::Empty);
        }

        debug!(transfer_id = %transfer_id, "Token issued");

        Ok(Token {
            transfer_id: transfer_id.to_string(),
            token: body.token,
        })
    }
}
