/// Configuration models
use crate::constants::{
    DEFAULT_DISPATCH_CONCURRENCY, DEFAULT_EHLO_NAME, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT_SECS, SHORT_LINK_BASE_DELAY_MS,
    SHORT_LINK_MAX_ATTEMPTS, SMTP_BASE_DELAY_MS, SMTP_MAX_ATTEMPTS,
};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{is_valid_email, validate_service_url};
use std::fmt;
use std::time::Duration;

/// System configuration
#[derive(Debug, Clone)]
pub struct ReportflowConfig {
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub services: ServiceEndpoints,
    pub dispatch: DispatchConfig,
}

impl ReportflowConfig {
    /// Validates configuration is valid
    pub fn validate(&self) -> Result<(), String> {
        if self.smtp.host.trim().is_empty() {
            return Err("SMTP host not configured".to_string());
        }

        if self.smtp.port == 0 {
            return Err("SMTP port must be > 0".to_string());
        }

        if !is_valid_email(&self.mail.from_address) {
            return Err(format!(
                "Invalid sender address: {}",
                self.mail.from_address
            ));
        }

        for addr in self
            .mail
            .bcc
            .iter()
            .chain(self.mail.default_to.iter())
            .chain(self.mail.error_notify_to.iter())
        {
            if !is_valid_email(addr) {
                return Err(format!("Invalid configured recipient: {}", addr));
            }
        }

        validate_service_url("token service", &self.services.token_url)
            .map_err(|e| e.to_string())?;
        validate_service_url("short-link service", &self.services.short_link_url)
            .map_err(|e| e.to_string())?;
        validate_service_url("long link base", &self.services.long_link_base)
            .map_err(|e| e.to_string())?;

        if self.dispatch.concurrency == 0 {
            return Err("Dispatch concurrency must be > 0".to_string());
        }

        Ok(())
    }
}

/// SMTP session settings
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    /// AUTH PLAIN is skipped when empty
    pub username: String,
    pub password: String,
    /// Name announced in EHLO
    pub ehlo_name: String,
    /// Bound on dialing and on each protocol command
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl SmtpConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: String::new(),
            password: String::new(),
            ehlo_name: DEFAULT_EHLO_NAME.to_string(),
            timeout: Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS),
            retry: RetryPolicy::linear(
                SMTP_MAX_ATTEMPTS,
                Duration::from_millis(SMTP_BASE_DELAY_MS),
            ),
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_SMTP_PORT)
    }
}

// Keeps the password out of logs
impl fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("ehlo_name", &self.ehlo_name)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Sender identity and fixed recipient lists
#[derive(Debug, Clone, Default)]
pub struct MailConfig {
    pub from_address: String,
    pub from_name: String,
    /// Blind copy added to every report
    pub bcc: Vec<String>,
    /// Used when a batch item carries no recipients of its own
    pub default_to: Vec<String>,
    /// Receives the failure notification after a partially failed batch
    pub error_notify_to: Vec<String>,
}

impl MailConfig {
    /// `From:` header value
    pub fn from_header(&self) -> String {
        if self.from_name.trim().is_empty() {
            self.from_address.clone()
        } else {
            format!("{} <{}>", self.from_name, self.from_address)
        }
    }
}

/// External HTTP services consumed by the pipeline
#[derive(Debug, Clone)]
pub struct ServiceEndpoints {
    pub token_url: String,
    pub short_link_url: String,
    /// Prefix of the download link; the token is appended (or substituted for `{token}`)
    pub long_link_base: String,
    pub http_timeout: Duration,
    pub short_link_retry: RetryPolicy,
}

impl ServiceEndpoints {
    pub fn new(
        token_url: impl Into<String>,
        short_link_url: impl Into<String>,
        long_link_base: impl Into<String>,
    ) -> Self {
        Self {
            token_url: token_url.into(),
            short_link_url: short_link_url.into(),
            long_link_base: long_link_base.into(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            short_link_retry: RetryPolicy::linear(
                SHORT_LINK_MAX_ATTEMPTS,
                Duration::from_millis(SHORT_LINK_BASE_DELAY_MS),
            ),
        }
    }
}

/// Batch execution settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Items processed at the same time
    pub concurrency: usize,
    /// Upper bound for a whole batch; `None` waits for every item
    pub batch_timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_DISPATCH_CONCURRENCY,
            batch_timeout: None,
        }
    }
}
