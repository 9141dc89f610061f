/// Logging setup and PII redaction for report delivery logs
use crate::constants::DEFAULT_LOG_FILTER;
use regex::Regex;
use std::sync::LazyLock;

// Email redaction regex
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap());

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Parses a `LOG_FORMAT` value; anything but `json` falls back to pretty
    pub fn parse(value: &str) -> Self {
        match value {
            "json" => Self::Json,
            _ => Self::Pretty,
        }
    }

    pub fn from_env() -> Self {
        std::env::var("LOG_FORMAT")
            .map(|v| Self::parse(&v))
            .unwrap_or_default()
    }
}

/// Installs the global tracing subscriber
///
/// `RUST_LOG` controls the filter; when unset, `info,reportflow=debug` is used.
pub fn init_tracing(format: LogFormat) {
    use tracing_subscriber::{Layer as _, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    let fmt_layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_target(true)
            .with_current_span(true)
            .with_span_list(false)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Redacts email addresses from text, preserving domain for debugging
///
/// # Examples
/// ```
/// use reportflow_core::utils::logging::redact_email;
///
/// assert_eq!(redact_email("user@example.com"), "***@example.com");
/// assert_eq!(redact_email("a@x.com,b@y.com"), "***@x.com,***@y.com");
/// ```
pub fn redact_email(text: &str) -> String {
    EMAIL_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            let email = &caps[0];
            if let Some(at_pos) = email.find('@') {
                format!("***{}", &email[at_pos..])
            } else {
                "***@***".to_string()
            }
        })
        .to_string()
}

/// Redacts a list of recipients into one log-friendly string
pub fn redact_recipients(recipients: &[String]) -> String {
    redact_email(&recipients.join(","))
}

/// Hides the token part of a download link, keeping the host for debugging
pub fn redact_link(link: &str) -> String {
    match url::Url::parse(link) {
        Ok(url) => format!(
            "{}://{}/...",
            url.scheme(),
            url.host_str().unwrap_or("unknown")
        ),
        Err(_) => format!("[{} chars]", link.len()),
    }
}
