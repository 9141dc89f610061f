/// Error types for the report dispatch pipeline
use crate::utils::retry::Retriable;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportflowError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),
}

/// Failure to obtain a token for a transfer id. Never retried.
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token service unreachable: {0}")]
    Transport(String),

    #[error("token service returned HTTP {0}")]
    Status(u16),

    #[error("token response could not be decoded: {0}")]
    Decode(String),

    #[error("token service returned an empty token")]
    Empty,
}

#[derive(Error, Debug)]
pub enum SmtpError {
    #[error("SMTP {stage} rejected: {code} {message}")]
    Rejected {
        stage: &'static str,
        code: u16,
        message: String,
    },

    #[error("SMTP {stage} failed: {source}")]
    Transport {
        stage: &'static str,
        #[source]
        source: lettre::transport::smtp::Error,
    },

    #[error("TLS setup failed: {0}")]
    Tls(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("smtp failed after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<SmtpError>,
    },
}

impl SmtpError {
    /// Classifies a lettre failure at `stage`. Negative server replies keep
    /// their reply code; everything else is a transport failure.
    pub fn at_stage(stage: &'static str, err: lettre::transport::smtp::Error) -> Self {
        match err.status() {
            Some(code) => Self::Rejected {
                stage,
                code: code.to_string().parse().unwrap_or_default(),
                message: err.to_string(),
            },
            None => Self::Transport { stage, source: err },
        }
    }

    /// Reply code of a rejected command, if any
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Rejected { code, .. } => Some(*code),
            Self::Exhausted { last, .. } => last.code(),
            _ => None,
        }
    }
}

impl Retriable for SmtpError {
    /// Permanent envelope rejections are final: the transaction never reached
    /// DATA, and another attempt would get the same answer.
    fn is_retriable(&self) -> bool {
        match self {
            Self::Rejected { stage, code, .. } => {
                !(*code >= 500 && matches!(*stage, "MAIL FROM" | "RCPT TO"))
            }
            Self::Transport { .. } => true,
            Self::Tls(_) | Self::InvalidAddress(_) | Self::Exhausted { .. } => false,
        }
    }
}

impl From<serde_json::Error> for ReportflowError {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<std::env::VarError> for ReportflowError {
    fn from(err: std::env::VarError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<tera::Error> for ReportflowError {
    fn from(err: tera::Error) -> Self {
        Self::Template(err.to_string())
    }
}

impl From<reqwest::Error> for ReportflowError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}
