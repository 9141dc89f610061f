/// Reportflow Core - per-item report dispatch pipeline
///
/// Turns a batch of transfer ids into delivered report emails: each item
/// obtains a token, resolves a short download link, is rendered into a fixed
/// HTML template and is sent over SMTP. Items fail
/// independently; the pipeline always returns one result per input item.
pub mod constants;
pub mod email;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod smtp;
pub mod utils;

// Re-export commonly used types
pub use error::{ReportflowError, SmtpError, TokenError};
pub use pipeline::DispatchPipeline;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
