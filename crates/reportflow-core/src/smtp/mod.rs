/// SMTP delivery over lettre connections
pub mod transport;

pub use transport::{MailTransport, SmtpMailTransport};
