/// SMTP mail transport with bounded retries
use crate::email::message::{build_message, generate_message_id};
use crate::error::SmtpError;
use crate::models::{ReportPayload, SmtpConfig};
use crate::utils::logging::redact_recipients;
use crate::utils::retry::retry_with_backoff;
use async_trait::async_trait;
use lettre::Address;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{AsyncSmtpConnection, TlsParameters};
use lettre::transport::smtp::commands::{Data, Mail, Rcpt};
use lettre::transport::smtp::extension::{ClientId, Extension, MailBodyParameter, MailParameter};
use tracing::{debug, info, warn};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Delivers `payload` to its To and Bcc recipients
    async fn send(&self, payload: &ReportPayload) -> Result<(), SmtpError>;
}

/// Delivers messages over a fresh SMTP connection per attempt
pub struct SmtpMailTransport {
    config: SmtpConfig,
    from_address: Address,
    tls: TlsParameters,
}

impl SmtpMailTransport {
    pub fn new(config: SmtpConfig, from_address: impl AsRef<str>) -> Result<Self, SmtpError> {
        let from_address = parse_address(from_address.as_ref())?;
        let tls = TlsParameters::new(config.host.clone())
            .map_err(|e| SmtpError::Tls(e.to_string()))?;

        Ok(Self {
            config,
            from_address,
            tls,
        })
    }

    /// Replaces the STARTTLS parameters, e.g. to trust a private CA
    pub fn with_tls_parameters(mut self, tls: TlsParameters) -> Self {
        self.tls = tls;
        self
    }

    /// One full session: connect, negotiate, deliver, quit
    async fn attempt(
        &self,
        envelope: &[Address],
        message: &[u8],
        attempt: u32,
    ) -> Result<(), SmtpError> {
        let hello = ClientId::Domain(self.config.ehlo_name.clone());
        debug!(addr = %self.config.address(), attempt = attempt, "Connecting to SMTP server");

        let mut conn = AsyncSmtpConnection::connect_tokio1(
            (self.config.host.as_str(), self.config.port),
            Some(self.config.timeout),
            &hello,
            None,
            None,
        )
        .await
        .map_err(|e| SmtpError::at_stage("connect", e))?;

        match self.transaction(&mut conn, &hello, envelope, message).await {
            Ok(()) => {
                // The message is accepted at this point; a failed QUIT must not trigger a resend
                if let Err(e) = conn.quit().await {
                    warn!(error = %e, "QUIT failed after message was accepted");
                }
                Ok(())
            }
            Err(e) => {
                conn.abort().await;
                Err(e)
            }
        }
    }

    async fn transaction(
        &self,
        conn: &mut AsyncSmtpConnection,
        hello: &ClientId,
        envelope: &[Address],
        message: &[u8],
    ) -> Result<(), SmtpError> {
        if conn.can_starttls() {
            conn.starttls(self.tls.clone(), hello)
                .await
                .map_err(|e| SmtpError::at_stage("STARTTLS", e))?;
        } else {
            debug!("Server does not offer STARTTLS, continuing in plaintext");
        }

        if !self.config.username.is_empty() {
            let credentials =
                Credentials::new(self.config.username.clone(), self.config.password.clone());
            conn.auth(&[Mechanism::Plain], &credentials)
                .await
                .map_err(|e| SmtpError::at_stage("AUTH", e))?;
        }

        let mut params = Vec::new();
        if conn.server_info().supports_feature(Extension::EightBitMime) {
            params.push(MailParameter::Body(MailBodyParameter::EightBitMime));
        }
        conn.command(Mail::new(Some(self.from_address.clone()), params))
            .await
            .map_err(|e| SmtpError::at_stage("MAIL FROM", e))?;

        for recipient in envelope {
            conn.command(Rcpt::new(recipient.clone(), Vec::new()))
                .await
                .map_err(|e| SmtpError::at_stage("RCPT TO", e))?;
        }

        conn.command(Data)
            .await
            .map_err(|e| SmtpError::at_stage("DATA", e))?;
        // lettre dot-stuffs and terminates the data phase
        conn.message(message)
            .await
            .map_err(|e| SmtpError::at_stage("DATA", e))?;
        Ok(())
    }
}

fn parse_address(raw: &str) -> Result<Address, SmtpError> {
    raw.trim()
        .parse()
        .map_err(|_| SmtpError::InvalidAddress(raw.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailTransport {
    async fn send(&self, payload: &ReportPayload) -> Result<(), SmtpError> {
        let recipients = payload.envelope_recipients();
        if recipients.is_empty() {
            return Err(SmtpError::InvalidAddress("no recipients".to_string()));
        }
        let envelope = recipients
            .iter()
            .map(|addr| parse_address(addr))
            .collect::<Result<Vec<_>, _>>()?;

        // Built once so every attempt sends identical bytes
        let return_path = self.from_address.to_string();
        let message_id = generate_message_id(&return_path);
        let message = build_message(
            payload,
            &return_path,
            chrono::Local::now().fixed_offset(),
            &message_id,
        );

        let result = retry_with_backoff(
            |attempt| self.attempt(&envelope, &message, attempt),
            &self.config.retry,
            "smtp_send",
        )
        .await;

        match result {
            Ok(()) => {
                info!(
                    transfer_id = %payload.transfer_id,
                    recipients = %redact_recipients(&recipients),
                    message_id = %message_id,
                    "Report email delivered"
                );
                Ok(())
            }
            Err(failure) if failure.permanent => Err(failure.error),
            Err(failure) => Err(SmtpError::Exhausted {
                attempts: failure.attempts,
                last: Box::new(failure.error),
            }),
        }
    }
}
