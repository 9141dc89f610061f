/// Configuration service - loads config from environment variables
use crate::constants::{
    DEFAULT_DISPATCH_CONCURRENCY, DEFAULT_EHLO_NAME, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_SMTP_PORT, DEFAULT_SMTP_TIMEOUT_SECS,
};
use crate::error::ReportflowError;
use crate::models::{DispatchConfig, MailConfig, ReportflowConfig, ServiceEndpoints, SmtpConfig};
use crate::utils::validation::parse_address_list;
use std::str::FromStr;
use std::time::Duration;

/// Environment variable-based configuration provider
pub struct EnvConfigProvider {
    config: ReportflowConfig,
}

impl EnvConfigProvider {
    pub fn new() -> Result<Self, ReportflowError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReportflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String, ReportflowError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ReportflowError::Config(format!("Missing {} env var", key)))
        };
        let optional = |key: &str| lookup(key).unwrap_or_default().trim().to_string();

        let mut smtp = SmtpConfig::new(
            required("SMTP_HOST")?,
            parse_or(&lookup, "SMTP_PORT", DEFAULT_SMTP_PORT)?,
        )
        .with_credentials(optional("SMTP_USER"), lookup("SMTP_PASS").unwrap_or_default());
        smtp.timeout = Duration::from_secs(parse_or(
            &lookup,
            "SMTP_TIMEOUT_SECS",
            DEFAULT_SMTP_TIMEOUT_SECS,
        )?);
        let ehlo_name = optional("SMTP_EHLO_NAME");
        smtp.ehlo_name = if ehlo_name.is_empty() {
            DEFAULT_EHLO_NAME.to_string()
        } else {
            ehlo_name
        };

        let mail = MailConfig {
            from_address: required("MAIL_FROM")?,
            from_name: optional("MAIL_FROM_NAME"),
            bcc: parse_address_list(&optional("MAIL_BCC")),
            default_to: parse_address_list(&optional("MAIL_TO_DEFAULT")),
            error_notify_to: parse_address_list(&optional("ERROR_NOTIFY_TO")),
        };

        let mut services = ServiceEndpoints::new(
            required("URL_ONE_GENERATE_TOKEN")?,
            required("URL_ONE_GENERATE_SHOT_LINK")?,
            required("URL_LINK_FOLLOW_TOKEN")?,
        );
        services.http_timeout = Duration::from_secs(parse_or(
            &lookup,
            "HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?);

        let batch_timeout = match lookup("BATCH_TIMEOUT_SECS").filter(|v| !v.trim().is_empty()) {
            Some(raw) => Some(Duration::from_secs(parse_value("BATCH_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        let config = ReportflowConfig {
            smtp,
            mail,
            services,
            dispatch: DispatchConfig {
                concurrency: parse_or(&lookup, "DISPATCH_CONCURRENCY", DEFAULT_DISPATCH_CONCURRENCY)?,
                batch_timeout,
            },
        };

        // Validate configuration
        config
            .validate()
            .map_err(|e| ReportflowError::Config(format!("Invalid configuration: {}", e)))?;

        tracing::info!(
            smtp = %config.smtp.address(),
            concurrency = config.dispatch.concurrency,
            "Configuration validated successfully"
        );

        Ok(Self { config })
    }

    pub fn config(&self) -> &ReportflowConfig {
        &self.config
    }

    pub fn into_config(self) -> ReportflowConfig {
        self.config
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ReportflowError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T, ReportflowError> {
    raw.trim()
        .parse()
        .map_err(|_| ReportflowError::Config(format!("Invalid {} value: {}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_env() -> HashMap<String, String> {
        env(&[
            ("SMTP_HOST", "smtp.example.com"),
            ("SMTP_USER", "mailer"),
            ("SMTP_PASS", "secret"),
            ("MAIL_FROM", "no-reply@example.com"),
            ("MAIL_FROM_NAME", "Payments"),
            ("MAIL_BCC", "audit@example.com, ,ops@example.com"),
            ("URL_ONE_GENERATE_TOKEN", "https://token.example.com/generate"),
            ("URL_ONE_GENERATE_SHOT_LINK", "https://short.example.com/link"),
            ("URL_LINK_FOLLOW_TOKEN", "https://files.example.com/pdf/"),
        ])
    }

    #[test]
    fn test_env_config_defaults() {
        let vars = base_env();
        let provider = EnvConfigProvider::from_lookup(|k| vars.get(k).cloned()).unwrap();
        let config = provider.config();

        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.username, "mailer");
        assert_eq!(config.smtp.timeout, Duration::from_secs(30));
        assert_eq!(config.mail.bcc, vec!["audit@example.com", "ops@example.com"]);
        assert!(config.mail.default_to.is_empty());
        assert_eq!(config.dispatch.concurrency, 4);
        assert_eq!(config.dispatch.batch_timeout, None);
        assert_eq!(config.services.short_link_retry.max_attempts, 3);
    }

    #[test]
    fn test_env_config_overrides() {
        let mut vars = base_env();
        vars.insert("SMTP_PORT".to_string(), "2525".to_string());
        vars.insert("DISPATCH_CONCURRENCY".to_string(), "8".to_string());
        vars.insert("BATCH_TIMEOUT_SECS".to_string(), "120".to_string());

        let config = EnvConfigProvider::from_lookup(|k| vars.get(k).cloned())
            .unwrap()
            .into_config();

        assert_eq!(config.smtp.port, 2525);
        assert_eq!(config.dispatch.concurrency, 8);
        assert_eq!(config.dispatch.batch_timeout, Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_env_config_missing_vars() {
        let mut vars = base_env();
        vars.remove("SMTP_HOST");

        let result = EnvConfigProvider::from_lookup(|k| vars.get(k).cloned());
        assert!(matches!(result, Err(ReportflowError::Config(msg)) if msg.contains("SMTP_HOST")));
    }

    #[test]
    fn test_env_config_rejects_bad_numbers() {
        let mut vars = base_env();
        vars.insert("SMTP_PORT".to_string(), "smtp".to_string());
        assert!(EnvConfigProvider::from_lookup(|k| vars.get(k).cloned()).is_err());

        let mut vars = base_env();
        vars.insert("DISPATCH_CONCURRENCY".to_string(), "0".to_string());
        assert!(EnvConfigProvider::from_lookup(|k| vars.get(k).cloned()).is_err());
    }
}
