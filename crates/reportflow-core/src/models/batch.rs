/// Batch input and per-item result models
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Notification kind; selects subject and template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ReportKind {
    #[default]
    #[serde(alias = "transfer")]
    Transfer,
    #[serde(alias = "income")]
    Income,
}

/// One transfer to report on, as supplied by the caller
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItem {
    pub transfer_id: String,
    pub recipient_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_count: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn_amount: Option<String>,
    /// Comma-separated primary recipients; the configured default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail_to: Option<String>,
}

impl BatchItem {
    pub fn new(
        transfer_id: impl Into<String>,
        recipient_id: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            transfer_id: transfer_id.into(),
            recipient_id: recipient_id.into(),
            start_date,
            end_date,
            account_name: None,
            txn_count: None,
            txn_amount: None,
            mail_to: None,
        }
    }

    pub fn with_mail_to(mut self, mail_to: impl Into<String>) -> Self {
        self.mail_to = Some(mail_to.into());
        self
    }

    pub fn with_account(
        mut self,
        name: impl Into<String>,
        txn_count: impl Into<String>,
        txn_amount: impl Into<String>,
    ) -> Self {
        self.account_name = Some(name.into());
        self.txn_count = Some(txn_count.into());
        self.txn_amount = Some(txn_amount.into());
        self
    }

    /// Account fields rendered into the report body
    pub fn account_fields(&self) -> AccountFields {
        AccountFields {
            account_name: self
                .account_name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| self.recipient_id.clone()),
            txn_count: self.txn_count.clone().unwrap_or_else(|| "0".to_string()),
            txn_amount: self.txn_amount.clone().unwrap_or_else(|| "0".to_string()),
            period_start: Some(self.start_date),
            period_end: Some(self.end_date),
        }
    }
}

/// Values interpolated into a report template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountFields {
    pub account_name: String,
    pub txn_count: String,
    pub txn_amount: String,
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
}

impl AccountFields {
    /// Fields for an item known only by its transfer id
    pub fn placeholder(transfer_id: &str) -> Self {
        Self {
            account_name: transfer_id.to_string(),
            txn_count: "0".to_string(),
            txn_amount: "0".to_string(),
            period_start: None,
            period_end: None,
        }
    }
}

/// Opaque access token issued for one transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub transfer_id: String,
    pub token: String,
}

/// Download link for one transfer; `short_url` is empty when shortening failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLink {
    pub transfer_id: String,
    pub token: String,
    pub full_url: String,
    pub short_url: String,
}

impl ResolvedLink {
    pub fn is_shortened(&self) -> bool {
        !self.short_url.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SendStatus {
    Success,
    Fail,
}

/// Outcome of one batch item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailSendResult {
    pub transfer_id: String,
    #[serde(rename = "receiver_email")]
    pub email: String,
    pub short_link: String,
    pub full_link: String,
    pub status: SendStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MailSendResult {
    pub fn success(
        transfer_id: impl Into<String>,
        email: impl Into<String>,
        short_link: impl Into<String>,
        full_link: impl Into<String>,
    ) -> Self {
        Self {
            transfer_id: transfer_id.into(),
            email: email.into(),
            short_link: short_link.into(),
            full_link: full_link.into(),
            status: SendStatus::Success,
            error: None,
        }
    }

    /// A failure recorded before any link or recipient was known
    pub fn failed(transfer_id: impl Into<String>, error: impl ToString) -> Self {
        Self {
            transfer_id: transfer_id.into(),
            email: String::new(),
            short_link: String::new(),
            full_link: String::new(),
            status: SendStatus::Fail,
            error: Some(error.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SendStatus::Success
    }
}

/// Counts derived from a result sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub fail: usize,
}

impl BatchSummary {
    pub fn from_results(results: &[MailSendResult]) -> Self {
        let success = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            success,
            fail: results.len() - success,
        }
    }
}
