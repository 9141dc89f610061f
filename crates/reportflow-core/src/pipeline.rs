/// Dispatch pipeline - runs every batch item through token, link, compose and send
use crate::email::ReportComposer;
use crate::error::{ReportflowError, TokenError};
use crate::models::{
    AccountFields, BatchItem, DispatchConfig, MailConfig, MailSendResult, ReportKind,
    ReportflowConfig, ResolvedLink, SendStatus, Token,
};
use crate::services::{
    HttpLinkResolver, HttpTokenClient, LinkShortener, TokenProvider, build_full_url, http_client,
};
use crate::smtp::{MailTransport, SmtpMailTransport};
use crate::utils::logging::{redact_link, redact_recipients};
use crate::utils::validation::parse_address_list;
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{error, info, warn};

/// Where an item's token comes from
#[derive(Debug, Clone)]
enum TokenSource {
    Fetch,
    Provided(String),
}

/// Internal unit of work, built from either entry point
#[derive(Debug, Clone)]
struct WorkItem {
    transfer_id: String,
    account: AccountFields,
    mail_to: Option<String>,
    token: TokenSource,
}

impl From<BatchItem> for WorkItem {
    fn from(item: BatchItem) -> Self {
        Self {
            account: item.account_fields(),
            transfer_id: item.transfer_id,
            mail_to: item.mail_to,
            token: TokenSource::Fetch,
        }
    }
}

impl From<Token> for WorkItem {
    fn from(token: Token) -> Self {
        Self {
            account: AccountFields::placeholder(&token.transfer_id),
            transfer_id: token.transfer_id,
            mail_to: None,
            token: TokenSource::Provided(token.token),
        }
    }
}

pub struct DispatchPipeline {
    tokens: Arc<dyn TokenProvider>,
    links: Arc<dyn LinkShortener>,
    transport: Arc<dyn MailTransport>,
    composer: ReportComposer,
    mail: MailConfig,
    long_link_base: String,
    dispatch: DispatchConfig,
}

impl DispatchPipeline {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        links: Arc<dyn LinkShortener>,
        transport: Arc<dyn MailTransport>,
        mail: MailConfig,
        long_link_base: impl Into<String>,
        dispatch: DispatchConfig,
    ) -> Result<Self, ReportflowError> {
        Ok(Self {
            tokens,
            links,
            transport,
            composer: ReportComposer::new(&mail)?,
            mail,
            long_link_base: long_link_base.into(),
            dispatch,
        })
    }

    /// Wires the HTTP service clients and the SMTP transport from configuration
    pub fn from_config(config: &ReportflowConfig) -> Result<Self, ReportflowError> {
        config.validate().map_err(ReportflowError::Config)?;

        let client = http_client(config.services.http_timeout)?;
        let tokens = Arc::new(HttpTokenClient::new(
            client.clone(),
            config.services.token_url.clone(),
        ));
        let links = Arc::new(HttpLinkResolver::new(
            client,
            config.services.short_link_url.clone(),
            config.services.short_link_retry.clone(),
        ));
        let transport = Arc::new(SmtpMailTransport::new(
            config.smtp.clone(),
            config.mail.from_address.clone(),
        )?);

        Self::new(
            tokens,
            links,
            transport,
            config.mail.clone(),
            config.services.long_link_base.clone(),
            config.dispatch.clone(),
        )
    }

    /// Processes every item and returns one result per item, in input order
    pub async fn run(&self, kind: ReportKind, batch: Vec<BatchItem>) -> Vec<MailSendResult> {
        let items: Vec<WorkItem> = batch.into_iter().map(WorkItem::from).collect();
        self.run_items(kind, items).await
    }

    /// Same as [`run`](Self::run), starting from already-issued tokens
    pub async fn run_with_tokens(
        &self,
        kind: ReportKind,
        tokens: Vec<Token>,
    ) -> Vec<MailSendResult> {
        let items: Vec<WorkItem> = tokens.into_iter().map(WorkItem::from).collect();
        self.run_items(kind, items).await
    }

    async fn run_items(&self, kind: ReportKind, items: Vec<WorkItem>) -> Vec<MailSendResult> {
        // One date for the whole batch
        let report_date = chrono::Local::now().date_naive();
        let deadline = self.dispatch.batch_timeout.map(|limit| Instant::now() + limit);

        info!(
            kind = ?kind,
            items = items.len(),
            concurrency = self.dispatch.concurrency,
            "Dispatching batch"
        );

        // Built eagerly: a stream closure over `&WorkItem` makes the batch future !Send
        let pending: Vec<_> = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.dispatch_indexed(index, item, kind, report_date, deadline))
            .collect();
        let mut indexed: Vec<(usize, MailSendResult)> = stream::iter(pending)
            .buffer_unordered(self.dispatch.concurrency.max(1))
            .collect()
            .await;

        indexed.sort_by_key(|(index, _)| *index);
        let results: Vec<MailSendResult> = indexed.into_iter().map(|(_, result)| result).collect();

        let failed = results.iter().filter(|r| !r.is_success()).count();
        info!(
            total = results.len(),
            success = results.len() - failed,
            fail = failed,
            "Batch finished"
        );

        if failed > 0 {
            let notice = self.notify_failures(&items, &results, report_date);
            match deadline {
                Some(deadline) if Instant::now() >= deadline => {
                    warn!(fail = failed, "Batch deadline passed, failure notice skipped");
                }
                Some(deadline) => {
                    if tokio::time::timeout_at(deadline, notice).await.is_err() {
                        warn!(fail = failed, "Batch deadline passed while sending failure notice");
                    }
                }
                None => notice.await,
            }
        }

        results
    }

    /// Runs one item under the batch deadline, tagged with its input position
    async fn dispatch_indexed(
        &self,
        index: usize,
        item: &WorkItem,
        kind: ReportKind,
        report_date: NaiveDate,
        deadline: Option<Instant>,
    ) -> (usize, MailSendResult) {
        let Some(deadline) = deadline else {
            return (index, self.process_item(kind, item, report_date).await);
        };

        if Instant::now() >= deadline {
            warn!(transfer_id = %item.transfer_id, "Batch deadline passed, item not started");
            let cause = ReportflowError::Cancelled("batch deadline exceeded".to_string());
            return (index, MailSendResult::failed(&item.transfer_id, cause));
        }

        let processing = self.process_item(kind, item, report_date);
        match tokio::time::timeout_at(deadline, processing).await {
            Ok(result) => (index, result),
            Err(_) => {
                warn!(transfer_id = %item.transfer_id, "Batch deadline passed, item cancelled");
                let cause = ReportflowError::Cancelled(
                    "batch deadline exceeded while in flight".to_string(),
                );
                (index, MailSendResult::failed(&item.transfer_id, cause))
            }
        }
    }

    #[tracing::instrument(
        name = "dispatch_item",
        skip(self, item, report_date),
        fields(transfer_id = %item.transfer_id)
    )]
    async fn process_item(
        &self,
        kind: ReportKind,
        item: &WorkItem,
        report_date: NaiveDate,
    ) -> MailSendResult {
        let token = match &item.token {
            TokenSource::Provided(token) if token.trim().is_empty() => {
                warn!("Provided token is empty");
                let cause = ReportflowError::Token(TokenError::Empty);
                return MailSendResult::failed(&item.transfer_id, cause);
            }
            TokenSource::Provided(token) => token.clone(),
            TokenSource::Fetch => match self.tokens.fetch_token(&item.transfer_id).await {
                Ok(token) => token.token,
                Err(e) => {
                    warn!(error = %e, "No token for item");
                    return MailSendResult::failed(&item.transfer_id, ReportflowError::from(e));
                }
            },
        };

        let full_url = build_full_url(&self.long_link_base, &token);
        let short_url = self.links.resolve_short_link(&full_url).await;
        let link = ResolvedLink {
            transfer_id: item.transfer_id.clone(),
            token,
            full_url,
            short_url,
        };

        let recipients = item
            .mail_to
            .as_deref()
            .filter(|raw| !parse_address_list(raw).is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.mail.default_to.join(","));

        let payload = match self
            .composer
            .compose(kind, &item.account, &link, &recipients, report_date)
        {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Report could not be rendered");
                return MailSendResult::failed(&item.transfer_id, e);
            }
        };

        let email = payload.to_header();
        let failure = |cause: ReportflowError| MailSendResult {
            transfer_id: item.transfer_id.clone(),
            email: email.clone(),
            short_link: payload.short_link.clone(),
            full_link: payload.full_link.clone(),
            status: SendStatus::Fail,
            error: Some(cause.to_string()),
        };

        if payload.to.is_empty() {
            warn!("No recipients for item");
            return failure(ReportflowError::Validation(
                "no recipients for item".to_string(),
            ));
        }

        match self.transport.send(&payload).await {
            Ok(()) => {
                info!(
                    recipients = %redact_recipients(&payload.to),
                    link = %redact_link(&payload.full_link),
                    shortened = link.is_shortened(),
                    "Report sent"
                );
                MailSendResult::success(
                    &item.transfer_id,
                    email,
                    payload.short_link,
                    payload.full_link,
                )
            }
            Err(e) => {
                error!(error = %e, smtp_code = ?e.code(), "Report delivery failed");
                failure(ReportflowError::from(e))
            }
        }
    }

    /// Mails the list of failed accounts; never alters item results
    async fn notify_failures(
        &self,
        items: &[WorkItem],
        results: &[MailSendResult],
        report_date: NaiveDate,
    ) {
        if self.mail.error_notify_to.is_empty() {
            return;
        }

        let accounts: Vec<String> = items
            .iter()
            .zip(results)
            .filter(|(_, result)| !result.is_success())
            .map(|(item, _)| item.account.account_name.clone())
            .collect();

        let notice = match self.composer.compose_failure_notice(
            &accounts,
            &self.mail.error_notify_to,
            report_date,
        ) {
            Ok(notice) => notice,
            Err(e) => {
                error!(error = %e, "Failure notice could not be rendered");
                return;
            }
        };

        match self.transport.send(&notice).await {
            Ok(()) => info!(accounts = accounts.len(), "Failure notice sent"),
            Err(e) => error!(error = %e, "Failure notice could not be sent"),
        }
    }
}
